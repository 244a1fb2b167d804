//! Property-based tests for prompt rendering
