//! Integration tests for the reflective translation pipeline

mod cli_translate;
mod config_integration;
mod pipeline_executor;
mod test_utils;
