//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain/service errors to a one-line string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    let message = e.to_string();
    if let ApiError::Pipeline(_) = e {
        if let Some(first) = message.lines().next() {
            return first.to_string();
        }
    }
    message
}

/// Process exit code for a failed command
pub fn exit_code(e: &ApiError) -> i32 {
    match e {
        ApiError::InvalidInput(_) => 2,
        ApiError::ConfigError(_) | ApiError::ProviderNotConfigured(_) => 3,
        ApiError::Pipeline(err) if err.is_precondition() => 2,
        ApiError::Pipeline(crate::error::PipelineError::Cancelled { .. }) => 130,
        ApiError::Pipeline(_) | ApiError::Io(_) => 1,
    }
}
