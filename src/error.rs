//! Error types for the reflective translation pipeline.

use crate::pipeline::{ContextField, Stage};
use thiserror::Error;

/// Failure category of a completion service call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    Network,
    Timeout,
    Auth,
    RateLimit,
    ModelNotFound,
    MalformedResponse,
    Request,
}

impl std::fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ServiceErrorKind::Network => "network",
            ServiceErrorKind::Timeout => "timeout",
            ServiceErrorKind::Auth => "auth",
            ServiceErrorKind::RateLimit => "rate-limit",
            ServiceErrorKind::ModelNotFound => "model-not-found",
            ServiceErrorKind::MalformedResponse => "malformed-response",
            ServiceErrorKind::Request => "request",
        };
        f.write_str(label)
    }
}

/// Errors raised by the completion gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Service error ({kind}): {message}")]
    Service {
        kind: ServiceErrorKind,
        message: String,
    },

    #[error("Model refused to respond: {0}")]
    ModelRefusal(String),
}

impl GatewayError {
    pub fn service(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        GatewayError::Service {
            kind,
            message: message.into(),
        }
    }

    /// Service error kind, `None` for refusals
    pub fn service_kind(&self) -> Option<ServiceErrorKind> {
        match self {
            GatewayError::Service { kind, .. } => Some(*kind),
            GatewayError::ModelRefusal(_) => None,
        }
    }
}

/// Context precondition that a stage found broken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionViolation {
    /// A required field is unset (or blank for caller inputs)
    Missing(ContextField),
    /// A write-once field was written a second time
    AlreadySet(ContextField),
}

impl std::fmt::Display for PreconditionViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreconditionViolation::Missing(field) => write!(f, "missing required field {}", field),
            PreconditionViolation::AlreadySet(field) => write!(f, "field {} is already set", field),
        }
    }
}

/// Errors that abort a pipeline run. Every variant names the stage it happened in.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: GatewayError,
    },

    #[error("{stage} stage precondition violated: {violation}")]
    Precondition {
        stage: Stage,
        violation: PreconditionViolation,
    },

    #[error("Pipeline cancelled at {stage} stage")]
    Cancelled { stage: Stage },
}

impl PipelineError {
    /// Stage the run stopped at
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Stage { stage, .. }
            | PipelineError::Precondition { stage, .. }
            | PipelineError::Cancelled { stage } => *stage,
        }
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, PipelineError::Precondition { .. })
    }
}

/// Errors of the outer surface: configuration, provider setup, CLI input
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
