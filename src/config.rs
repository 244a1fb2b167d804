//! Configuration System
//!
//! Layered configuration for the model provider, per-stage sampling settings and
//! logging. Sources merge key by key: built-in defaults, the global config file,
//! workspace config files, then `RETRANS__*` environment variables.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::pipeline::{PipelineSettings, StageSettings};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use crate::provider::{ProviderConfig, ProviderType};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetransConfig {
    /// Model provider used by every stage
    #[serde(default = "default_provider")]
    pub provider: ProviderConfig,

    /// Pipeline timing and per-stage settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_provider() -> ProviderConfig {
    ProviderConfig {
        provider_type: ProviderType::OpenAI,
        model: "gpt-4o-mini".to_string(),
        api_key: None,
        api_key_env: None,
        endpoint: None,
        max_tokens: None,
    }
}

impl Default for RetransConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound for one completion call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub draft: StageSettings,

    #[serde(default)]
    pub critique: StageSettings,

    #[serde(default)]
    pub refine: StageSettings,
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            draft: StageSettings::default(),
            critique: StageSettings::default(),
            refine: StageSettings::default(),
        }
    }
}

impl PipelineConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            draft: self.draft.clone(),
            critique: self.critique.clone(),
            refine: self.refine.clone(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Provider(String),
    Pipeline(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Pipeline(msg) => write!(f, "Pipeline: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl RetransConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if self.pipeline.request_timeout_secs == 0 {
            errors.push(ValidationError::Pipeline(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if let Err(e) = self.pipeline.settings().validate() {
            errors.push(ValidationError::Pipeline(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold all failures into one error
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    /// Copy safe to print
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.provider = self.provider.redacted();
        copy
    }
}
