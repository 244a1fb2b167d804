//! Provider configuration profile: what the config file says about the model provider.

use crate::error::ApiError;
use crate::provider::ModelProvider;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[serde(rename = "openai")]
    OpenAI,
    Anthropic,
    Ollama,
    #[serde(rename = "local")]
    LocalCustom,
}

impl ProviderType {
    /// Environment variable conventionally holding the provider's API key
    pub fn default_api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderType::Ollama | ProviderType::LocalCustom => None,
        }
    }

    fn requires_api_key(&self) -> bool {
        matches!(self, ProviderType::OpenAI | ProviderType::Anthropic)
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Anthropic => "anthropic",
            ProviderType::Ollama => "ollama",
            ProviderType::LocalCustom => "local",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,

    /// Default model; stages may override it
    pub model: String,

    /// Inline API key. Prefer `api_key_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Name of the environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Base URL (OpenAI, Anthropic, Ollama) or full endpoint (local)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(format!(
                    "Endpoint must be an http(s) URL, got '{}'",
                    endpoint
                ));
            }
        }
        if self.provider_type == ProviderType::LocalCustom && self.endpoint.is_none() {
            return Err("Local providers require an endpoint".to_string());
        }
        if let Some(0) = self.max_tokens {
            return Err("max_tokens must be greater than zero".to_string());
        }
        Ok(())
    }

    /// API key from the config, the named env var, or the provider's default env var
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Some(key.clone());
        }
        let env_name = self
            .api_key_env
            .as_deref()
            .or_else(|| self.provider_type.default_api_key_env())?;
        std::env::var(env_name).ok().filter(|k| !k.trim().is_empty())
    }

    pub fn to_model_provider(&self) -> Result<ModelProvider, ApiError> {
        self.validate().map_err(ApiError::ConfigError)?;

        let api_key = self.resolve_api_key();
        if self.provider_type.requires_api_key() && api_key.is_none() {
            let hint = self
                .api_key_env
                .as_deref()
                .or_else(|| self.provider_type.default_api_key_env())
                .unwrap_or("api_key");
            return Err(ApiError::ProviderNotConfigured(format!(
                "No API key for {} provider (set {} or provider.api_key)",
                self.provider_type, hint
            )));
        }

        let model = self.model.clone();
        let endpoint = self.endpoint.clone();
        Ok(match self.provider_type {
            ProviderType::OpenAI => ModelProvider::OpenAI {
                model,
                api_key: api_key.unwrap_or_default(),
                base_url: endpoint,
            },
            ProviderType::Anthropic => ModelProvider::Anthropic {
                model,
                api_key: api_key.unwrap_or_default(),
                base_url: endpoint,
            },
            ProviderType::Ollama => ModelProvider::Ollama {
                model,
                base_url: endpoint,
            },
            ProviderType::LocalCustom => ModelProvider::LocalCustom {
                model,
                endpoint: endpoint.unwrap_or_default(),
                api_key,
            },
        })
    }

    /// Copy safe to print: the inline API key is masked
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.api_key.is_some() {
            copy.api_key = Some("********".to_string());
        }
        copy
    }
}
