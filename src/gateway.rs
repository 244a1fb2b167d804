//! Completion Gateway
//!
//! The boundary the pipeline calls to generate text. Stages issue exactly one
//! call each and never retry; retries, if wanted, belong to an implementation
//! of [`CompletionGateway`]. [`ProviderGateway`] adapts a configured model
//! provider client to this boundary.

use crate::error::{GatewayError, ServiceErrorKind};
use crate::provider::{ChatMessage, CompletionOptions, MessageRole, ModelProviderClient};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// One completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub user_prompt: String,
    /// Model override; `None` uses the gateway's default model
    pub model: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
}

#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Generate text for `request`. Blank output is a [`GatewayError::ModelRefusal`].
    async fn complete(&self, request: CompletionRequest) -> Result<String, GatewayError>;
}

/// Finish reasons providers use to signal filtered output
const REFUSAL_FINISH_REASONS: &[&str] = &["content_filter", "refusal", "safety"];

/// Gateway backed by a model provider client, with a per-call timeout
pub struct ProviderGateway {
    client: Box<dyn ModelProviderClient>,
    timeout: Duration,
    max_tokens: Option<u32>,
}

impl ProviderGateway {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(client: Box<dyn ModelProviderClient>) -> Self {
        Self {
            client,
            timeout: Self::DEFAULT_TIMEOUT,
            max_tokens: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }
}

#[async_trait]
impl CompletionGateway for ProviderGateway {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GatewayError> {
        let messages = vec![
            ChatMessage {
                role: MessageRole::System,
                content: request.system_instruction,
            },
            ChatMessage {
                role: MessageRole::User,
                content: request.user_prompt,
            },
        ];
        let options = CompletionOptions {
            model: request.model,
            temperature: Some(request.temperature),
            top_p: Some(request.top_p),
            max_tokens: self.max_tokens,
            stop: None,
        };

        let response = tokio::time::timeout(self.timeout, self.client.complete(messages, options))
            .await
            .map_err(|_| {
                GatewayError::service(
                    ServiceErrorKind::Timeout,
                    format!("No response within {}s", self.timeout.as_secs_f32()),
                )
            })??;

        debug!(
            provider = self.client.provider_name(),
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            finish_reason = ?response.finish_reason,
            "Completion received"
        );

        if let Some(reason) = response.finish_reason.as_deref() {
            if REFUSAL_FINISH_REASONS.contains(&reason) {
                return Err(GatewayError::ModelRefusal(format!(
                    "generation stopped with finish reason '{}'",
                    reason
                )));
            }
        }
        if response.content.trim().is_empty() {
            return Err(GatewayError::ModelRefusal(
                "model returned empty content".to_string(),
            ));
        }
        Ok(response.content)
    }
}
