//! Model Provider Abstraction
//!
//! Clients for the chat completion APIs the translation pipeline can run on:
//! OpenAI and any OpenAI-compatible endpoint (DeepSeek, SiliconFlow, vLLM,
//! llama.cpp server), Anthropic, and local models via Ollama. The pipeline
//! never sees these types; it talks to [`crate::gateway::CompletionGateway`].

use crate::error::{GatewayError, ServiceErrorKind};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub mod profile;

pub use profile::{ProviderConfig, ProviderType};

/// Model provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelProvider {
    OpenAI {
        model: String,
        api_key: String,
        base_url: Option<String>, // For OpenAI-compatible hosts (e.g. DeepSeek, Azure)
    },
    Anthropic {
        model: String,
        api_key: String,
        base_url: Option<String>,
    },
    Ollama {
        model: String,
        base_url: Option<String>, // Default: http://localhost:11434
    },
    LocalCustom {
        model: String,
        endpoint: String, // Full endpoint URL (e.g., http://localhost:8080/v1)
        api_key: Option<String>,
    },
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

/// Completion options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub model: Option<String>,     // Overrides the client's model for one call
    pub temperature: Option<f32>,  // 0.0-2.0
    pub top_p: Option<f32>,        // Nucleus sampling
    pub max_tokens: Option<u32>,   // Maximum tokens to generate
    pub stop: Option<Vec<String>>, // Stop sequences
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

/// Model provider client trait
#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    /// Generate a completion from a list of messages
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, GatewayError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Get the model name
    fn model_name(&self) -> &str;
}

// OpenAI-compatible API request/response structures
#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// Helper function to convert MessageRole to string
fn role_to_string(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

// Map transport-level failures to gateway errors
fn map_http_error(error: reqwest::Error) -> GatewayError {
    if let Some(status) = error.status() {
        status_error(status, error.to_string())
    } else if error.is_timeout() {
        GatewayError::service(ServiceErrorKind::Timeout, format!("Request timeout: {}", error))
    } else if error.is_connect() {
        GatewayError::service(ServiceErrorKind::Network, format!("Connection error: {}", error))
    } else if error.is_decode() {
        GatewayError::service(
            ServiceErrorKind::MalformedResponse,
            format!("Failed to decode response: {}", error),
        )
    } else {
        GatewayError::service(ServiceErrorKind::Network, format!("HTTP error: {}", error))
    }
}

fn status_error(status: StatusCode, detail: String) -> GatewayError {
    let (kind, label) = match status.as_u16() {
        401 | 403 => (ServiceErrorKind::Auth, "Authentication failed"),
        404 => (ServiceErrorKind::ModelNotFound, "Model not found"),
        429 => (ServiceErrorKind::RateLimit, "Rate limit exceeded"),
        _ => (ServiceErrorKind::Request, "Request failed"),
    };
    GatewayError::service(kind, format!("{} (status {}): {}", label, status, detail))
}

fn malformed(error: impl std::fmt::Display) -> GatewayError {
    GatewayError::service(
        ServiceErrorKind::MalformedResponse,
        format!("Failed to parse response: {}", error),
    )
}

/// Send a request and return the body text of a successful response
async fn send(request: RequestBuilder) -> Result<String, GatewayError> {
    let response = request.send().await.map_err(map_http_error)?;
    let status = response.status();
    let body = response.text().await.map_err(map_http_error)?;
    if !status.is_success() {
        return Err(status_error(status, body));
    }
    Ok(body)
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounds the connect phase only; `ProviderGateway` bounds the whole call.
fn build_provider_http_client() -> Result<Client, GatewayError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .build()
        .map_err(|e| {
            GatewayError::service(
                ServiceErrorKind::Network,
                format!("Failed to create HTTP client: {}", e),
            )
        })
}

/// Client for the OpenAI chat completions wire format.
///
/// Serves OpenAI itself, Ollama's `/v1` endpoint and custom compatible servers.
pub struct OpenAICompatibleClient {
    client: Client,
    provider_name: &'static str,
    model: String,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAICompatibleClient {
    pub const OPENAI_BASE_URL: &'static str = "https://api.openai.com/v1";
    pub const OLLAMA_BASE_URL: &'static str = "http://localhost:11434";

    pub fn openai(model: String, api_key: String, base_url: Option<String>) -> Result<Self, GatewayError> {
        Self::build(
            "openai",
            model,
            Some(api_key),
            base_url.unwrap_or_else(|| Self::OPENAI_BASE_URL.to_string()),
        )
    }

    pub fn ollama(model: String, base_url: Option<String>) -> Result<Self, GatewayError> {
        let base_url = base_url.unwrap_or_else(|| Self::OLLAMA_BASE_URL.to_string());
        Self::build(
            "ollama",
            model,
            None,
            format!("{}/v1", base_url.trim_end_matches('/')),
        )
    }

    pub fn local(model: String, endpoint: String, api_key: Option<String>) -> Result<Self, GatewayError> {
        Self::build("local", model, api_key, endpoint)
    }

    fn build(
        provider_name: &'static str,
        model: String,
        api_key: Option<String>,
        base_url: String,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_provider_http_client()?,
            provider_name,
            model,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ModelProviderClient for OpenAICompatibleClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, GatewayError> {
        let openai_messages: Vec<OpenAIMessage> = messages
            .into_iter()
            .map(|msg| OpenAIMessage {
                role: role_to_string(msg.role).to_string(),
                content: Some(msg.content),
            })
            .collect();

        let request = ChatCompletionRequest {
            model: options.model.unwrap_or_else(|| self.model.clone()),
            messages: openai_messages,
            temperature: options.temperature,
            top_p: options.top_p,
            max_tokens: options.max_tokens,
            stop: options.stop,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let mut request_builder = self.client.post(&url).json(&request);
        if let Some(api_key) = &self.api_key {
            request_builder = request_builder.bearer_auth(api_key);
        }

        let body = send(request_builder).await?;
        let completion: ChatCompletionResponse = serde_json::from_str(&body).map_err(malformed)?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| malformed("no choices in response"))?;

        let usage = completion.usage.unwrap_or(Usage {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
        });

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            model: completion.model,
            usage: TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
            finish_reason: choice.finish_reason,
        })
    }

    fn provider_name(&self) -> &str {
        self.provider_name
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Anthropic Messages API client
pub struct AnthropicClient {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    pub const BASE_URL: &'static str = "https://api.anthropic.com";
    const API_VERSION: &'static str = "2023-06-01";
    const DEFAULT_MAX_TOKENS: u32 = 4096;

    pub fn new(model: String, api_key: String, base_url: Option<String>) -> Result<Self, GatewayError> {
        let base_url = base_url.unwrap_or_else(|| Self::BASE_URL.to_string());
        Ok(Self {
            client: build_provider_http_client()?,
            model,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ModelProviderClient for AnthropicClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, GatewayError> {
        // Anthropic takes the system prompt as a top-level field
        let system_message = messages
            .iter()
            .find(|m| m.role == MessageRole::System)
            .map(|m| m.content.clone());

        let conversation: Vec<_> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| json!({"role": role_to_string(m.role), "content": m.content}))
            .collect();

        let mut request_body = json!({
            "model": options.model.unwrap_or_else(|| self.model.clone()),
            "max_tokens": options.max_tokens.unwrap_or(Self::DEFAULT_MAX_TOKENS),
            "messages": conversation,
        });
        if let Some(system) = system_message {
            request_body["system"] = json!(system);
        }
        if let Some(temp) = options.temperature {
            request_body["temperature"] = json!(temp);
        }
        if let Some(top_p) = options.top_p {
            request_body["top_p"] = json!(top_p);
        }
        if let Some(stop) = options.stop {
            request_body["stop_sequences"] = json!(stop);
        }

        let url = format!("{}/v1/messages", self.base_url);
        let request_builder = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .json(&request_body);

        #[derive(Deserialize)]
        struct AnthropicResponse {
            content: Vec<AnthropicContent>,
            model: String,
            stop_reason: Option<String>,
            usage: Option<AnthropicUsage>,
        }

        #[derive(Deserialize)]
        struct AnthropicContent {
            #[serde(default)]
            text: String,
        }

        #[derive(Deserialize)]
        struct AnthropicUsage {
            input_tokens: u32,
            output_tokens: u32,
        }

        let body = send(request_builder).await?;
        let completion: AnthropicResponse = serde_json::from_str(&body).map_err(malformed)?;

        let content = completion
            .content
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        let usage = completion.usage.unwrap_or(AnthropicUsage {
            input_tokens: 0,
            output_tokens: 0,
        });

        Ok(CompletionResponse {
            content,
            model: completion.model,
            usage: TokenUsage {
                prompt_tokens: usage.input_tokens,
                completion_tokens: usage.output_tokens,
                total_tokens: usage.input_tokens + usage.output_tokens,
            },
            finish_reason: completion.stop_reason,
        })
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Provider factory for creating provider clients
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_client(
        provider: &ModelProvider,
    ) -> Result<Box<dyn ModelProviderClient>, GatewayError> {
        match provider {
            ModelProvider::OpenAI {
                model,
                api_key,
                base_url,
            } => Ok(Box::new(OpenAICompatibleClient::openai(
                model.clone(),
                api_key.clone(),
                base_url.clone(),
            )?)),
            ModelProvider::Anthropic {
                model,
                api_key,
                base_url,
            } => Ok(Box::new(AnthropicClient::new(
                model.clone(),
                api_key.clone(),
                base_url.clone(),
            )?)),
            ModelProvider::Ollama { model, base_url } => Ok(Box::new(
                OpenAICompatibleClient::ollama(model.clone(), base_url.clone())?,
            )),
            ModelProvider::LocalCustom {
                model,
                endpoint,
                api_key,
            } => Ok(Box::new(OpenAICompatibleClient::local(
                model.clone(),
                endpoint.clone(),
                api_key.clone(),
            )?)),
        }
    }
}
