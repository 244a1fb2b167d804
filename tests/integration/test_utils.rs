//! Shared test utilities for integration tests
//!
//! Provides a scripted completion gateway that records every request it sees,
//! so tests can assert on call order and prompt contents.

use async_trait::async_trait;
use retrans::error::{GatewayError, ServiceErrorKind};
use retrans::gateway::{CompletionGateway, CompletionRequest};
use retrans::pipeline::TranslationRequest;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// What the gateway does for one call
pub enum Step {
    Reply(String),
    Fail(GatewayError),
    /// Never resolves; used to exercise cancellation
    Hang,
}

pub struct ScriptedGateway {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGateway {
    pub fn new(script: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Gateway answering each call with the next text, in order
    pub fn replying(texts: &[&str]) -> Arc<Self> {
        Self::new(texts.iter().map(|t| Step::Reply(t.to_string())).collect())
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GatewayError> {
        self.requests.lock().unwrap().push(request);
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(text)) => Ok(text),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Hang) => std::future::pending().await,
            None => Err(GatewayError::service(
                ServiceErrorKind::Request,
                "no scripted response left",
            )),
        }
    }
}

pub fn hello_world_request(country: &str) -> TranslationRequest {
    TranslationRequest::new("English", "Chinese", "Hello world.", country)
}

/// Global mutex to serialize environment variable access across tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Hold while a test reads or writes process environment
pub fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
}
