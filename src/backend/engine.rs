use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::Serialize;

use crate::error::EngineError;

/// Incremental content fragments in delivery order. Ends when the model
/// signals completion.
pub type FragmentStream = BoxStream<'static, Result<String, EngineError>>;

/// Receives fractional load progress in 0.0..=1.0.
pub type ProgressCallback = Arc<dyn Fn(f32) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Sampling defaults applied when a model is (re)loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadOptions {
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 1.0,
        }
    }
}

/// A local language model runtime.
#[async_trait]
pub trait ModelEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Acquires and initializes `model_id`, reporting progress as it goes.
    async fn reload(
        &self,
        model_id: &str,
        options: LoadOptions,
        progress: ProgressCallback,
    ) -> Result<(), EngineError>;

    /// Issues a streamed chat completion.
    async fn stream_chat(&self, request: ChatRequest) -> Result<FragmentStream, EngineError>;
}

/// Engine used when generation is switched off: every load fails, so the
/// session runs on fallback jokes.
#[derive(Debug, Default, Clone)]
pub struct DisabledEngine;

#[async_trait]
impl ModelEngine for DisabledEngine {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn reload(
        &self,
        _model_id: &str,
        _options: LoadOptions,
        _progress: ProgressCallback,
    ) -> Result<(), EngineError> {
        Err(EngineError::Load("generation backend disabled by configuration".into()))
    }

    async fn stream_chat(&self, _request: ChatRequest) -> Result<FragmentStream, EngineError> {
        Err(EngineError::Generation("generation backend disabled by configuration".into()))
    }
}
