use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use super::engine::{ChatMessage, ChatRequest, LoadOptions, ModelEngine, ProgressCallback};
use super::fallback::{FallbackPolicy, FallbackReason, JokeReply};
use super::state::{percent, BackendState};
use super::stream;
use crate::config::GenerationConfig;
use crate::error::BackendError;

pub const JOKE_SYSTEM_PROMPT: &str =
    "You are a helpful, family-friendly chatbot that tells jokes. Keep responses short and funny.";

#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Upper bound on consumed stream fragments per joke.
    pub max_fragments: usize,
    pub load: LoadOptions,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 100,
            temperature: 0.8,
            max_fragments: 1024,
            load: LoadOptions::default(),
        }
    }
}

impl From<&GenerationConfig> for GenerationOptions {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            ..Self::default()
        }
    }
}

impl GenerationOptions {
    pub fn joke_request(&self, model_id: &str, topic: &str) -> ChatRequest {
        ChatRequest {
            model: model_id.to_string(),
            messages: vec![
                ChatMessage::system(JOKE_SYSTEM_PROMPT),
                ChatMessage::user(format!("Tell me a joke about: {}", topic)),
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// Lifecycle-managed handle to the session's language model.
///
/// State is published on a watch channel; callers serialize `load`,
/// `switch_model` and `generate_joke` themselves.
pub struct GenerationBackend {
    engine: Arc<dyn ModelEngine>,
    state: Arc<watch::Sender<BackendState>>,
    policy: FallbackPolicy,
    options: GenerationOptions,
}

impl GenerationBackend {
    pub fn new(engine: Arc<dyn ModelEngine>, policy: FallbackPolicy, options: GenerationOptions) -> Self {
        let (state, _) = watch::channel(BackendState::Unloaded);
        Self {
            engine,
            state: Arc::new(state),
            policy,
            options,
        }
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    pub fn state(&self) -> BackendState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BackendState> {
        self.state.subscribe()
    }

    pub fn is_ready(&self) -> bool {
        self.state.borrow().is_ready()
    }

    /// Loads `model_id` from Unloaded or Failed. Failure leaves the backend
    /// in Failed; the session keeps serving fallback jokes.
    pub async fn load(&self, model_id: &str) -> Result<(), BackendError> {
        let mut from = "unloaded";
        let accepted = self.state.send_if_modified(|state| match state {
            BackendState::Unloaded | BackendState::Failed { .. } => {
                *state = BackendState::Loading {
                    model_id: model_id.to_string(),
                    progress: 0.0,
                };
                true
            }
            other => {
                from = other.label();
                false
            }
        });
        if !accepted {
            return Err(BackendError::InvalidTransition { from, to: "loading" });
        }

        info!(model = model_id, engine = self.engine.name(), "loading model");
        match self
            .engine
            .reload(model_id, self.options.load, self.progress_reporter())
            .await
        {
            Ok(()) => {
                self.state.send_replace(BackendState::Ready {
                    model_id: model_id.to_string(),
                    switch_failed: None,
                });
                info!(model = model_id, "model ready");
                Ok(())
            }
            Err(source) => {
                error!(model = model_id, error = %source, "model failed to load");
                self.state.send_replace(BackendState::Failed {
                    model_id: model_id.to_string(),
                    reason: source.to_string(),
                });
                Err(BackendError::Load {
                    model: model_id.to_string(),
                    source,
                })
            }
        }
    }

    /// Swaps the loaded model. Only valid from Ready; switching to the model
    /// already serving is a no-op. On failure the backend reports Ready on the
    /// previous model with the failed target recorded. Generation on it may
    /// still fail and fall back.
    pub async fn switch_model(&self, model_id: &str) -> Result<(), BackendError> {
        let mut from = "unloaded";
        let mut previous = String::new();
        let mut unchanged = false;
        let accepted = self.state.send_if_modified(|state| match state {
            _ if state.is_serving(model_id) => {
                unchanged = true;
                false
            }
            BackendState::Ready { model_id: current, .. } => {
                previous = current.clone();
                *state = BackendState::Switching {
                    from: previous.clone(),
                    to: model_id.to_string(),
                    progress: 0.0,
                };
                true
            }
            other => {
                from = other.label();
                false
            }
        });
        if unchanged {
            return Ok(());
        }
        if !accepted {
            return Err(BackendError::InvalidTransition { from, to: "switching" });
        }

        info!(from = %previous, to = model_id, "switching model");
        match self
            .engine
            .reload(model_id, self.options.load, self.progress_reporter())
            .await
        {
            Ok(()) => {
                self.state.send_replace(BackendState::Ready {
                    model_id: model_id.to_string(),
                    switch_failed: None,
                });
                info!(model = model_id, "model switched");
                Ok(())
            }
            Err(source) => {
                error!(from = %previous, to = model_id, error = %source, "model switch failed");
                self.state.send_replace(BackendState::Ready {
                    model_id: previous,
                    switch_failed: Some(model_id.to_string()),
                });
                Err(BackendError::Switch {
                    model: model_id.to_string(),
                    source,
                })
            }
        }
    }

    /// Generates a joke about `topic`. Never fails: anything short of a
    /// non-blank generation becomes a fallback joke.
    pub async fn generate_joke(&self, topic: &str) -> JokeReply {
        let outcome = self.try_generate(topic).await;
        self.policy.resolve(outcome)
    }

    async fn try_generate(&self, topic: &str) -> Result<String, BackendError> {
        let model_id = {
            let state = self.state.borrow();
            match &*state {
                BackendState::Ready { model_id, .. } => model_id.clone(),
                other => return Err(BackendError::NotReady(other.label())),
            }
        };

        let request = self.options.joke_request(&model_id, topic);
        let fragments = self
            .engine
            .stream_chat(request)
            .await
            .map_err(BackendError::Generation)?;
        let raw = stream::accumulate(fragments, self.options.max_fragments)
            .await
            .map_err(BackendError::Generation)?;

        stream::finalize(&raw).ok_or(BackendError::EmptyOutput)
    }

    /// Fallback joke for callers that skip the backend entirely.
    pub fn fallback(&self, reason: FallbackReason) -> JokeReply {
        self.policy.substitute(reason)
    }

    fn progress_reporter(&self) -> ProgressCallback {
        let state = Arc::clone(&self.state);
        Arc::new(move |value: f32| {
            let mut advanced = None;
            state.send_if_modified(|s| {
                let changed = s.advance(value);
                if changed {
                    advanced = s.progress();
                }
                changed
            });
            if let Some(progress) = advanced {
                tracing::debug!(progress = percent(progress), "model loading progress");
            } else if !value.is_finite() {
                warn!("engine reported non-finite progress");
            }
        })
    }
}

impl std::fmt::Debug for GenerationBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationBackend")
            .field("engine", &self.engine.name())
            .field("state", &*self.state.borrow())
            .field("options", &self.options)
            .finish()
    }
}
