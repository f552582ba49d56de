use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::dispatcher::{Dispatcher, Reply};
use super::event::{MessageHandle, Sender};
use super::telemetry::event::TelemetryEvent;
use super::telemetry::recorder::{self, SharedRecorder, TelemetryRecorder};
use super::telemetry::TelemetrySnapshot;
use crate::backend::state::percent;
use crate::backend::{BackendState, GenerationBackend};
use crate::config::JokeBotConfig;
use crate::error::{AnalysisError, BackendError};
use crate::intent::{resolve_analyzer, ClassifierMode, DocumentAnalyzer};
use crate::outputs::ChatSurface;

pub const LOAD_NOTICE: &str =
    "⏳ Loading AI model in background for joke generation... This may take a few minutes.";
pub const LOAD_PROGRESS: &str = "🔄 Initializing AI model for joke generation...";
pub const MODEL_READY: &str =
    "🎉 AI model is now ready for joke generation! You can now get AI-generated jokes!";
pub const LOAD_FAILED_PROGRESS: &str =
    "❌ AI model failed to load. Using fallback mode for joke generation.";
pub const LOAD_FAILED_NOTICE: &str = "⚠️ AI model failed to load. You can still use fallback jokes!";
pub const SWITCH_FAILED: &str = "Failed to switch model. Please try again.";
pub const SWITCH_WHILE_LOADING: &str =
    "⏳ The AI model is still loading. You can switch models once it is ready.";

pub fn welcome_message(mode: ClassifierMode) -> String {
    let flavor = match mode {
        ClassifierMode::Nlp => "advanced NLP",
        ClassifierMode::PatternOnly => "fallback",
    };
    format!(
        "Hello! I'm JokeBot 🤖 with {} intent classification! Ask me for a joke about any topic! \
         (AI model loading in background for joke generation - will be available soon!)",
        flavor
    )
}

/// Model selection offered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRegistry {
    pub default_model: String,
    pub available: Vec<String>,
}

impl ModelRegistry {
    pub fn new(default_model: impl Into<String>, available: Vec<String>) -> Self {
        let default_model = default_model.into();
        let mut available = available;
        if !available.contains(&default_model) {
            available.insert(0, default_model.clone());
        }
        Self {
            default_model,
            available,
        }
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.available.iter().any(|m| m == model_id)
    }
}

impl From<&JokeBotConfig> for ModelRegistry {
    fn from(config: &JokeBotConfig) -> Self {
        Self::new(config.model.default_model.clone(), config.model.available_models.clone())
    }
}

/// One conversation: classifier, shared backend and surface wired together.
/// Submissions and switches are expected one at a time.
pub struct ChatSession {
    dispatcher: Dispatcher,
    backend: Arc<GenerationBackend>,
    surface: Arc<dyn ChatSurface>,
    telemetry: SharedRecorder,
    registry: ModelRegistry,
    load_task: Option<JoinHandle<()>>,
}

impl ChatSession {
    /// Resolves the analyzer (bounded by `ceiling`), greets the user and
    /// starts loading the default model in the background.
    pub async fn start<F>(
        analyzer_init: F,
        ceiling: Duration,
        backend: Arc<GenerationBackend>,
        surface: Arc<dyn ChatSurface>,
        registry: ModelRegistry,
    ) -> Self
    where
        F: Future<Output = Result<Arc<dyn DocumentAnalyzer>, AnalysisError>>,
    {
        let telemetry = TelemetryRecorder::shared();
        let resolution = resolve_analyzer(analyzer_init, ceiling).await;
        if let Some(degradation) = resolution.degradation() {
            recorder::record(&telemetry, TelemetryEvent::Degraded(degradation));
        }

        let classifier = resolution.into_classifier();
        let mode = classifier.mode();
        surface.set_status(&backend.state().status_line(mode));
        surface.append_message(Sender::Bot, &welcome_message(mode));

        let mut session = Self {
            dispatcher: Dispatcher::new(classifier, Arc::clone(&backend), Arc::clone(&telemetry)),
            backend,
            surface,
            telemetry,
            registry,
            load_task: None,
        };
        session.load_task = Some(session.spawn_model_load());
        session
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn backend(&self) -> &Arc<GenerationBackend> {
        &self.backend
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn mode(&self) -> ClassifierMode {
        self.dispatcher.classifier().mode()
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        recorder::snapshot(&self.telemetry)
    }

    /// Waits for the background load to settle. True when the model is ready.
    pub async fn model_loaded(&mut self) -> bool {
        if let Some(task) = self.load_task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "model load task ended abnormally");
            }
        }
        self.backend.is_ready()
    }

    fn spawn_model_load(&self) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        let surface = Arc::clone(&self.surface);
        let telemetry = Arc::clone(&self.telemetry);
        let model_id = self.registry.default_model.clone();
        let mode = self.mode();

        tokio::spawn(async move {
            surface.append_message(Sender::Bot, LOAD_NOTICE);
            let progress_msg = surface.append_message(Sender::Bot, LOAD_PROGRESS);
            let mut updates = backend.subscribe();
            let started = Instant::now();

            let outcome = track(
                &mut updates,
                surface.as_ref(),
                mode,
                Some(progress_msg),
                backend.load(&model_id),
            )
            .await;

            match outcome {
                Ok(()) => {
                    surface.remove_message(progress_msg);
                    surface.append_message(Sender::Bot, MODEL_READY);
                }
                Err(BackendError::InvalidTransition { from, .. }) => {
                    debug!(state = from, "model load already underway");
                    surface.remove_message(progress_msg);
                    return;
                }
                Err(e) => {
                    warn!(error = %e, degradation = ?e.degradation(), "continuing with fallback jokes");
                    surface.update_message(progress_msg, LOAD_FAILED_PROGRESS);
                    surface.append_message(Sender::Bot, LOAD_FAILED_NOTICE);
                }
            }

            recorder::record(
                &telemetry,
                TelemetryEvent::ModelLoad {
                    succeeded: backend.is_ready(),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                },
            );
            surface.set_status(&backend.state().status_line(mode));
        })
    }

    /// Renders the user message, locks input, renders exactly one reply.
    /// Blank input renders nothing.
    pub async fn submit(&self, text: &str) -> Option<Reply> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.surface.append_message(Sender::User, text);
        self.surface.set_busy(true);
        let reply = self.dispatcher.handle_submit(text).await;
        if let Some(reply) = &reply {
            self.surface.append_message(Sender::Bot, reply.text());
        }
        self.surface.set_busy(false);
        reply
    }

    /// Switches the serving model. Only meaningful once the backend is ready.
    pub async fn switch_model(&self, model_id: &str) -> Result<(), BackendError> {
        if !self.registry.contains(model_id) {
            self.surface.append_message(Sender::Bot, SWITCH_FAILED);
            return Err(BackendError::UnknownModel(model_id.to_string()));
        }
        if self.backend.state().is_serving(model_id) {
            self.surface
                .append_message(Sender::Bot, &format!("Already using the {} model.", model_id));
            return Ok(());
        }

        let mode = self.mode();
        let started = Instant::now();
        let mut updates = self.backend.subscribe();
        self.surface.set_busy(true);

        let outcome = track(
            &mut updates,
            self.surface.as_ref(),
            mode,
            None,
            self.backend.switch_model(model_id),
        )
        .await;

        match &outcome {
            Ok(()) => {
                info!(model = model_id, "switched model");
                self.surface
                    .append_message(Sender::Bot, &format!("Switched to {} model!", model_id));
            }
            Err(BackendError::InvalidTransition { from, .. }) => {
                debug!(state = *from, model = model_id, "switch ignored until the model is ready");
                self.surface.append_message(Sender::Bot, SWITCH_WHILE_LOADING);
            }
            Err(e) => {
                warn!(error = %e, "model switch failed");
                self.surface.append_message(Sender::Bot, SWITCH_FAILED);
            }
        }
        if !matches!(outcome, Err(BackendError::InvalidTransition { .. })) {
            recorder::record(
                &self.telemetry,
                TelemetryEvent::ModelSwitch {
                    succeeded: outcome.is_ok(),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                },
            );
        }

        self.surface.set_status(&self.backend.state().status_line(mode));
        self.surface.set_busy(false);
        outcome
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
    }
}

/// Drives `operation` while mirroring backend state changes onto the surface.
async fn track<F, T>(
    updates: &mut watch::Receiver<BackendState>,
    surface: &dyn ChatSurface,
    mode: ClassifierMode,
    progress_msg: Option<MessageHandle>,
    operation: F,
) -> T
where
    F: Future<Output = T>,
{
    tokio::pin!(operation);
    loop {
        tokio::select! {
            result = &mut operation => return result,
            changed = updates.changed() => {
                if changed.is_err() {
                    return operation.await;
                }
                let state = updates.borrow_and_update().clone();
                if let Some(progress) = state.progress() {
                    surface.set_progress(progress);
                    if let Some(handle) = progress_msg {
                        surface.update_message(handle, &format!("{} {}%", LOAD_PROGRESS, percent(progress)));
                    }
                }
                surface.set_status(&state.status_line(mode));
            }
        }
    }
}
