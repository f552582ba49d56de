#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use tokio::sync::Notify;

use jokebot::backend::{
    ChatRequest, FallbackPolicy, FragmentStream, GenerationBackend, GenerationOptions, LoadOptions, ModelEngine,
    ProgressCallback,
};
use jokebot::error::EngineError;

/// How the engine answers the next chat request.
#[derive(Debug, Clone)]
pub enum ChatScript {
    Fragments(Vec<&'static str>),
    BreakAfter(Vec<&'static str>),
    Refuse,
}

/// In-process engine driven by queued outcomes. Loads succeed unless a
/// failure is queued; chat answers default to a fixed joke.
#[derive(Default)]
pub struct ScriptedEngine {
    loads: Mutex<VecDeque<Result<(), String>>>,
    chats: Mutex<VecDeque<ChatScript>>,
    progress_steps: Vec<f32>,
    load_gate: Option<Arc<Notify>>,
    pub reloads: Mutex<Vec<String>>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

pub const DEFAULT_JOKE: &str = "Why did the scripted engine cross the road? To reach the other test.";

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, steps: &[f32]) -> Self {
        self.progress_steps = steps.to_vec();
        self
    }

    /// Loads block until the gate is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.load_gate = Some(gate);
        self
    }

    pub fn fail_next_load(self, reason: &str) -> Self {
        self.loads.lock().unwrap().push_back(Err(reason.to_string()));
        self
    }

    pub fn succeed_next_load(self) -> Self {
        self.loads.lock().unwrap().push_back(Ok(()));
        self
    }

    pub fn then_chat(self, script: ChatScript) -> Self {
        self.chats.lock().unwrap().push_back(script);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn reload(
        &self,
        model_id: &str,
        _options: LoadOptions,
        progress: ProgressCallback,
    ) -> Result<(), EngineError> {
        self.reloads.lock().unwrap().push(model_id.to_string());
        for step in &self.progress_steps {
            progress(*step);
            tokio::task::yield_now().await;
        }
        if let Some(gate) = &self.load_gate {
            gate.notified().await;
        }
        let outcome = self.loads.lock().unwrap().pop_front().unwrap_or(Ok(()));
        outcome.map_err(EngineError::Load)
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<FragmentStream, EngineError> {
        self.requests.lock().unwrap().push(request);
        let script = self
            .chats
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ChatScript::Fragments(vec![DEFAULT_JOKE]));

        match script {
            ChatScript::Fragments(parts) => {
                Ok(stream::iter(parts.into_iter().map(|p| Ok(p.to_string()))).boxed())
            }
            ChatScript::BreakAfter(parts) => {
                let items: Vec<Result<String, EngineError>> = parts
                    .into_iter()
                    .map(|p| Ok(p.to_string()))
                    .chain(std::iter::once(Err(EngineError::Stream("connection reset".into()))))
                    .collect();
                Ok(stream::iter(items).boxed())
            }
            ChatScript::Refuse => Err(EngineError::Generation("engine crashed".into())),
        }
    }
}

pub fn backend_with(engine: Arc<ScriptedEngine>) -> Arc<GenerationBackend> {
    Arc::new(GenerationBackend::new(
        engine,
        FallbackPolicy::default(),
        GenerationOptions::default(),
    ))
}

/// Backend already Ready on `model`.
pub async fn ready_backend(engine: Arc<ScriptedEngine>, model: &str) -> Arc<GenerationBackend> {
    let backend = backend_with(engine);
    backend.load(model).await.expect("scripted load succeeds");
    backend
}
