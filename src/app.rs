//! Wiring from configuration to concrete collaborators.

use std::sync::Arc;

use crate::backend::{DisabledEngine, FallbackPolicy, GenerationBackend, GenerationOptions, ModelEngine};
use crate::config::{BackendKind, JokeBotConfig, NlpEngineKind};
use crate::error::AnalysisError;
use crate::intent::{DocumentAnalyzer, LexiconAnalyzer};
use crate::services::llm::OllamaEngine;

pub fn engine_from_config(config: &JokeBotConfig) -> Arc<dyn ModelEngine> {
    match config.model.backend {
        BackendKind::Ollama => Arc::new(OllamaEngine::new(config.model.endpoint.clone())),
        BackendKind::None => Arc::new(DisabledEngine),
    }
}

pub fn backend_from_config(config: &JokeBotConfig) -> Arc<GenerationBackend> {
    Arc::new(GenerationBackend::new(
        engine_from_config(config),
        FallbackPolicy::default(),
        GenerationOptions::from(&config.generation),
    ))
}

pub async fn init_analyzer(kind: NlpEngineKind) -> Result<Arc<dyn DocumentAnalyzer>, AnalysisError> {
    match kind {
        NlpEngineKind::Lexicon => Ok(Arc::new(LexiconAnalyzer::new())),
        NlpEngineKind::None => Err(AnalysisError::Unavailable("disabled by configuration".into())),
    }
}
