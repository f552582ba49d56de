mod common;

use std::sync::Arc;

use common::{backend_with, ready_backend, ChatScript, ScriptedEngine, DEFAULT_JOKE};
use jokebot::backend::{BackendState, JokeSource};
use jokebot::error::{BackendError, Degradation};
use tokio::sync::Notify;

#[tokio::test]
async fn test_load_reaches_ready_with_monotonic_progress() {
    let engine = Arc::new(ScriptedEngine::new().with_progress(&[0.1, 0.5, 0.3, 0.9, 1.0]));
    let backend = backend_with(Arc::clone(&engine));
    let mut updates = backend.subscribe();
    assert!(!backend.is_ready());

    let watcher = tokio::spawn(async move {
        let mut seen = Vec::new();
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            if let Some(p) = state.progress() {
                seen.push(p);
            }
            if state.is_ready() {
                break;
            }
        }
        seen
    });

    backend.load("phi3").await.unwrap();
    assert!(backend.is_ready());
    assert_eq!(
        backend.state(),
        BackendState::Ready { model_id: "phi3".into(), switch_failed: None }
    );

    let seen = watcher.await.unwrap();
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {:?}", seen);
    assert!(!seen.contains(&0.3));
}

#[tokio::test]
async fn test_load_failure_is_reported_and_retryable() {
    let engine = Arc::new(ScriptedEngine::new().fail_next_load("webgpu unavailable"));
    let backend = backend_with(Arc::clone(&engine));

    let err = backend.load("phi3").await.unwrap_err();
    assert!(matches!(err, BackendError::Load { .. }));
    assert_eq!(err.degradation(), Degradation::BackendLoadFailure);
    assert!(matches!(backend.state(), BackendState::Failed { ref reason, .. } if reason.contains("webgpu")));
    assert!(!backend.is_ready());

    backend.load("phi3").await.unwrap();
    assert!(backend.is_ready());
    assert_eq!(engine.reloads.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_load_rejected_while_loading_or_ready() {
    let gate = Arc::new(Notify::new());
    let engine = Arc::new(ScriptedEngine::new().gated(Arc::clone(&gate)));
    let backend = backend_with(engine);

    let loading = {
        let backend = Arc::clone(&backend);
        tokio::spawn(async move { backend.load("phi3").await })
    };
    while backend.state().label() != "loading" {
        tokio::task::yield_now().await;
    }

    let err = backend.load("phi3").await.unwrap_err();
    assert!(matches!(err, BackendError::InvalidTransition { from: "loading", .. }));

    gate.notify_one();
    loading.await.unwrap().unwrap();

    let err = backend.load("phi3").await.unwrap_err();
    assert!(matches!(err, BackendError::InvalidTransition { from: "ready", .. }));
}

#[tokio::test]
async fn test_generate_while_not_ready_falls_back() {
    let engine = Arc::new(ScriptedEngine::new());
    let backend = backend_with(Arc::clone(&engine));

    let reply = backend.generate_joke("cats").await;
    assert!(reply.is_fallback());
    assert!(backend.policy().jokes().contains(&reply.text));
    assert_eq!(engine.request_count(), 0);
}

#[tokio::test]
async fn test_generation_uses_fixed_prompts() {
    let engine = Arc::new(ScriptedEngine::new());
    let backend = ready_backend(Arc::clone(&engine), "phi3").await;

    let reply = backend.generate_joke("penguins").await;
    assert_eq!(reply.text, DEFAULT_JOKE);
    assert_eq!(reply.source, JokeSource::Model);

    let requests = engine.requests.lock().unwrap();
    let request = &requests[0];
    assert_eq!(
        request.messages[0].content,
        "You are a helpful, family-friendly chatbot that tells jokes. Keep responses short and funny."
    );
    assert_eq!(request.messages[1].content, "Tell me a joke about: penguins");
    assert_eq!(request.max_tokens, 100);
    assert_eq!(request.temperature, 0.8);
}

#[tokio::test]
async fn test_switch_success() {
    let engine = Arc::new(ScriptedEngine::new());
    let backend = ready_backend(Arc::clone(&engine), "phi3").await;

    backend.switch_model("gemma").await.unwrap();
    assert_eq!(
        backend.state(),
        BackendState::Ready { model_id: "gemma".into(), switch_failed: None }
    );

    backend.generate_joke("cats").await;
    assert_eq!(engine.requests.lock().unwrap()[0].model, "gemma");
}

#[tokio::test]
async fn test_switch_to_current_model_is_noop() {
    let engine = Arc::new(ScriptedEngine::new());
    let backend = ready_backend(Arc::clone(&engine), "phi3").await;

    backend.switch_model("phi3").await.unwrap();
    assert_eq!(engine.reloads.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_switch_failure_keeps_last_good_model() {
    let engine = Arc::new(ScriptedEngine::new().succeed_next_load().fail_next_load("download aborted"));
    let backend = ready_backend(Arc::clone(&engine), "phi3").await;

    let err = backend.switch_model("gemma").await.unwrap_err();
    assert!(matches!(err, BackendError::Switch { ref model, .. } if model == "gemma"));
    assert_eq!(err.degradation(), Degradation::BackendSwitchFailure);
    assert_eq!(
        backend.state(),
        BackendState::Ready { model_id: "phi3".into(), switch_failed: Some("gemma".into()) }
    );

    let engine_after = Arc::clone(&engine);
    let reply = backend.generate_joke("cats").await;
    assert_eq!(reply.source, JokeSource::Model);
    assert_eq!(engine_after.requests.lock().unwrap()[0].model, "phi3");
}

#[tokio::test]
async fn test_switch_requires_ready() {
    let engine = Arc::new(ScriptedEngine::new());
    let backend = backend_with(engine);

    let err = backend.switch_model("gemma").await.unwrap_err();
    assert!(matches!(err, BackendError::InvalidTransition { from: "unloaded", to: "switching" }));
}

#[tokio::test]
async fn test_interrupted_stream_falls_back() {
    let engine = Arc::new(ScriptedEngine::new().then_chat(ChatScript::BreakAfter(vec!["Knock ", "knock"])));
    let backend = ready_backend(engine, "phi3").await;

    let reply = backend.generate_joke("doors").await;
    assert!(reply.is_fallback());
    assert_ne!(reply.text, "Knock knock");
}
