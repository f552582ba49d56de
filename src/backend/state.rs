use serde::Serialize;

use crate::intent::ClassifierMode;

/// Lifecycle of the single generation backend of a session.
///
/// Unloaded -> Loading -> Ready, Loading -> Failed, Failed -> Loading (retry),
/// Ready -> Switching -> Ready. A failed switch returns to Ready on the
/// previous model with `switch_failed` set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BackendState {
    #[default]
    Unloaded,
    Loading {
        model_id: String,
        progress: f32,
    },
    Ready {
        model_id: String,
        /// Target of the last switch attempt, if it failed.
        switch_failed: Option<String>,
    },
    Switching {
        from: String,
        to: String,
        progress: f32,
    },
    Failed {
        model_id: String,
        reason: String,
    },
}

impl BackendState {
    pub fn label(&self) -> &'static str {
        match self {
            BackendState::Unloaded => "unloaded",
            BackendState::Loading { .. } => "loading",
            BackendState::Ready { .. } => "ready",
            BackendState::Switching { .. } => "switching",
            BackendState::Failed { .. } => "failed",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, BackendState::Ready { .. })
    }

    /// Ready on `model_id` with no pending switch failure.
    pub fn is_serving(&self, model_id: &str) -> bool {
        matches!(self, BackendState::Ready { model_id: current, switch_failed: None } if current == model_id)
    }

    pub fn progress(&self) -> Option<f32> {
        match self {
            BackendState::Loading { progress, .. } | BackendState::Switching { progress, .. } => {
                Some(*progress)
            }
            _ => None,
        }
    }

    /// Moves progress forward only; values are clamped to 0.0..=1.0.
    pub(crate) fn advance(&mut self, value: f32) -> bool {
        let value = if value.is_finite() { value.clamp(0.0, 1.0) } else { return false };
        match self {
            BackendState::Loading { progress, .. } | BackendState::Switching { progress, .. }
                if value > *progress =>
            {
                *progress = value;
                true
            }
            _ => false,
        }
    }

    /// Line shown in the joke-generation row of a status report.
    pub fn describe(&self) -> String {
        match self {
            BackendState::Unloaded => "⏳ Not loaded yet".to_string(),
            BackendState::Loading { model_id, progress } => {
                format!("⏳ Loading {} ({}%)", model_id, percent(*progress))
            }
            BackendState::Ready { model_id, switch_failed: None } => format!("✅ {} Ready", model_id),
            BackendState::Ready { model_id, switch_failed: Some(target) } => {
                format!("✅ {} Ready (switch to {} failed)", model_id, target)
            }
            BackendState::Switching { from, to, progress } => {
                format!("⏳ Switching {} -> {} ({}%)", from, to, percent(*progress))
            }
            BackendState::Failed { model_id, .. } => {
                format!("❌ {} failed to load, using fallback jokes", model_id)
            }
        }
    }

    /// Compact status line combining classifier mode and backend state.
    pub fn status_line(&self, mode: ClassifierMode) -> String {
        match self {
            BackendState::Unloaded => format!("{} + Loading AI...", mode),
            BackendState::Loading { progress, .. } => {
                format!("{} + Loading: {}%", mode, percent(*progress))
            }
            BackendState::Ready { model_id, switch_failed: None } => format!("{} + {}", mode, model_id),
            BackendState::Ready { switch_failed: Some(_), .. } => "Model switch failed".to_string(),
            BackendState::Switching { .. } => "Switching model...".to_string(),
            BackendState::Failed { .. } => format!("{} Only", mode),
        }
    }
}

pub fn percent(progress: f32) -> u32 {
    (progress.clamp(0.0, 1.0) * 100.0).round() as u32
}
