use serde::Serialize;
use thiserror::Error;

/// Failures raised by a model engine (network, server, stream).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model load failed: {0}")]
    Load(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("malformed stream line: {0}")]
    Malformed(String),

    #[error("stream interrupted: {0}")]
    Stream(String),
}

/// Failures of the generation backend lifecycle.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend not ready (state: {0})")]
    NotReady(&'static str),

    #[error("invalid backend transition from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error("failed to load model {model}: {source}")]
    Load {
        model: String,
        #[source]
        source: EngineError,
    },

    #[error("failed to switch to model {model}: {source}")]
    Switch {
        model: String,
        #[source]
        source: EngineError,
    },

    #[error("generation failed: {0}")]
    Generation(#[source] EngineError),

    #[error("model produced empty output")]
    EmptyOutput,

    #[error("model {0} is not in the registry")]
    UnknownModel(String),
}

impl BackendError {
    /// Maps the failure onto the recovery taxonomy.
    pub fn degradation(&self) -> Degradation {
        match self {
            BackendError::Load { .. } => Degradation::BackendLoadFailure,
            BackendError::Switch { .. } | BackendError::UnknownModel(_) => {
                Degradation::BackendSwitchFailure
            }
            BackendError::NotReady(_) | BackendError::InvalidTransition { .. } => {
                Degradation::BackendLoadFailure
            }
            BackendError::Generation(_) | BackendError::EmptyOutput => {
                Degradation::GenerationFailure
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analyzer unavailable: {0}")]
    Unavailable(String),

    #[error("analysis failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("unknown {key} option {value:?}")]
    UnknownOption { key: &'static str, value: String },
}

/// Every recoverable failure in the core lands in exactly one of these.
/// None of them is ever shown to the user as a raw error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Degradation {
    ClassificationDegradation,
    LibraryUnavailable,
    BackendLoadFailure,
    BackendSwitchFailure,
    GenerationFailure,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_map_to_taxonomy() {
        let load = BackendError::Load {
            model: "m".into(),
            source: EngineError::Load("oom".into()),
        };
        assert_eq!(load.degradation(), Degradation::BackendLoadFailure);

        let switch = BackendError::Switch {
            model: "m".into(),
            source: EngineError::Load("oom".into()),
        };
        assert_eq!(switch.degradation(), Degradation::BackendSwitchFailure);

        assert_eq!(BackendError::EmptyOutput.degradation(), Degradation::GenerationFailure);
        assert_eq!(
            BackendError::Generation(EngineError::Stream("eof".into())).degradation(),
            Degradation::GenerationFailure
        );
    }
}
