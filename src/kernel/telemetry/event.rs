use serde::Serialize;

use crate::backend::JokeSource;
use crate::error::Degradation;

// Allowed: enums, counts, durations
// Forbidden: utterances, joke text, model output

#[derive(Debug, Clone, Serialize)]
pub enum TelemetryEvent {
    Submission {
        reply: ReplyKind,
        /// Set for joke replies only.
        source: Option<JokeSource>,
        classification_degraded: bool,
        elapsed_ms: u64,
    },

    ModelLoad {
        succeeded: bool,
        elapsed_ms: u64,
    },

    ModelSwitch {
        succeeded: bool,
        elapsed_ms: u64,
    },

    Degraded(Degradation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReplyKind {
    Status,
    Guidance,
    Joke,
}
