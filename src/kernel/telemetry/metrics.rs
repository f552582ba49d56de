use std::collections::VecDeque;

use serde::Serialize;

use super::event::{ReplyKind, TelemetryEvent};
use crate::backend::{FallbackReason, JokeSource};
use crate::error::Degradation;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TelemetrySnapshot {
    pub submissions: SubmissionStats,
    pub jokes: JokeStats,
    pub backend: BackendStats,
    pub degradations: DegradationStats,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SubmissionStats {
    pub total: u64,
    pub status_reports: u64,
    pub guidance: u64,
    pub jokes: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct JokeStats {
    pub generated: u64,
    pub fallback_not_ready: u64,
    pub fallback_empty_output: u64,
    pub fallback_generation_failed: u64,
    pub total_generation_ms: u64,
    /// Mean latency of submissions answered by the model.
    pub avg_generation_ms: f64,
}

impl JokeStats {
    pub fn fallbacks(&self) -> u64 {
        self.fallback_not_ready + self.fallback_empty_output + self.fallback_generation_failed
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BackendStats {
    pub loads_succeeded: u64,
    pub loads_failed: u64,
    pub switches_succeeded: u64,
    pub switches_failed: u64,
    pub last_load_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DegradationStats {
    pub classification: u64,
    pub library_unavailable: u64,
    pub backend_load: u64,
    pub backend_switch: u64,
    pub generation: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::Submission {
                reply,
                source,
                classification_degraded,
                elapsed_ms,
            } => {
                snap.submissions.total += 1;
                if *classification_degraded {
                    snap.degradations.classification += 1;
                }
                match reply {
                    ReplyKind::Status => snap.submissions.status_reports += 1,
                    ReplyKind::Guidance => snap.submissions.guidance += 1,
                    ReplyKind::Joke => snap.submissions.jokes += 1,
                }
                match source {
                    Some(JokeSource::Model) => {
                        snap.jokes.generated += 1;
                        snap.jokes.total_generation_ms += elapsed_ms;
                    }
                    Some(JokeSource::Fallback(reason)) => match reason {
                        FallbackReason::BackendNotReady => snap.jokes.fallback_not_ready += 1,
                        FallbackReason::EmptyOutput => {
                            snap.jokes.fallback_empty_output += 1;
                            snap.degradations.generation += 1;
                        }
                        FallbackReason::GenerationFailed => {
                            snap.jokes.fallback_generation_failed += 1;
                            snap.degradations.generation += 1;
                        }
                    },
                    None => {}
                }
            }
            TelemetryEvent::ModelLoad { succeeded, elapsed_ms } => {
                if *succeeded {
                    snap.backend.loads_succeeded += 1;
                } else {
                    snap.backend.loads_failed += 1;
                    snap.degradations.backend_load += 1;
                }
                snap.backend.last_load_ms = Some(*elapsed_ms);
            }
            TelemetryEvent::ModelSwitch { succeeded, .. } => {
                if *succeeded {
                    snap.backend.switches_succeeded += 1;
                } else {
                    snap.backend.switches_failed += 1;
                    snap.degradations.backend_switch += 1;
                }
            }
            TelemetryEvent::Degraded(kind) => match kind {
                Degradation::LibraryUnavailable => snap.degradations.library_unavailable += 1,
                Degradation::ClassificationDegradation => snap.degradations.classification += 1,
                Degradation::BackendLoadFailure => snap.degradations.backend_load += 1,
                Degradation::BackendSwitchFailure => snap.degradations.backend_switch += 1,
                Degradation::GenerationFailure => snap.degradations.generation += 1,
            },
        }
    }

    if snap.jokes.generated > 0 {
        snap.jokes.avg_generation_ms = snap.jokes.total_generation_ms as f64 / snap.jokes.generated as f64;
    }

    snap
}
