use serde::Serialize;
use tracing::{debug, warn};

use super::stream::finalize;
use crate::error::BackendError;
use crate::jokes::FallbackJokeStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FallbackReason {
    BackendNotReady,
    EmptyOutput,
    GenerationFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum JokeSource {
    Model,
    Fallback(FallbackReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JokeReply {
    pub text: String,
    pub source: JokeSource,
}

impl JokeReply {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, JokeSource::Fallback(_))
    }
}

/// The one place a backend outcome becomes user-facing joke text.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackPolicy {
    jokes: FallbackJokeStore,
}

impl FallbackPolicy {
    pub fn new(jokes: FallbackJokeStore) -> Self {
        Self { jokes }
    }

    pub fn jokes(&self) -> &FallbackJokeStore {
        &self.jokes
    }

    pub fn substitute(&self, reason: FallbackReason) -> JokeReply {
        JokeReply {
            text: self.jokes.random().to_string(),
            source: JokeSource::Fallback(reason),
        }
    }

    /// Generated text wins when non-blank; every failure becomes a canned joke.
    pub fn resolve(&self, outcome: Result<String, BackendError>) -> JokeReply {
        match outcome {
            Ok(raw) => match finalize(&raw) {
                Some(text) => JokeReply {
                    text,
                    source: JokeSource::Model,
                },
                None => {
                    warn!("model returned blank output, substituting fallback joke");
                    self.substitute(FallbackReason::EmptyOutput)
                }
            },
            Err(BackendError::EmptyOutput) => {
                warn!("model returned blank output, substituting fallback joke");
                self.substitute(FallbackReason::EmptyOutput)
            }
            Err(BackendError::NotReady(state)) => {
                debug!(state, "backend not ready, substituting fallback joke");
                self.substitute(FallbackReason::BackendNotReady)
            }
            Err(e) => {
                warn!(error = %e, degradation = ?e.degradation(), "generation failed, substituting fallback joke");
                self.substitute(FallbackReason::GenerationFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn generated_text_is_trimmed_and_kept() {
        let policy = FallbackPolicy::default();
        let reply = policy.resolve(Ok("  A pun walks into a bar.\n".into()));
        assert_eq!(reply.text, "A pun walks into a bar.");
        assert_eq!(reply.source, JokeSource::Model);
    }

    #[test]
    fn every_failure_yields_member_of_fallback_set() {
        let policy = FallbackPolicy::default();
        let cases = vec![
            (Ok("   ".to_string()), FallbackReason::EmptyOutput),
            (Err(BackendError::EmptyOutput), FallbackReason::EmptyOutput),
            (Err(BackendError::NotReady("loading")), FallbackReason::BackendNotReady),
            (
                Err(BackendError::Generation(EngineError::Stream("eof".into()))),
                FallbackReason::GenerationFailed,
            ),
        ];
        for (outcome, reason) in cases {
            let reply = policy.resolve(outcome);
            assert!(policy.jokes().contains(&reply.text));
            assert_eq!(reply.source, JokeSource::Fallback(reason));
        }
    }
}
