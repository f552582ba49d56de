use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use super::telemetry::event::{ReplyKind, TelemetryEvent};
use super::telemetry::recorder::{self, SharedRecorder};
use crate::backend::{FallbackReason, GenerationBackend, JokeReply, JokeSource};
use crate::error::Degradation;
use crate::intent::{ClassifierMode, IntentClassifier};

pub const GUIDANCE_MESSAGE: &str = "I'm here to tell jokes! Ask me for a joke about any topic. I use advanced NLP to understand your intent and AI to generate creative jokes.";

/// Exactly one of these is produced per non-empty submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Status(String),
    Guidance,
    Joke(JokeReply),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Status(report) => report,
            Reply::Guidance => GUIDANCE_MESSAGE,
            Reply::Joke(joke) => &joke.text,
        }
    }

    pub fn kind(&self) -> ReplyKind {
        match self {
            Reply::Status(_) => ReplyKind::Status,
            Reply::Guidance => ReplyKind::Guidance,
            Reply::Joke(_) => ReplyKind::Joke,
        }
    }

    fn source(&self) -> Option<JokeSource> {
        match self {
            Reply::Joke(joke) => Some(joke.source),
            _ => None,
        }
    }
}

/// "status" or "loading" anywhere in the text, any case. Checked before
/// classification, so "is my joke still loading" is a status query.
pub fn is_status_command(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("status") || lower.contains("loading")
}

/// Routes one submission: status escape hatch, then classification, then
/// the backend or the fallback jokes.
pub struct Dispatcher {
    classifier: IntentClassifier,
    backend: Arc<GenerationBackend>,
    telemetry: SharedRecorder,
}

impl Dispatcher {
    pub fn new(classifier: IntentClassifier, backend: Arc<GenerationBackend>, telemetry: SharedRecorder) -> Self {
        Self {
            classifier,
            backend,
            telemetry,
        }
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn backend(&self) -> &Arc<GenerationBackend> {
        &self.backend
    }

    pub fn telemetry(&self) -> &SharedRecorder {
        &self.telemetry
    }

    /// `None` for blank input; nothing is recorded or changed in that case.
    pub async fn handle_submit(&self, text: &str) -> Option<Reply> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let started = Instant::now();
        let mut degraded = false;

        let reply = if is_status_command(text) {
            debug!("status command");
            Reply::Status(self.status_report())
        } else {
            let assessment = self.classifier.assess(text);
            degraded = assessment.degraded;
            if !assessment.signals.is_joke_request() {
                Reply::Guidance
            } else if self.backend.is_ready() {
                info!(mode = %assessment.mode, "joke request, generating");
                Reply::Joke(self.backend.generate_joke(text).await)
            } else {
                info!(state = self.backend.state().label(), "joke request, backend not ready");
                Reply::Joke(self.backend.fallback(FallbackReason::BackendNotReady))
            }
        };

        recorder::record(
            &self.telemetry,
            TelemetryEvent::Submission {
                reply: reply.kind(),
                source: reply.source(),
                classification_degraded: degraded,
                elapsed_ms: started.elapsed().as_millis() as u64,
            },
        );
        if degraded {
            debug!(degradation = ?Degradation::ClassificationDegradation, "classified with patterns only");
        }

        Some(reply)
    }

    pub fn status_report(&self) -> String {
        let mode = self.classifier.mode();
        let state = self.backend.state();
        let stats = recorder::snapshot(&self.telemetry);

        let classification = match mode {
            ClassifierMode::Nlp => "✅ NLP Ready",
            ClassifierMode::PatternOnly => "❌ Fallback Mode",
        };

        let mut report = String::from("📊 Hybrid Architecture Status:\n");
        let _ = writeln!(report, "• Intent Classification (NLP): {}", classification);
        let _ = writeln!(report, "• Joke Generation (AI): {}", state.describe());
        let _ = writeln!(report, "• Overall Status: {}", state.status_line(mode));
        let _ = write!(
            report,
            "• Jokes served: {} generated, {} fallback",
            stats.jokes.generated,
            stats.jokes.fallbacks()
        );
        report.push_str("\n\n🏗️ Architecture:\n");
        report.push_str("• Lightweight NLP for instant intent classification\n");
        report.push_str("• Heavy language model only for joke generation\n");
        report.push_str("• Responsive UX with background AI loading");
        report
    }
}
