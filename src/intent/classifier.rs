use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::analyzer::{split_sentences, DocumentAnalyzer};

/// Fixed joke vocabulary. Matched as substrings of the lower-cased text.
pub const JOKE_KEYWORDS: &[&str] = &[
    "joke",
    "funny",
    "laugh",
    "make me laugh",
    "tell me something funny",
    "humor",
    "hilarious",
    "amusing",
    "entertaining",
    "comedy",
    "pun",
    "wit",
    "sarcasm",
    "satire",
    "anecdote",
    "story",
];

pub const POLITE_REQUESTS: &[&str] = &["tell", "give", "can you", "would you"];

pub const IMPERATIVE_VERBS: &[&str] = &["tell", "give", "make", "show"];

pub const EMOTIONAL_CUES: &[&str] = &["bored", "sad", "down", "need cheering", "cheer me up"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ClassifierMode {
    /// Pattern layers plus document analysis.
    Nlp,
    /// Pattern layers only.
    PatternOnly,
}

impl fmt::Display for ClassifierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierMode::Nlp => write!(f, "NLP"),
            ClassifierMode::PatternOnly => write!(f, "Fallback"),
        }
    }
}

/// Which layers fired for an utterance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntentSignals {
    pub keyword: bool,
    pub question: bool,
    pub imperative: bool,
    pub emotional: bool,
    pub action: bool,
}

impl IntentSignals {
    pub fn is_joke_request(&self) -> bool {
        self.keyword || self.question || self.imperative || self.emotional || self.action
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub signals: IntentSignals,
    /// Mode actually used for this utterance.
    pub mode: ClassifierMode,
    /// Analyzer was configured but failed on this utterance.
    pub degraded: bool,
}

/// Cheap layered heuristic deciding whether an utterance asks for a joke.
#[derive(Clone, Default)]
pub struct IntentClassifier {
    analyzer: Option<Arc<dyn DocumentAnalyzer>>,
}

impl fmt::Debug for IntentClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntentClassifier")
            .field("analyzer", &self.analyzer.as_ref().map(|a| a.name().to_string()))
            .finish()
    }
}

impl IntentClassifier {
    pub fn pattern_only() -> Self {
        Self { analyzer: None }
    }

    pub fn with_analyzer(analyzer: Arc<dyn DocumentAnalyzer>) -> Self {
        Self {
            analyzer: Some(analyzer),
        }
    }

    pub fn mode(&self) -> ClassifierMode {
        if self.analyzer.is_some() {
            ClassifierMode::Nlp
        } else {
            ClassifierMode::PatternOnly
        }
    }

    pub fn classify(&self, text: &str) -> bool {
        self.assess(text).signals.is_joke_request()
    }

    /// Runs every layer and reports which fired. Never fails: an analyzer
    /// error drops this utterance to pattern-only mode.
    pub fn assess(&self, text: &str) -> Assessment {
        let lower = text.to_lowercase();
        let mut signals = pattern_signals(&lower);
        let mut mode = ClassifierMode::PatternOnly;
        let mut degraded = false;

        if let Some(analyzer) = &self.analyzer {
            match analyzer.analyze(text) {
                Ok(doc) => {
                    mode = ClassifierMode::Nlp;
                    signals.action = doc.has_action_tokens();
                    if !signals.question {
                        signals.question = doc
                            .sentences()
                            .any(|sentence| is_polite_question(&sentence.to_lowercase()));
                    }
                    debug!(
                        sentences = doc.sentence_count(),
                        kinds = ?doc.kind_frequencies(),
                        ?signals,
                        "nlp intent classification"
                    );
                }
                Err(e) => {
                    warn!(analyzer = analyzer.name(), error = %e, "analysis failed, classifying with patterns only");
                    degraded = true;
                }
            }
        }

        Assessment {
            signals,
            mode,
            degraded,
        }
    }
}

fn pattern_signals(lower: &str) -> IntentSignals {
    let sentences = split_sentences(lower);

    IntentSignals {
        keyword: JOKE_KEYWORDS.iter().any(|k| lower.contains(k)),
        question: sentences.iter().any(|s| is_polite_question(s)),
        imperative: sentences
            .first()
            .and_then(|s| first_word(s))
            .map(|word| IMPERATIVE_VERBS.contains(&word))
            .unwrap_or(false),
        emotional: EMOTIONAL_CUES.iter().any(|c| lower.contains(c)),
        action: false,
    }
}

fn is_polite_question(sentence: &str) -> bool {
    sentence.contains('?') && POLITE_REQUESTS.iter().any(|p| sentence.contains(p))
}

fn first_word(sentence: &str) -> Option<&str> {
    sentence
        .split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
}
