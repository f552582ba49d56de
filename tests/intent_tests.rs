use std::sync::Arc;
use std::time::Duration;

use jokebot::error::{AnalysisError, Degradation};
use jokebot::intent::analyzer::Document;
use jokebot::intent::classifier::JOKE_KEYWORDS;
use jokebot::intent::{resolve_analyzer, ClassifierMode, DocumentAnalyzer, IntentClassifier, LexiconAnalyzer};

struct BrokenAnalyzer;

impl DocumentAnalyzer for BrokenAnalyzer {
    fn name(&self) -> &str {
        "broken"
    }

    fn analyze(&self, _text: &str) -> Result<Document, AnalysisError> {
        Err(AnalysisError::Failed("model file corrupt".into()))
    }
}

fn classifiers() -> Vec<IntentClassifier> {
    vec![
        IntentClassifier::pattern_only(),
        IntentClassifier::with_analyzer(Arc::new(LexiconAnalyzer::new())),
        IntentClassifier::with_analyzer(Arc::new(BrokenAnalyzer)),
    ]
}

#[test]
fn test_every_keyword_is_a_joke_request() {
    for classifier in classifiers() {
        for keyword in JOKE_KEYWORDS {
            let text = format!("Something {} please", keyword);
            assert!(classifier.classify(&text), "{:?} missed {:?}", classifier, text);
            assert!(classifier.classify(&text.to_uppercase()));
        }
    }
}

#[test]
fn test_plain_questions_are_not_joke_requests() {
    for classifier in classifiers() {
        assert!(!classifier.classify("what time is it"));
        assert!(!classifier.classify("What's the weather?"));
        assert!(!classifier.classify("The meeting moved to noon."));
    }
}

#[test]
fn test_layers() {
    let classifier = IntentClassifier::pattern_only();

    let polite = classifier.assess("Could you give me something to smile about?");
    assert!(polite.signals.question);

    let imperative = classifier.assess("Show me something. It has been a long day");
    assert!(imperative.signals.imperative);
    assert!(!imperative.signals.question);

    let emotional = classifier.assess("I'm feeling down today");
    assert!(emotional.signals.emotional);
    assert!(classifier.classify("please cheer me up"));

    let late_verb = classifier.assess("Yesterday you would tell stories");
    assert!(!late_verb.signals.imperative);
}

#[test]
fn test_analyzer_adds_action_signal() {
    let nlp = IntentClassifier::with_analyzer(Arc::new(LexiconAnalyzer::new()));
    let patterns = IntentClassifier::pattern_only();

    assert!(nlp.classify("Crack me up"));
    assert!(!patterns.classify("Crack me up"));

    let assessment = nlp.assess("Crack me up");
    assert_eq!(assessment.mode, ClassifierMode::Nlp);
    assert!(assessment.signals.action);
}

#[test]
fn test_broken_analyzer_degrades_silently() {
    let classifier = IntentClassifier::with_analyzer(Arc::new(BrokenAnalyzer));
    assert_eq!(classifier.mode(), ClassifierMode::Nlp);

    let assessment = classifier.assess("tell me a joke");
    assert!(assessment.degraded);
    assert_eq!(assessment.mode, ClassifierMode::PatternOnly);
    assert!(assessment.signals.is_joke_request());
}

#[test]
fn test_classification_is_pure() {
    for classifier in classifiers() {
        for text in ["I'm bored", "what time is it", "Can you tell me a joke about dogs?"] {
            assert_eq!(classifier.assess(text), classifier.assess(text));
        }
    }
}

#[tokio::test]
async fn test_resolve_ready_analyzer() {
    let resolution = resolve_analyzer(
        async { Ok(Arc::new(LexiconAnalyzer::new()) as Arc<dyn DocumentAnalyzer>) },
        Duration::from_secs(1),
    )
    .await;
    assert!(resolution.is_ready());
    assert_eq!(resolution.degradation(), None);
    assert_eq!(resolution.into_classifier().mode(), ClassifierMode::Nlp);
}

#[tokio::test]
async fn test_resolve_times_out_to_pattern_mode() {
    let slow = async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Arc::new(LexiconAnalyzer::new()) as Arc<dyn DocumentAnalyzer>)
    };
    let resolution = resolve_analyzer(slow, Duration::from_millis(10)).await;
    assert!(!resolution.is_ready());
    assert_eq!(resolution.degradation(), Some(Degradation::LibraryUnavailable));
    assert_eq!(resolution.into_classifier().mode(), ClassifierMode::PatternOnly);
}

#[tokio::test]
async fn test_resolve_init_error_to_pattern_mode() {
    let failing = async { Err(AnalysisError::Unavailable("cdn unreachable".into())) };
    let resolution = resolve_analyzer(failing, Duration::from_secs(1)).await;
    assert!(matches!(
        resolution,
        jokebot::intent::AnalyzerResolution::Unavailable { ref reason } if reason.contains("cdn")
    ));
}
