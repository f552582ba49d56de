pub mod analyzer;
pub mod bootstrap;
pub mod classifier;

pub use analyzer::{Document, DocumentAnalyzer, LexiconAnalyzer};
pub use bootstrap::{resolve_analyzer, AnalyzerResolution};
pub use classifier::{Assessment, ClassifierMode, IntentClassifier, IntentSignals};
