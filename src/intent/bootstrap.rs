use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::analyzer::DocumentAnalyzer;
use super::classifier::IntentClassifier;
use crate::error::{AnalysisError, Degradation};

/// Upper bound on analyzer startup before falling back to patterns.
pub const DEFAULT_ANALYZER_CEILING: Duration = Duration::from_millis(15_000);

pub enum AnalyzerResolution {
    Ready(Arc<dyn DocumentAnalyzer>),
    Unavailable { reason: String },
}

impl AnalyzerResolution {
    pub fn is_ready(&self) -> bool {
        matches!(self, AnalyzerResolution::Ready(_))
    }

    pub fn degradation(&self) -> Option<Degradation> {
        match self {
            AnalyzerResolution::Ready(_) => None,
            AnalyzerResolution::Unavailable { .. } => Some(Degradation::LibraryUnavailable),
        }
    }

    pub fn into_classifier(self) -> IntentClassifier {
        match self {
            AnalyzerResolution::Ready(analyzer) => IntentClassifier::with_analyzer(analyzer),
            AnalyzerResolution::Unavailable { .. } => IntentClassifier::pattern_only(),
        }
    }
}

/// Awaits analyzer initialization once, bounded by `ceiling`. A timeout or an
/// init error degrades to pattern-only classification instead of failing.
pub async fn resolve_analyzer<F>(init: F, ceiling: Duration) -> AnalyzerResolution
where
    F: Future<Output = Result<Arc<dyn DocumentAnalyzer>, AnalysisError>>,
{
    match tokio::time::timeout(ceiling, init).await {
        Ok(Ok(analyzer)) => {
            info!(analyzer = analyzer.name(), "document analyzer ready");
            AnalyzerResolution::Ready(analyzer)
        }
        Ok(Err(e)) => {
            warn!(error = %e, "document analyzer failed to initialize, proceeding with pattern fallback");
            AnalyzerResolution::Unavailable {
                reason: e.to_string(),
            }
        }
        Err(_) => {
            warn!(ceiling_ms = ceiling.as_millis() as u64, "timed out waiting for document analyzer, proceeding with pattern fallback");
            AnalyzerResolution::Unavailable {
                reason: format!("not ready within {}ms", ceiling.as_millis()),
            }
        }
    }
}
