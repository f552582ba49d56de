use futures_util::StreamExt;
use tracing::warn;

use super::engine::FragmentStream;
use crate::error::EngineError;

/// Consumes fragments until the stream completes, appending strictly in
/// arrival order. Stops early after `max_fragments` and keeps what arrived.
pub async fn accumulate(
    mut fragments: FragmentStream,
    max_fragments: usize,
) -> Result<String, EngineError> {
    let mut text = String::new();
    let mut received = 0usize;

    while let Some(fragment) = fragments.next().await {
        text.push_str(&fragment?);
        received += 1;
        if received >= max_fragments {
            warn!(max_fragments, "fragment limit reached, truncating generation");
            break;
        }
    }

    Ok(text)
}

/// Trims the accumulated output; `None` when nothing usable remains.
pub fn finalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
