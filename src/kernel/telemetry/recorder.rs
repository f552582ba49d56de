use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use super::event::TelemetryEvent;
use super::metrics::{compute_snapshot, TelemetrySnapshot};

const MAX_EVENTS: usize = 10_000;

/// Recorder shared between the dispatcher and the background model load.
pub type SharedRecorder = Arc<Mutex<TelemetryRecorder>>;

#[derive(Debug)]
pub struct TelemetryRecorder {
    buffer: VecDeque<TelemetryEvent>,
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(MAX_EVENTS),
        }
    }

    pub fn shared() -> SharedRecorder {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn record(&mut self, event: TelemetryEvent) {
        if self.buffer.len() >= MAX_EVENTS {
            self.buffer.pop_front();
        }
        self.buffer.push_back(event);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        compute_snapshot(&self.buffer)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Records into a shared recorder. A poisoned lock still records.
pub fn record(shared: &SharedRecorder, event: TelemetryEvent) {
    shared.lock().unwrap_or_else(PoisonError::into_inner).record(event);
}

pub fn snapshot(shared: &SharedRecorder) -> TelemetrySnapshot {
    shared.lock().unwrap_or_else(PoisonError::into_inner).snapshot()
}
