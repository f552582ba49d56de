use std::sync::{Mutex, MutexGuard, PoisonError};

use super::surface::ChatSurface;
use crate::kernel::event::{MessageHandle, Sender};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub handle: MessageHandle,
    pub sender: Sender,
    pub text: String,
}

#[derive(Debug, Default)]
struct Transcript {
    entries: Vec<TranscriptEntry>,
    busy_changes: Vec<bool>,
    progress: Vec<f32>,
    status: Option<String>,
}

/// In-memory surface for headless sessions and tests.
#[derive(Debug, Default)]
pub struct TranscriptSurface {
    inner: Mutex<Transcript>,
}

impl TranscriptSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Transcript> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.lock().entries.clone()
    }

    pub fn messages_from(&self, sender: Sender) -> Vec<String> {
        self.lock()
            .entries
            .iter()
            .filter(|e| e.sender == sender)
            .map(|e| e.text.clone())
            .collect()
    }

    pub fn last_bot_message(&self) -> Option<String> {
        self.lock()
            .entries
            .iter()
            .rev()
            .find(|e| e.sender == Sender::Bot)
            .map(|e| e.text.clone())
    }

    pub fn busy_changes(&self) -> Vec<bool> {
        self.lock().busy_changes.clone()
    }

    pub fn progress_updates(&self) -> Vec<f32> {
        self.lock().progress.clone()
    }

    pub fn status(&self) -> Option<String> {
        self.lock().status.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}

impl ChatSurface for TranscriptSurface {
    fn append_message(&self, sender: Sender, text: &str) -> MessageHandle {
        let handle = MessageHandle::new();
        self.lock().entries.push(TranscriptEntry {
            handle,
            sender,
            text: text.to_string(),
        });
        handle
    }

    fn update_message(&self, handle: MessageHandle, text: &str) {
        if let Some(entry) = self.lock().entries.iter_mut().find(|e| e.handle == handle) {
            entry.text = text.to_string();
        }
    }

    fn remove_message(&self, handle: MessageHandle) {
        self.lock().entries.retain(|e| e.handle != handle);
    }

    fn set_busy(&self, busy: bool) {
        self.lock().busy_changes.push(busy);
    }

    fn set_progress(&self, progress: f32) {
        self.lock().progress.push(progress);
    }

    fn set_status(&self, status: &str) {
        self.lock().status = Some(status.to_string());
    }
}
