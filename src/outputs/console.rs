use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use super::surface::ChatSurface;
use crate::backend::state::percent;
use crate::kernel::event::{MessageHandle, Sender};

/// Prints the conversation to stdout. Rewrites print as new lines; progress
/// is only printed when it crosses a 10% step.
#[derive(Debug, Default)]
pub struct ConsoleSurface {
    state: Mutex<ConsoleState>,
}

#[derive(Debug, Default)]
struct ConsoleState {
    senders: HashMap<MessageHandle, Sender>,
    last_decile: Option<u32>,
    status: String,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn print(sender: Sender, text: &str) {
        let prefix = match sender {
            Sender::User => "🧑 You",
            Sender::Bot => "🤖 JokeBot",
        };
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}: {}", prefix, text);
        let _ = out.flush();
    }
}

impl ChatSurface for ConsoleSurface {
    fn append_message(&self, sender: Sender, text: &str) -> MessageHandle {
        let handle = MessageHandle::new();
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .senders
            .insert(handle, sender);
        // User lines are already on screen from the prompt.
        if sender == Sender::Bot {
            Self::print(sender, text);
        }
        handle
    }

    fn update_message(&self, handle: MessageHandle, text: &str) {
        let sender = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .senders
            .get(&handle)
            .copied();
        if let Some(sender) = sender {
            if !text.ends_with('%') {
                Self::print(sender, text);
            }
        }
    }

    fn remove_message(&self, handle: MessageHandle) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .senders
            .remove(&handle);
    }

    fn set_busy(&self, _busy: bool) {}

    fn set_progress(&self, progress: f32) {
        let decile = percent(progress) / 10;
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.last_decile != Some(decile) {
            state.last_decile = Some(decile);
            drop(state);
            println!("   [model] {}%", decile * 10);
        }
    }

    fn set_status(&self, status: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.status != status {
            state.status = status.to_string();
            tracing::debug!(status, "status changed");
        }
    }
}
