use crate::kernel::event::{MessageHandle, Sender};

/// Rendering side of a chat session: message list, input lock, progress
/// bar and status indicator. Calls arrive from the session and from the
/// background model load.
pub trait ChatSurface: Send + Sync {
    fn append_message(&self, sender: Sender, text: &str) -> MessageHandle;

    /// Rewrites a message in place. Unknown handles are ignored.
    fn update_message(&self, handle: MessageHandle, text: &str);

    fn remove_message(&self, handle: MessageHandle);

    /// Busy for the duration of one submission or switch.
    fn set_busy(&self, busy: bool);

    /// Fractional load progress in 0.0..=1.0.
    fn set_progress(&self, progress: f32);

    fn set_status(&self, status: &str);
}
