pub mod console;
pub mod surface;
pub mod transcript;

pub use console::ConsoleSurface;
pub use surface::ChatSurface;
pub use transcript::{TranscriptEntry, TranscriptSurface};
