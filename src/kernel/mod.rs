pub mod dispatcher;
pub mod event;
pub mod session;
pub mod telemetry;

pub use dispatcher::{Dispatcher, Reply, GUIDANCE_MESSAGE};
pub use event::{MessageHandle, Sender};
pub use session::{ChatSession, ModelRegistry};
