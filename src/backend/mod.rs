pub mod engine;
pub mod fallback;
pub mod generator;
pub mod state;
pub mod stream;

pub use engine::{ChatMessage, ChatRequest, DisabledEngine, FragmentStream, LoadOptions, ModelEngine, ProgressCallback, Role};
pub use fallback::{FallbackPolicy, FallbackReason, JokeReply, JokeSource};
pub use generator::{GenerationBackend, GenerationOptions};
pub use state::BackendState;
