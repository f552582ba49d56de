pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod intent;
pub mod jokes;
pub mod kernel;
pub mod logging;
pub mod outputs;
pub mod services;

pub use backend::GenerationBackend;
pub use config::JokeBotConfig;
pub use intent::IntentClassifier;
pub use kernel::{ChatSession, Dispatcher, Reply};
