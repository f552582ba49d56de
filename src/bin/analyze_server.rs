use std::sync::Arc;

use anyhow::Context;
use jokebot::config::JokeBotConfig;
use jokebot::intent::LexiconAnalyzer;
use jokebot::{logging, services};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = JokeBotConfig::from_env().context("invalid configuration")?;
    logging::init(&config.logging.level)?;

    services::analyze::serve(&config, Arc::new(LexiconAnalyzer::new())).await
}
