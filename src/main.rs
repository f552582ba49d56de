use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use jokebot::backend::BackendState;
use jokebot::kernel::session::ModelRegistry;
use jokebot::kernel::ChatSession;
use jokebot::outputs::ConsoleSurface;
use jokebot::{app, logging, JokeBotConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = JokeBotConfig::from_env().context("invalid configuration")?;
    logging::init(&config.logging.level)?;
    tracing::info!(model = %config.model.default_model, backend = ?config.model.backend, "JokeBot booting");

    let session = ChatSession::start(
        app::init_analyzer(config.nlp.engine),
        config.nlp.wait_ceiling,
        app::backend_from_config(&config),
        Arc::new(ConsoleSurface::new()),
        ModelRegistry::from(&config),
    )
    .await;

    println!("Commands: /models, /model <id>, /quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line.split_once(' ').map_or((line, ""), |(cmd, rest)| (cmd, rest.trim())) {
            ("/quit", _) => break,
            ("/models", _) => {
                let current = session.backend().state();
                for model in &session.registry().available {
                    let marker = match &current {
                        BackendState::Ready { model_id, .. } if model_id == model => "*",
                        _ => " ",
                    };
                    println!(" {} {}", marker, model);
                }
            }
            ("/model", "") => println!("usage: /model <id>"),
            ("/model", id) => {
                // Failures are already reported in the chat.
                let _ = session.switch_model(id).await;
            }
            _ => {
                session.submit(line).await;
            }
        }
    }

    let stats = session.telemetry();
    tracing::info!(
        submissions = stats.submissions.total,
        generated = stats.jokes.generated,
        fallback = stats.jokes.fallbacks(),
        "session ended"
    );
    Ok(())
}
