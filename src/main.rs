//! Hangman Game Server
//!
//! Loads the word lists and serves games over WebSocket until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use hangman::{
    MAX_LIVES, VERSION,
    game::words::WordSource,
    network::server::{GameServer, ServerConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Hangman Server v{}", VERSION);
    info!("Lives per answer: {}", MAX_LIVES);

    let config = ServerConfig::from_env()?;
    info!("Guess time limit: {} seconds", config.guess_time_limit);

    let words = Arc::new(WordSource::from_dir(&config.words_dir));
    words
        .preload()
        .with_context(|| format!("Failed to load word lists from {}", config.words_dir.display()))?;

    let server = Arc::new(GameServer::new(config, words));

    let signal_server = server.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                signal_server.shutdown();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    server.run().await?;

    info!("Server stopped");
    Ok(())
}
