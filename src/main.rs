//! Duel Arena Server
//!
//! Matchmaking, input relay and leaderboard for two-player duels.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use duel_arena::{GameServer, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ServerConfig::from_env();
    info!("Duel Arena Server v{}", VERSION);
    info!("Max connections: {}", config.max_connections);

    let server = Arc::new(GameServer::new(config));

    let runner = server.clone();
    let mut handle = tokio::spawn(async move { runner.run().await });

    tokio::select! {
        result = &mut handle => {
            result??;
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutting down");
        }
    }

    server.shutdown();
    let _ = handle.await;

    // Give connection tasks a moment to send their close frames.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while server.connection_count() > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    Ok(())
}
