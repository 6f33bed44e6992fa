//! Startup helpers for the recent-chats service.

use std::process::ExitCode;

use anyhow::Context;
use tracing::{info, warn};

use crate::conversations::{ChatConfig, ConversationFeed, ConversationMerger, WatchSink};
use crate::server::{self, AppState};

/// Run the service until Ctrl-C (used by the `recent-chats` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting recent chats v{}", env!("CARGO_PKG_VERSION"));

    let config = match ChatConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(serve(config)) {
        tracing::error!("Server error: {e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Wire the merger, the feed and the HTTP server together and run until
/// Ctrl-C.
///
/// # Errors
/// Returns an error if the configuration is rejected, the server fails, or
/// the feed task panics.
pub async fn serve(config: ChatConfig) -> anyhow::Result<()> {
    let (sink, snapshots) = WatchSink::channel();
    let merger = ConversationMerger::from_config(&config.merger, Box::new(sink))
        .context("invalid merger configuration")?;
    let local_user = merger.local_user().clone();
    info!(
        %local_user,
        pair_matching = %merger.pair_matching(),
        "Listening for conversations"
    );

    let (feed, handle) = ConversationFeed::new(merger, config.feed.channel_capacity)?;
    let feed_task = feed.spawn();

    let state = AppState::new(handle.clone(), snapshots, local_user);
    server::run_server_with_shutdown(state, config.server.port, shutdown_signal())
        .await
        .context("http server failed")?;

    handle.shutdown();
    let merger = feed_task.await.context("feed task panicked")?;
    info!(entries = merger.len(), "Recent chats stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
