//! `sp108e-table` binary: one-shot CLI commands or the HTTP control server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sp108e_table::{Cli, Sp108e, TableController, http};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.link_config();
    let address = config.address();

    let link = Sp108e::connect(config)
        .await
        .with_context(|| format!("failed to connect to SP108E at {address}"))?;
    let controller = Arc::new(TableController::new(link));

    if let Some(interval) = cli.reconnect_interval().filter(|_| cli.keeps_running()) {
        tokio::spawn(periodic_reconnect(Arc::clone(&controller), interval));
    }

    if cli.server {
        http::serve(controller, cli.listen, shutdown_signal()).await.context("HTTP server failed")?;
        return Ok(());
    }

    if let Some(value) = cli.brightness {
        if let Err(e) = controller.set_brightness(value).await {
            warn!("Setting brightness failed: {e}");
        }
    }

    let started = if let Some(colors) = cli.table_colors() {
        Some(controller.start_table_colors(colors, None).await)
    } else if let Some(colormap) = cli.colormap.as_deref() {
        Some(controller.start_colormap(colormap, None).await)
    } else {
        None
    };
    match started {
        Some(Ok(())) => {
            info!("Running, press Ctrl-C to exit");
            shutdown_signal().await;
            controller.stop().await;
        }
        Some(Err(e)) => error!("Starting the table failed: {e}"),
        None => {}
    }
    Ok(())
}

async fn periodic_reconnect(controller: Arc<TableController>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; the link was just dialed.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        info!("Periodic reconnect");
        if let Err(e) = controller.reconnect().await {
            warn!("Periodic reconnect failed: {e}");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
