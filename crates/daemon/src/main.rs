// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use anyhow::Result;
use clap::Parser;
use strata_daemon::cli::Cli;
use strata_daemon::{http, orchestrator};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    let cli = Cli::parse();
    let listen_address = cli.listen_address.clone();

    let state = orchestrator::build(&cli).await?;
    let num_clusters = state.trackers.len();
    let app = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_address).await?;
    info!(address = %listen_address, clusters = num_clusters, "strata-daemon listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("strata-daemon stopped");
    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}

// Installing a Unix signal handler only fails if the runtime's signal
// infrastructure itself failed to initialize, which a process this early in
// startup can't recover from anyway.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }
}
