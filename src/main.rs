//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `geo_gate` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Wiring the gate in front of the upstream forwarder
//! - Signal handling and shutdown
//!
//! All core functionality is implemented in the library crate.

use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use geo_gate::app::{print_final_statistics, shutdown_gracefully, spawn_stats_logger};
use geo_gate::config::STATS_LOGGING_INTERVAL_SECS;
use geo_gate::initialization::init_logger_with;
use geo_gate::upstream::{forward, Upstream};
use geo_gate::{
    serve_with_hijack, start_status_server, with_geo_gate, GateConfig, GeoGate, Opt, StatusState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();

    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    if let Err(e) = run(opt).await {
        eprintln!("geo_gate error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn run(opt: Opt) -> Result<()> {
    let start_time = Instant::now();

    let config = GateConfig::from_json_file(&opt.config)
        .with_context(|| format!("Failed to read gate config {}", opt.config.display()))?;
    let gate = Arc::new(GeoGate::new(config).context("Failed to build geo gate")?);
    let upstream = Upstream::new(&opt.upstream)?;

    let app = with_geo_gate(
        Router::new().fallback(forward).with_state(upstream),
        Arc::clone(&gate),
    );

    let listener = tokio::net::TcpListener::bind(opt.listen)
        .await
        .with_context(|| format!("Failed to bind {}", opt.listen))?;

    if let Some(port) = opt.status_port {
        let state = StatusState::new(Arc::clone(&gate));
        tokio::spawn(async move {
            if let Err(e) = start_status_server(port, state).await {
                log::error!("Status server error: {:#}", e);
            }
        });
    }

    let cancel = CancellationToken::new();
    let stats_task = spawn_stats_logger(
        gate.shared_stats(),
        Duration::from_secs(STATS_LOGGING_INTERVAL_SECS),
        cancel.clone(),
    );
    spawn_signal_handler(cancel.clone());

    let served = serve_with_hijack(listener, app, cancel.clone()).await;

    shutdown_gracefully(cancel, Some(stats_task), &gate).await;
    print_final_statistics(gate.stats(), start_time);

    served.with_context(|| format!("Server on {} failed", opt.listen))
}

fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Received Ctrl-C, shutting down");
                cancel.cancel();
            }
            Err(e) => log::warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });
}
