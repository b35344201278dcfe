#![forbid(unsafe_code)]

//! `greenevent` — human-in-the-loop event planning coordinator binary.
//!
//! Bootstraps configuration, the in-memory stores, the background
//! expiry sweeper, and the HTTP JSON API.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use greenevent::api::{self, AppState};
use greenevent::config::GlobalConfig;
use greenevent::gate::{self, ApprovalGate};
use greenevent::proposer::EmissionsAuditor;
use greenevent::sources;
use greenevent::store::SessionStore;
use greenevent::workflow::{MockBookingExecutor, Planner};
use greenevent::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "greenevent", about = "Event planning approval coordinator", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the configured HTTP port.
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("greenevent coordinator bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match args.config {
        Some(path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };
    if let Some(port) = args.port {
        config.http_port = port;
    }
    let config = Arc::new(config);
    info!(port = config.http_port, "configuration loaded");

    // ── Build shared application state ──────────────────
    let store = Arc::new(SessionStore::new());
    let gate = Arc::new(ApprovalGate::new(
        Arc::clone(&store),
        config.timeouts.approval_ttl(),
    ));
    let registry = Arc::new(sources::default_registry());
    let planner = Arc::new(Planner::new(
        Arc::clone(&config),
        Arc::clone(&store),
        Arc::clone(&gate),
        registry,
        Arc::new(EmissionsAuditor),
        Arc::new(MockBookingExecutor),
    ));

    let state = AppState {
        config: Arc::clone(&config),
        store,
        gate: Arc::clone(&gate),
        planner,
    };

    // ── Start expiry sweeper ────────────────────────────
    let ct = CancellationToken::new();
    let sweeper = gate::spawn_expiry_task(
        gate,
        Duration::from_secs(config.timeouts.sweep_seconds),
        ct.clone(),
    );
    info!("expiry sweeper started");

    // ── Serve HTTP API ──────────────────────────────────
    let router = api::router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port)).await?;
    info!(port = config.http_port, "coordinator ready");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("shutdown signal received");
    ct.cancel();

    let _ = sweeper.await;
    info!("greenevent coordinator shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
