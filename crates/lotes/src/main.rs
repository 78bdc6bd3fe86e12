mod app;
mod backup;
mod config;
mod handlers;
mod import;
mod pdf;
mod state;
mod storage;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use listenfd::ListenFd;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{app::create_app, config::Config, state::AppState};

/// Lotes - Dashboard for livestock-auction batches
#[derive(Parser, Debug)]
#[command(name = "lotes")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Interface to bind
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3000", env = "PORT")]
    port: u16,

    /// SQLite database file
    #[arg(long, default_value = "dados.db", env = "LOTES_DATABASE")]
    database: PathBuf,

    /// Directory holding local backups
    #[arg(long, default_value = "backups", env = "LOTES_BACKUPS_DIR")]
    backups_dir: PathBuf,

    /// Largest accepted upload, in megabytes
    #[arg(long, default_value = "50", env = "LOTES_MAX_UPLOAD_MB")]
    max_upload_mb: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lotes=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config =
        Config::new(cli.database, cli.backups_dir).with_max_upload_mb(cli.max_upload_mb);
    tracing::info!(
        database = %config.database.display(),
        backups = %config.backups_dir.display(),
        max_upload_mb = config.max_upload_mb,
        "starting"
    );

    let state = AppState::open(config).await?;

    let app = create_app(state);

    // Socket handed over by systemfd/cargo-watch, if any.
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        None => {
            let addr = format!("{}:{}", cli.host, cli.port);
            TcpListener::bind(&addr).await?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on the first Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("ctrl-c received, draining requests");
        }
        _ = terminate => {
            tracing::info!("SIGTERM received, draining requests");
        }
    }
}
