//! # Flightlog Viewer
//!
//! Turn UAV telemetry logs into per-vehicle tracks and serve them to a
//! browser viewer.
//!
//! # Usage
//!
//! Convert a raw log into the intermediate artifact:
//! ```bash
//! flightlog-viewer organize --input 02.09.2025-08.17.txt --output cleaned_data.json
//! ```
//!
//! Serve the artifact (or a raw log directly) to the viewer:
//! ```bash
//! flightlog-viewer serve
//! flightlog-viewer serve --from-log 02.09.2025-08.17.txt --port 8080
//! ```
//!
//! Expected output:
//! ```text
//! INFO flightlog_viewer::ingest: Processing 18234 entries...
//! INFO flightlog_viewer::ingest: Data loaded. Found 14 unique IDs.
//! INFO flightlog_viewer::server: Serving at http://127.0.0.1:9999
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use flightlog_viewer::config::Config;
use flightlog_viewer::ingest::{organize, DataSource};
use flightlog_viewer::service::QueryService;
use flightlog_viewer::{logging, server};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a raw log into the JSON artifact
    Organize {
        /// Raw log file [default: data.log_path]
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Artifact to write [default: data.artifact_path]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load telemetry and serve the viewer
    Serve {
        /// Decode this raw log instead of reading the artifact
        #[arg(long)]
        from_log: Option<PathBuf>,

        /// Listen port [default: server.port]
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let _log_guard = logging::init(&config.logging);
    info!("Flightlog Viewer v{} starting...", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Organize { input, output } => {
            let input = input.unwrap_or(config.data.log_path);
            let output = output.unwrap_or(config.data.artifact_path);
            organize(&input, &output)
                .with_context(|| format!("failed to organize {}", input.display()))?;
        }
        Command::Serve { from_log, port } => {
            if let Some(port) = port {
                config.server.port = port;
                config.validate()?;
            }
            let source = match from_log {
                Some(path) => DataSource::Log(path),
                None => DataSource::Artifact(config.data.artifact_path.clone()),
            };
            serve(&config, source).await?;
        }
    }

    Ok(())
}

/// Ingest `source`, then serve it until Ctrl+C
async fn serve(config: &Config, source: DataSource) -> Result<()> {
    info!("Loading data from {}... this may take a moment.", source);
    let loader = source.clone();
    let store = tokio::task::spawn_blocking(move || loader.load())
        .await
        .context("ingestion task failed")?
        .with_context(|| format!("failed to load {}", source))?;

    let service = QueryService::new(store);
    spawn_reload_on_hangup(service.clone(), source);

    let app = server::router(service, &config.server.public_dir);
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;

    server::run(listener, app, shutdown_signal()).await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down...");
}

/// Rebuild and swap the store whenever the process receives SIGHUP
#[cfg(unix)]
fn spawn_reload_on_hangup(service: QueryService, source: DataSource) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(e) => {
            error!("Reload on SIGHUP disabled: {}", e);
            return;
        }
    };

    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!("Received SIGHUP, reloading {}", source);
            let service = service.clone();
            let source = source.clone();
            let result = tokio::task::spawn_blocking(move || service.reload_from(&source)).await;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Reload failed, keeping current data: {}", e),
                Err(e) => error!("Reload task failed: {}", e),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_on_hangup(_service: QueryService, _source: DataSource) {}
