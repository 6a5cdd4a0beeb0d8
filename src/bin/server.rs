//! Read-only HTTP server over a mirrored photo catalog.
//!
//! ## Usage
//!
//! ```bash
//! photomirror-server                      # Bind to server.bind from the config
//! photomirror-server --bind 0.0.0.0:8080  # Override the address
//! ```
//!
//! Run `photomirror sync` first; the server never writes to the database.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use photomirror::config::{Config, CONFIG_ENV};
use photomirror::db::Database;
use photomirror::logging;
use photomirror::serve::{router, AppState};

#[derive(Parser)]
#[command(name = "photomirror-server")]
#[command(version, about = "Browse a mirrored photo catalog over HTTP", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Database path (overrides the config file)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Address to listen on (overrides server.bind)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_console()?;

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(db) = args.db {
        config.db_path = db;
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    let db = Database::open(&config.db_path)?;
    db.initialize()?;
    info!(path = %config.db_path.display(), "Database opened");

    let app = router(AppState::new(db, &config));

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
