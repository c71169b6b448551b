//! taskpulse-server - HTTP API for productivity analytics
//!
//! Serves computed task analytics and insights over the event store.

mod error;
mod routes;
mod state;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use taskpulse_core::{Config, Database};

use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "taskpulse-server")]
#[command(about = "Productivity analytics over task and energy logs")]
#[command(version)]
struct Args {
    /// Bind address (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Database path (default: XDG data dir)
    #[arg(long)]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = taskpulse_core::logging::init(&config.logging).ok();

    let db_path = args.db.unwrap_or_else(Config::database_path);
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run migrations")?;

    let query_timeout = Duration::from_millis(config.analytics.query_timeout_ms);
    let app = routes::create_app(AppState::new(db, query_timeout));

    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(%addr, db = %db_path.display(), "taskpulse server listening");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
