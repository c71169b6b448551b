//! # taskpulse-core
//!
//! Core library for taskpulse - a productivity analytics engine over task
//! and energy event logs.
//!
//! This library provides:
//! - Domain types for tasks, energy self-reports, and computed analytics
//! - SQLite event store with the read-only query interface the engine uses
//! - Aggregation views (completion stats, peak hours, cognitive load,
//!   context switching, energy patterns)
//! - Heuristic, confidence-scored insight generation
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Data flows in one direction per request:
//! - **Store:** persisted task/energy rows, read-only from this crate's
//!   analytics side
//! - **Aggregator:** five independent statistical views over one window
//! - **Insights:** fixed rules over day/week/month aggregates
//!
//! Nothing computed here is persisted; every request builds a fresh
//! result from store state.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskpulse_core::{AnalyticsService, Config, Database, TimeRange};
//!
//! # async fn demo() -> taskpulse_core::Result<()> {
//! let db = Database::open(&Config::database_path())?;
//! db.migrate()?;
//!
//! let service = AnalyticsService::new(Arc::new(db));
//! let analytics = service.get_task_analytics("user-1", TimeRange::Week).await?;
//! let insights = service.generate_insights("user-1").await?;
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{AnalyticsService, InsightGenerator};
pub use config::Config;
pub use db::{Database, EventStore};
pub use error::{AnalyticsView, Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod types;
