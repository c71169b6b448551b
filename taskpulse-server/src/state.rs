//! Shared application state for request handlers.

use std::sync::Arc;
use std::time::Duration;
use taskpulse_core::{AnalyticsService, Database};

/// State handed to every handler: the analytics facade over the store.
#[derive(Clone)]
pub struct AppState {
    pub service: AnalyticsService<Database>,
}

impl AppState {
    /// Build state over an opened database with a per-query timeout.
    pub fn new(db: Database, query_timeout: Duration) -> Self {
        Self {
            service: AnalyticsService::with_timeout(Arc::new(db), query_timeout),
        }
    }
}
