//! Analytics engine for taskpulse
//!
//! Three layers compose into the request-facing facade:
//! - [`aggregate`]: pure statistical views over fetched rows
//! - [`insights`]: the fixed heuristic rule list
//! - [`service`]: the facade that fans out store reads, applies timeouts,
//!   and joins views into a [`crate::types::TaskAnalytics`]

pub mod aggregate;
pub mod insights;
pub mod service;

pub use insights::{AnalyticsSnapshot, InsightGenerator, InsightRule};
pub use service::{AnalyticsService, DEFAULT_QUERY_TIMEOUT};
