//! Error types for taskpulse-core

use thiserror::Error;

/// The aggregation view that a failure originated from.
///
/// Carried on aggregation errors so callers (and logs) can tell which of
/// the five independent reads failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsView {
    CompletionStats,
    PeakHours,
    CognitiveLoad,
    ContextSwitching,
    EnergyPatterns,
}

impl AnalyticsView {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsView::CompletionStats => "completion_stats",
            AnalyticsView::PeakHours => "peak_hours",
            AnalyticsView::CognitiveLoad => "cognitive_load",
            AnalyticsView::ContextSwitching => "context_switching",
            AnalyticsView::EnergyPatterns => "energy_patterns",
        }
    }
}

impl std::fmt::Display for AnalyticsView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the taskpulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A background aggregation task died before producing a result
    #[error("aggregation task failed: {0}")]
    Task(String),

    /// An aggregation view failed; wraps the underlying store error
    #[error("aggregation failed in view {view}: {source}")]
    Aggregation {
        view: AnalyticsView,
        #[source]
        source: Box<Error>,
    },

    /// An aggregation view exceeded the per-query timeout
    #[error("aggregation timed out in view {view} after {timeout_ms}ms")]
    Timeout { view: AnalyticsView, timeout_ms: u64 },
}

impl Error {
    /// Wrap a store-level error with the aggregation view it came from.
    pub fn in_view(view: AnalyticsView, source: Error) -> Self {
        Error::Aggregation {
            view,
            source: Box::new(source),
        }
    }
}

/// Result type alias for taskpulse-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation_error_names_view() {
        let inner = Error::Config("store gone".to_string());
        let err = Error::in_view(AnalyticsView::PeakHours, inner);
        assert!(err.to_string().contains("peak_hours"));
    }

    #[test]
    fn test_timeout_error_is_distinct() {
        let err = Error::Timeout {
            view: AnalyticsView::EnergyPatterns,
            timeout_ms: 5000,
        };
        assert!(err.to_string().contains("timed out"));
        assert!(err.to_string().contains("energy_patterns"));
    }
}
