//! Core domain types for taskpulse
//!
//! These types cover the two persisted record kinds (tasks and energy
//! self-reports) and the ephemeral analytics structures computed from them.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Task** | A unit of work with a lifecycle (todo → in_progress → completed) |
//! | **Cognitive load** | Self-reported mental-effort tier of a task (low/medium/high) |
//! | **Context** | A task's category/domain tag, used to detect switching overhead |
//! | **Energy record** | A point-in-time self-reported energy level, not an interval |
//! | **Peak hour** | An hour-of-day with above-threshold weighted completion activity |
//! | **Insight** | A templated, confidence-scored observation derived from analytics |
//!
//! All analytics are computed in UTC so results do not depend on the host
//! timezone.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Task status
// ============================================

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Returns the identifier used in database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(format!("unknown task status: {}", s)),
        }
    }
}

// ============================================
// Cognitive load
// ============================================

/// Mental-effort tier of a task.
///
/// The complexity weight feeds the peak-hour productivity ranking:
/// completing a high-load task counts three times as much as a low-load one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CognitiveLoad {
    Low,
    Medium,
    High,
}

impl CognitiveLoad {
    /// Complexity weight used in productivity scoring
    pub fn weight(&self) -> f64 {
        match self {
            CognitiveLoad::Low => 1.0,
            CognitiveLoad::Medium => 2.0,
            CognitiveLoad::High => 3.0,
        }
    }

    /// Returns the identifier used in database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            CognitiveLoad::Low => "low",
            CognitiveLoad::Medium => "medium",
            CognitiveLoad::High => "high",
        }
    }
}

impl std::fmt::Display for CognitiveLoad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CognitiveLoad {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(CognitiveLoad::Low),
            "medium" => Ok(CognitiveLoad::Medium),
            "high" => Ok(CognitiveLoad::High),
            _ => Err(format!("unknown cognitive load: {}", s)),
        }
    }
}

// ============================================
// Records
// ============================================

/// A persisted task record.
///
/// Owned by the task-management side of the system; the analytics engine
/// only ever reads these within a time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique identifier
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Short human-readable title
    pub title: String,
    /// Lifecycle state
    pub status: TaskStatus,
    /// Mental-effort tier
    pub cognitive_load: CognitiveLoad,
    /// Category/domain tag (e.g. "work", "meeting")
    pub context: String,
    /// When the task was created
    pub created_at: DateTime<Utc>,
    /// When work on the task started
    pub started_at: Option<DateTime<Utc>>,
    /// When the task was completed
    pub completed_at: Option<DateTime<Utc>>,
    /// Optional deadline
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// Create a new todo task with a generated ID, created now.
    pub fn new(user_id: &str, title: &str, cognitive_load: CognitiveLoad, context: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            status: TaskStatus::Todo,
            cognitive_load,
            context: context.to_string(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            due_date: None,
        }
    }
}

/// A point-in-time self-reported energy level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyRecord {
    /// Owning user
    pub user_id: String,
    /// When the level was reported
    pub timestamp: DateTime<Utc>,
    /// Raw self-reported level, on either a 1-5 or a 0-100 scale
    pub level: f64,
}

impl EnergyRecord {
    /// Normalize the raw level to [0, 1].
    ///
    /// Sources report on two scales: 1-5 sliders and 0-100 percentages.
    /// Values in [0, 5] divide by 5, values in (5, 100] divide by 100.
    /// Anything else (negative, non-finite, > 100) is malformed and
    /// returns `None`; callers skip such records with a warning.
    pub fn normalized_level(&self) -> Option<f64> {
        if !self.level.is_finite() || self.level < 0.0 {
            return None;
        }
        if self.level <= 5.0 {
            Some(self.level / 5.0)
        } else if self.level <= 100.0 {
            Some(self.level / 100.0)
        } else {
            None
        }
    }
}

// ============================================
// Time ranges
// ============================================

/// Analytics lookback window, measured from the query's "now".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    /// Last 24 hours
    Day,
    /// Last 7 days (the default)
    #[default]
    Week,
    /// Last 30 days
    Month,
}

impl TimeRange {
    /// Deterministic range-to-interval mapping: day→24h, week→7d, month→30d.
    pub fn lookback(&self) -> Duration {
        match self {
            TimeRange::Day => Duration::hours(24),
            TimeRange::Week => Duration::days(7),
            TimeRange::Month => Duration::days(30),
        }
    }

    /// Window start for a query evaluated at `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.lookback()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Day => "day",
            TimeRange::Week => "week",
            TimeRange::Month => "month",
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(TimeRange::Day),
            "week" => Ok(TimeRange::Week),
            "month" => Ok(TimeRange::Month),
            _ => Err(format!("unknown time range: {}", s)),
        }
    }
}

// ============================================
// Computed analytics views
// ============================================

/// Completion rate and mean completion time over a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
    /// completed / total, in [0, 1]
    pub rate: f64,
    /// Mean of (completed_at - created_at) over completed tasks, in hours.
    /// Absent when the window has completed tasks but none with both stamps.
    pub average_time_hours: Option<f64>,
}

/// Weighted completion activity for one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyProductivity {
    /// Hour of day in UTC, 0-23
    pub hour: u8,
    /// completions(hour) × mean complexity weight(hour)
    pub productivity: f64,
}

/// Share of tasks at one cognitive-load tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadShare {
    pub load: CognitiveLoad,
    /// 0-100; shares across the window sum to 100 (± rounding)
    pub percentage: f64,
}

/// A recurring context transition and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSwitch {
    pub from: String,
    pub to: String,
    pub frequency: i64,
}

/// Mean normalized energy level for one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyPattern {
    /// Hour of day in UTC, 0-23
    pub hour: u8,
    /// Mean normalized level in [0, 1]
    pub level: f64,
}

/// One day of the performance time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePoint {
    /// UTC date, "YYYY-MM-DD"
    pub date: String,
    /// Completion rate of tasks created that day, in [0, 1]
    pub completion_rate: f64,
    /// Mean focus minutes of tasks completed that day, absent when none
    pub focus_time: Option<f64>,
    /// Weighted completion score for that day, 0-100
    pub productivity_score: f64,
}

/// Analytics for one (user, time range) pair.
///
/// Constructed fresh per request and never persisted. Optional fields are
/// absent (serialized as null) when the window held no qualifying data;
/// list fields are empty. There is deliberately no NaN anywhere in here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAnalytics {
    /// completed / total over the window, absent when no tasks
    pub completion_rate: Option<f64>,
    /// Mean completion time in hours
    pub average_completion_time: Option<f64>,
    /// Mean (completed_at - started_at) in minutes over completed tasks
    pub average_focus_time: Option<f64>,
    /// Weighted completion score, 0-100
    pub productivity_score: Option<f64>,
    /// Ranking of hours by weighted completion activity, descending.
    /// Only hours with at least one completed task appear.
    pub peak_performance_hours: Vec<HourlyProductivity>,
    /// Load shares ordered descending by percentage
    pub cognitive_load_distribution: Vec<LoadShare>,
    /// Top 10 context transitions, descending by frequency
    pub context_switching_patterns: Vec<ContextSwitch>,
    /// Mean normalized energy per hour, ordered by hour
    pub energy_patterns: Vec<EnergyPattern>,
    /// Per-day series over the window; days without tasks are omitted
    pub performance_data: Vec<PerformancePoint>,
}

// ============================================
// Insights
// ============================================

/// Category of a productivity insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Success,
    Challenge,
    Pattern,
    Suggestion,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::Success => "success",
            InsightKind::Challenge => "challenge",
            InsightKind::Pattern => "pattern",
            InsightKind::Suggestion => "suggestion",
        }
    }
}

/// A templated, confidence-scored observation derived from analytics.
///
/// Generated per request, never stored. Output ordering is the fixed
/// rule-evaluation order of the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityInsight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    /// Heuristic confidence in [0, 1]
    pub confidence: f64,
    /// Whether `suggested_action` is worth surfacing to the user
    pub actionable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_lookback() {
        assert_eq!(TimeRange::Day.lookback(), Duration::hours(24));
        assert_eq!(TimeRange::Week.lookback(), Duration::days(7));
        assert_eq!(TimeRange::Month.lookback(), Duration::days(30));
        assert_eq!(TimeRange::default(), TimeRange::Week);
    }

    #[test]
    fn test_time_range_round_trip() {
        for range in [TimeRange::Day, TimeRange::Week, TimeRange::Month] {
            assert_eq!(range.as_str().parse::<TimeRange>().unwrap(), range);
        }
        assert!("fortnight".parse::<TimeRange>().is_err());
    }

    #[test]
    fn test_cognitive_load_weights() {
        assert_eq!(CognitiveLoad::Low.weight(), 1.0);
        assert_eq!(CognitiveLoad::Medium.weight(), 2.0);
        assert_eq!(CognitiveLoad::High.weight(), 3.0);
    }

    #[test]
    fn test_energy_normalization_five_point_scale() {
        let record = EnergyRecord {
            user_id: "u1".to_string(),
            timestamp: Utc::now(),
            level: 4.0,
        };
        assert_eq!(record.normalized_level(), Some(0.8));
    }

    #[test]
    fn test_energy_normalization_percent_scale() {
        let record = EnergyRecord {
            user_id: "u1".to_string(),
            timestamp: Utc::now(),
            level: 80.0,
        };
        assert_eq!(record.normalized_level(), Some(0.8));
    }

    #[test]
    fn test_energy_normalization_rejects_out_of_scale() {
        for level in [-1.0, 250.0, f64::NAN, f64::INFINITY] {
            let record = EnergyRecord {
                user_id: "u1".to_string(),
                timestamp: Utc::now(),
                level,
            };
            assert_eq!(record.normalized_level(), None, "level {level} should be malformed");
        }
    }

    #[test]
    fn test_insight_serializes_type_field() {
        let insight = ProductivityInsight {
            kind: InsightKind::Pattern,
            title: "Peak Performance Hours".to_string(),
            description: "desc".to_string(),
            confidence: 0.8,
            actionable: true,
            suggested_action: None,
        };
        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["type"], "pattern");
        assert!(json.get("suggestedAction").is_none());
    }
}
