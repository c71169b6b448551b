//! Heuristic insight generation.
//!
//! Rules consume a snapshot of day/week/month analytics and each emit at
//! most one templated, confidence-scored insight. The rule list is fixed
//! and evaluated in registration order; the output list order is that rule
//! order, regardless of how the underlying aggregates were fetched. Rules
//! are independently guarded: one failing rule logs a warning and never
//! suppresses the others.

use crate::error::Result;
use crate::types::{InsightKind, ProductivityInsight, TaskAnalytics};

/// Day/week/month aggregates for one user, the input to rule evaluation.
#[derive(Debug, Clone)]
pub struct AnalyticsSnapshot {
    pub day: TaskAnalytics,
    pub week: TaskAnalytics,
    pub month: TaskAnalytics,
}

/// A single heuristic rule.
///
/// Rules are stateless and deterministic: the same snapshot always yields
/// the same insight (or none).
pub trait InsightRule: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Evaluate the rule, returning `None` when the qualifying data is
    /// absent or below threshold.
    fn evaluate(&self, snapshot: &AnalyticsSnapshot) -> Result<Option<ProductivityInsight>>;
}

/// Evaluates the fixed rule list against a snapshot.
pub struct InsightGenerator {
    rules: Vec<Box<dyn InsightRule>>,
}

impl InsightGenerator {
    /// Generator with the built-in rules in their fixed order.
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(CompletionRateTrend),
                Box::new(PeakHoursRule),
                Box::new(CognitiveLoadSkew),
                Box::new(ContextSwitchingRule),
                Box::new(EnergyDips),
            ],
        }
    }

    /// Registered rule names, in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule against the snapshot.
    pub fn generate(&self, snapshot: &AnalyticsSnapshot) -> Vec<ProductivityInsight> {
        let mut insights = Vec::new();
        for rule in &self.rules {
            match rule.evaluate(snapshot) {
                Ok(Some(insight)) => insights.push(insight),
                Ok(None) => {}
                Err(e) => {
                    // Rule failures are isolated, the rest still run
                    tracing::warn!(rule = rule.name(), error = %e, "Insight rule failed");
                }
            }
        }
        insights
    }
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Format hours as "9:00, 14:00".
fn format_hours(hours: &[u8]) -> String {
    hours
        .iter()
        .map(|h| format!("{}:00", h))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================
// Rule 1: weekly completion-rate trend
// ============================================

/// High (> 0.7) or low (< 0.3) weekly completion rate. The thresholds are
/// mutually exclusive so at most one of the two insights can fire.
struct CompletionRateTrend;

impl InsightRule for CompletionRateTrend {
    fn name(&self) -> &'static str {
        "completion_rate_trend"
    }

    fn evaluate(&self, snapshot: &AnalyticsSnapshot) -> Result<Option<ProductivityInsight>> {
        let Some(rate) = snapshot.week.completion_rate else {
            return Ok(None);
        };

        if rate > 0.7 {
            Ok(Some(ProductivityInsight {
                kind: InsightKind::Success,
                title: "High Task Completion Rate".to_string(),
                description: "You're completing over 70% of your tasks this week. \
                              Great job staying productive!"
                    .to_string(),
                confidence: 0.9,
                actionable: false,
                suggested_action: None,
            }))
        } else if rate < 0.3 {
            Ok(Some(ProductivityInsight {
                kind: InsightKind::Challenge,
                title: "Low Task Completion Rate".to_string(),
                description: "You're completing less than 30% of your tasks this week. \
                              Consider breaking down tasks into smaller, more manageable pieces."
                    .to_string(),
                confidence: 0.85,
                actionable: true,
                suggested_action: Some(
                    "Break down your next task into smaller subtasks".to_string(),
                ),
            }))
        } else {
            Ok(None)
        }
    }
}

// ============================================
// Rule 2: daily peak hours
// ============================================

/// Hours whose productivity, normalized against the day's best hour,
/// exceeds 0.7. The raw productivity ranking is open-ended (completions ×
/// weight), so the comparison only makes sense after normalization.
struct PeakHoursRule;

impl InsightRule for PeakHoursRule {
    fn name(&self) -> &'static str {
        "peak_hours"
    }

    fn evaluate(&self, snapshot: &AnalyticsSnapshot) -> Result<Option<ProductivityInsight>> {
        let peaks = &snapshot.day.peak_performance_hours;
        let Some(max) = peaks
            .iter()
            .map(|h| h.productivity)
            .fold(None::<f64>, |acc, p| Some(acc.map_or(p, |m| m.max(p))))
        else {
            return Ok(None);
        };
        if max <= 0.0 {
            return Ok(None);
        }

        let optimal: Vec<u8> = peaks
            .iter()
            .filter(|h| h.productivity / max > 0.7)
            .map(|h| h.hour)
            .collect();

        if optimal.is_empty() {
            return Ok(None);
        }

        let formatted = format_hours(&optimal);
        Ok(Some(ProductivityInsight {
            kind: InsightKind::Pattern,
            title: "Peak Performance Hours".to_string(),
            description: format!(
                "You tend to be most productive at {}. \
                 Consider scheduling important tasks during these times.",
                formatted
            ),
            confidence: 0.8,
            actionable: true,
            suggested_action: Some(
                "Schedule your next important task during your peak hours".to_string(),
            ),
        }))
    }
}

// ============================================
// Rule 3: monthly cognitive-load skew
// ============================================

/// More than 60% of the month's tasks at high cognitive load.
struct CognitiveLoadSkew;

impl InsightRule for CognitiveLoadSkew {
    fn name(&self) -> &'static str {
        "cognitive_load_skew"
    }

    fn evaluate(&self, snapshot: &AnalyticsSnapshot) -> Result<Option<ProductivityInsight>> {
        let high_share = snapshot
            .month
            .cognitive_load_distribution
            .iter()
            .find(|share| share.load == crate::types::CognitiveLoad::High);

        match high_share {
            Some(share) if share.percentage > 60.0 => Ok(Some(ProductivityInsight {
                kind: InsightKind::Challenge,
                title: "High Cognitive Load".to_string(),
                description: "Most of your tasks require high mental effort. \
                              Consider mixing in some lighter tasks to maintain energy levels."
                    .to_string(),
                confidence: 0.75,
                actionable: true,
                suggested_action: Some("Add some low-effort tasks to your schedule".to_string()),
            })),
            _ => Ok(None),
        }
    }
}

// ============================================
// Rule 4: monthly context switching
// ============================================

/// Any context transition occurring strictly more than 5 times this month.
struct ContextSwitchingRule;

impl InsightRule for ContextSwitchingRule {
    fn name(&self) -> &'static str {
        "context_switching"
    }

    fn evaluate(&self, snapshot: &AnalyticsSnapshot) -> Result<Option<ProductivityInsight>> {
        let frequent = snapshot
            .month
            .context_switching_patterns
            .iter()
            .any(|pattern| pattern.frequency > 5);

        if !frequent {
            return Ok(None);
        }

        Ok(Some(ProductivityInsight {
            kind: InsightKind::Pattern,
            title: "Frequent Context Switching".to_string(),
            description: "You often switch between different types of tasks. \
                          Try batching similar tasks together to reduce mental overhead."
                .to_string(),
            confidence: 0.7,
            actionable: true,
            suggested_action: Some("Group similar tasks together in your schedule".to_string()),
        }))
    }
}

// ============================================
// Rule 5: daily energy dips
// ============================================

/// Hours whose mean normalized energy level sits below 0.3.
struct EnergyDips;

impl InsightRule for EnergyDips {
    fn name(&self) -> &'static str {
        "energy_dips"
    }

    fn evaluate(&self, snapshot: &AnalyticsSnapshot) -> Result<Option<ProductivityInsight>> {
        let low_hours: Vec<u8> = snapshot
            .day
            .energy_patterns
            .iter()
            .filter(|pattern| pattern.level < 0.3)
            .map(|pattern| pattern.hour)
            .collect();

        if low_hours.is_empty() {
            return Ok(None);
        }

        let formatted = format_hours(&low_hours);
        Ok(Some(ProductivityInsight {
            kind: InsightKind::Pattern,
            title: "Energy Dips".to_string(),
            description: format!(
                "You tend to have lower energy levels around {}. \
                 Consider scheduling breaks or lighter tasks during these times.",
                formatted
            ),
            confidence: 0.8,
            actionable: true,
            suggested_action: Some(
                "Schedule breaks during your typical low-energy periods".to_string(),
            ),
        }))
    }
}
