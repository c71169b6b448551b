//! Statistical views over task and energy records.
//!
//! Each view is a pure function over rows fetched from the event store:
//! group-by with post-hoc normalization, no SQL window tricks. Every view
//! windows on its own timestamp column (creation for completion stats and
//! load distribution, completion for peak hours, start for context
//! switches), so callers pass the full activity slice plus the window
//! start and let the view filter.
//!
//! Numeric guard rails: an empty denominator always yields an absent or
//! empty result, never NaN and never a panic.

use crate::types::{
    CognitiveLoad, CompletionStats, ContextSwitch, EnergyPattern, EnergyRecord,
    HourlyProductivity, LoadShare, PerformancePoint, TaskRecord, TaskStatus,
};
use chrono::{DateTime, Timelike, Utc};
use std::collections::BTreeMap;

/// Maximum number of context-switch patterns reported.
const CONTEXT_SWITCH_LIMIT: usize = 10;

fn created_in_window<'a>(
    tasks: &'a [TaskRecord],
    since: DateTime<Utc>,
) -> impl Iterator<Item = &'a TaskRecord> {
    tasks.iter().filter(move |t| t.created_at >= since)
}

fn completed_in_window<'a>(
    tasks: &'a [TaskRecord],
    since: DateTime<Utc>,
) -> impl Iterator<Item = &'a TaskRecord> {
    tasks.iter().filter(move |t| {
        t.status == TaskStatus::Completed
            && t.completed_at.map(|ts| ts >= since).unwrap_or(false)
    })
}

/// Completion rate and mean completion time over tasks created in-window.
///
/// Returns `None` when the window has no tasks at all; a window with tasks
/// but no completions reports a rate of 0 with an absent average time.
pub fn completion_stats(tasks: &[TaskRecord], since: DateTime<Utc>) -> Option<CompletionStats> {
    let in_window: Vec<&TaskRecord> = created_in_window(tasks, since).collect();
    if in_window.is_empty() {
        return None;
    }

    let completed: Vec<&&TaskRecord> = in_window
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .collect();

    let rate = completed.len() as f64 / in_window.len() as f64;

    let completion_hours: Vec<f64> = completed
        .iter()
        .filter_map(|t| {
            t.completed_at
                .map(|done| (done - t.created_at).num_seconds() as f64 / 3600.0)
        })
        .collect();

    let average_time_hours = if completion_hours.is_empty() {
        None
    } else {
        Some(completion_hours.iter().sum::<f64>() / completion_hours.len() as f64)
    };

    Some(CompletionStats {
        rate,
        average_time_hours,
    })
}

/// Weighted completion activity ranked by hour of day.
///
/// Groups tasks completed in-window by UTC completion hour;
/// productivity(hour) = completions × mean complexity weight. Hours with
/// no completions are omitted rather than zero-filled, so quiet hours do
/// not read as troughs. Result is a ranking: descending by productivity,
/// ties broken by earlier hour.
pub fn peak_hours(tasks: &[TaskRecord], since: DateTime<Utc>) -> Vec<HourlyProductivity> {
    let mut by_hour: BTreeMap<u8, (i64, f64)> = BTreeMap::new();

    for task in completed_in_window(tasks, since) {
        let Some(completed_at) = task.completed_at else {
            continue;
        };
        let hour = completed_at.hour() as u8;
        let entry = by_hour.entry(hour).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += task.cognitive_load.weight();
    }

    let mut hours: Vec<HourlyProductivity> = by_hour
        .into_iter()
        .map(|(hour, (completions, weight_sum))| HourlyProductivity {
            hour,
            productivity: completions as f64 * (weight_sum / completions as f64),
        })
        .collect();

    hours.sort_by(|a, b| {
        b.productivity
            .partial_cmp(&a.productivity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.hour.cmp(&b.hour))
    });
    hours
}

/// Percentage share of each cognitive-load tier over tasks created in-window.
///
/// Shares sum to 100 (± float rounding). Empty window yields an empty
/// list. Descending by percentage, ties broken by heavier load first.
pub fn cognitive_load_distribution(tasks: &[TaskRecord], since: DateTime<Utc>) -> Vec<LoadShare> {
    let mut counts: BTreeMap<&'static str, (CognitiveLoad, i64)> = BTreeMap::new();
    let mut total: i64 = 0;

    for task in created_in_window(tasks, since) {
        total += 1;
        counts
            .entry(task.cognitive_load.as_str())
            .or_insert((task.cognitive_load, 0))
            .1 += 1;
    }

    if total == 0 {
        return Vec::new();
    }

    let mut shares: Vec<LoadShare> = counts
        .into_values()
        .map(|(load, count)| LoadShare {
            load,
            percentage: count as f64 * 100.0 / total as f64,
        })
        .collect();

    shares.sort_by(|a, b| {
        b.percentage
            .partial_cmp(&a.percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.load
                    .weight()
                    .partial_cmp(&a.load.weight())
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });
    shares
}

/// Top context transitions over tasks started in-window.
///
/// A switch is counted between every pair of tasks (t1, t2) where
/// t2 started strictly after t1 and the contexts differ. This is the
/// all-pairs adjacency count the stored queries have always used, not
/// sequential-neighbor counting; see DESIGN.md before changing it.
pub fn context_switches(tasks: &[TaskRecord], since: DateTime<Utc>) -> Vec<ContextSwitch> {
    let started: Vec<(&TaskRecord, DateTime<Utc>)> = tasks
        .iter()
        .filter_map(|t| t.started_at.map(|ts| (t, ts)))
        .filter(|(_, ts)| *ts >= since)
        .collect();

    let mut counts: BTreeMap<(String, String), i64> = BTreeMap::new();
    for (t1, ts1) in &started {
        for (t2, ts2) in &started {
            if ts2 > ts1 && t1.context != t2.context {
                *counts
                    .entry((t1.context.clone(), t2.context.clone()))
                    .or_insert(0) += 1;
            }
        }
    }

    let mut switches: Vec<ContextSwitch> = counts
        .into_iter()
        .map(|((from, to), frequency)| ContextSwitch {
            from,
            to,
            frequency,
        })
        .collect();

    switches.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| a.from.cmp(&b.from))
            .then_with(|| a.to.cmp(&b.to))
    });
    switches.truncate(CONTEXT_SWITCH_LIMIT);
    switches
}

/// Mean normalized energy level per UTC hour of day, ordered by hour.
///
/// Records that fail normalization (level outside both report scales)
/// are skipped with a warning and never abort the view.
pub fn energy_patterns(records: &[EnergyRecord], since: DateTime<Utc>) -> Vec<EnergyPattern> {
    let mut by_hour: BTreeMap<u8, (f64, i64)> = BTreeMap::new();

    for record in records.iter().filter(|r| r.timestamp >= since) {
        let Some(level) = record.normalized_level() else {
            tracing::warn!(
                user_id = %record.user_id,
                level = record.level,
                timestamp = %record.timestamp,
                "Skipping energy record outside expected scale"
            );
            continue;
        };
        let entry = by_hour.entry(record.timestamp.hour() as u8).or_insert((0.0, 0));
        entry.0 += level;
        entry.1 += 1;
    }

    by_hour
        .into_iter()
        .map(|(hour, (sum, count))| EnergyPattern {
            hour,
            level: sum / count as f64,
        })
        .collect()
}

/// Mean focus minutes (completed_at − started_at) over tasks completed
/// in-window that carry both timestamps.
pub fn average_focus_minutes(tasks: &[TaskRecord], since: DateTime<Utc>) -> Option<f64> {
    let minutes: Vec<f64> = completed_in_window(tasks, since)
        .filter_map(|t| match (t.started_at, t.completed_at) {
            (Some(start), Some(end)) if end >= start => {
                Some((end - start).num_seconds() as f64 / 60.0)
            }
            _ => None,
        })
        .collect();

    if minutes.is_empty() {
        None
    } else {
        Some(minutes.iter().sum::<f64>() / minutes.len() as f64)
    }
}

/// Weighted completion score over tasks created in-window, 0-100.
///
/// 100 × Σ weight(completed) / Σ weight(all), so finishing the heavy work
/// counts for more than clearing a backlog of low-load items.
pub fn productivity_score(tasks: &[TaskRecord], since: DateTime<Utc>) -> Option<f64> {
    let mut total_weight = 0.0;
    let mut completed_weight = 0.0;

    for task in created_in_window(tasks, since) {
        let weight = task.cognitive_load.weight();
        total_weight += weight;
        if task.status == TaskStatus::Completed {
            completed_weight += weight;
        }
    }

    if total_weight == 0.0 {
        None
    } else {
        Some(completed_weight * 100.0 / total_weight)
    }
}

/// Per-day performance series over tasks created in-window.
///
/// One point per UTC date that saw at least one task created; dates
/// without tasks are omitted. Ascending by date.
pub fn performance_data(tasks: &[TaskRecord], since: DateTime<Utc>) -> Vec<PerformancePoint> {
    let mut by_date: BTreeMap<String, Vec<&TaskRecord>> = BTreeMap::new();
    for task in created_in_window(tasks, since) {
        by_date
            .entry(task.created_at.date_naive().to_string())
            .or_default()
            .push(task);
    }

    by_date
        .into_iter()
        .map(|(date, day_tasks)| {
            let total = day_tasks.len() as f64;
            let completed = day_tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Completed)
                .count() as f64;

            let focus: Vec<f64> = day_tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Completed)
                .filter_map(|t| match (t.started_at, t.completed_at) {
                    (Some(start), Some(end)) if end >= start => {
                        Some((end - start).num_seconds() as f64 / 60.0)
                    }
                    _ => None,
                })
                .collect();

            let total_weight: f64 = day_tasks.iter().map(|t| t.cognitive_load.weight()).sum();
            let completed_weight: f64 = day_tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Completed)
                .map(|t| t.cognitive_load.weight())
                .sum();

            PerformancePoint {
                date,
                completion_rate: completed / total,
                focus_time: if focus.is_empty() {
                    None
                } else {
                    Some(focus.iter().sum::<f64>() / focus.len() as f64)
                },
                // total > 0 by construction, so total_weight > 0 too
                productivity_score: completed_weight * 100.0 / total_weight,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn window_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
    }

    fn task(
        load: CognitiveLoad,
        context: &str,
        created_hours_in: i64,
        lifecycle: Option<(i64, Option<i64>)>,
    ) -> TaskRecord {
        let created_at = window_start() + Duration::hours(created_hours_in);
        let mut task = TaskRecord::new("u1", "task", load, context);
        task.created_at = created_at;
        if let Some((start_offset, complete_offset)) = lifecycle {
            task.started_at = Some(created_at + Duration::minutes(start_offset));
            task.status = TaskStatus::InProgress;
            if let Some(done) = complete_offset {
                task.completed_at = Some(created_at + Duration::minutes(done));
                task.status = TaskStatus::Completed;
            }
        }
        task
    }

    #[test]
    fn test_completion_stats_empty_window() {
        assert_eq!(completion_stats(&[], window_start()), None);

        // Tasks exist but all predate the window
        let old = task(CognitiveLoad::Low, "work", -100, None);
        assert_eq!(completion_stats(&[old], window_start()), None);
    }

    #[test]
    fn test_completion_stats_rate_and_average() {
        let tasks = vec![
            task(CognitiveLoad::Low, "work", 1, Some((0, Some(120)))),
            task(CognitiveLoad::Low, "work", 2, Some((0, Some(240)))),
            task(CognitiveLoad::Low, "work", 3, None),
            task(CognitiveLoad::Low, "work", 4, None),
        ];
        let stats = completion_stats(&tasks, window_start()).unwrap();
        assert_eq!(stats.rate, 0.5);
        // Mean of 2h and 4h
        assert!((stats.average_time_hours.unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_completion_stats_no_completions() {
        let tasks = vec![task(CognitiveLoad::Low, "work", 1, None)];
        let stats = completion_stats(&tasks, window_start()).unwrap();
        assert_eq!(stats.rate, 0.0);
        assert_eq!(stats.average_time_hours, None);
    }

    #[test]
    fn test_peak_hours_ranked_and_weighted() {
        // Two high-load completions at 09:00 UTC, one low at 14:00
        let tasks = vec![
            task(CognitiveLoad::High, "work", 9, Some((0, Some(0)))),
            task(CognitiveLoad::High, "work", 9, Some((0, Some(0)))),
            task(CognitiveLoad::Low, "work", 14, Some((0, Some(0)))),
        ];
        let hours = peak_hours(&tasks, window_start());
        assert_eq!(hours.len(), 2);
        assert_eq!(hours[0].hour, 9);
        assert_eq!(hours[0].productivity, 6.0); // 2 completions × weight 3
        assert_eq!(hours[1].hour, 14);
        assert_eq!(hours[1].productivity, 1.0);
        assert!(hours.iter().all(|h| h.hour <= 23));
    }

    #[test]
    fn test_peak_hours_omits_hours_without_completions() {
        let tasks = vec![task(CognitiveLoad::High, "work", 9, None)];
        assert!(peak_hours(&tasks, window_start()).is_empty());
    }

    #[test]
    fn test_cognitive_load_percentages_sum_to_100() {
        let mut tasks = Vec::new();
        for _ in 0..13 {
            tasks.push(task(CognitiveLoad::High, "work", 1, None));
        }
        for _ in 0..5 {
            tasks.push(task(CognitiveLoad::Medium, "work", 1, None));
        }
        for _ in 0..2 {
            tasks.push(task(CognitiveLoad::Low, "work", 1, None));
        }

        let shares = cognitive_load_distribution(&tasks, window_start());
        assert_eq!(shares.len(), 3);
        let sum: f64 = shares.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 0.01);
        // Descending by percentage
        assert!(shares.windows(2).all(|w| w[0].percentage >= w[1].percentage));
        assert_eq!(shares[0].load, CognitiveLoad::High);
    }

    #[test]
    fn test_cognitive_load_empty_window() {
        assert!(cognitive_load_distribution(&[], window_start()).is_empty());
    }

    #[test]
    fn test_context_switches_all_pairs_semantics() {
        // Three tasks: work, meeting, work. All-pairs counting yields
        // work→meeting 1, work→work excluded (same context),
        // meeting→work 1, work(first)→work(last) excluded.
        let tasks = vec![
            task(CognitiveLoad::Low, "work", 1, Some((0, None))),
            task(CognitiveLoad::Low, "meeting", 2, Some((0, None))),
            task(CognitiveLoad::Low, "work", 3, Some((0, None))),
        ];
        let switches = context_switches(&tasks, window_start());
        assert_eq!(switches.len(), 2);
        let work_to_meeting = switches
            .iter()
            .find(|s| s.from == "work" && s.to == "meeting")
            .unwrap();
        assert_eq!(work_to_meeting.frequency, 1);
    }

    #[test]
    fn test_context_switches_counts_every_later_pair() {
        // One "work" task followed by three "review" tasks: the all-pairs
        // join counts work→review three times.
        let mut tasks = vec![task(CognitiveLoad::Low, "work", 1, Some((0, None)))];
        for i in 0..3 {
            tasks.push(task(CognitiveLoad::Low, "review", 2 + i, Some((0, None))));
        }
        let switches = context_switches(&tasks, window_start());
        let first = &switches[0];
        assert_eq!((first.from.as_str(), first.to.as_str()), ("work", "review"));
        assert_eq!(first.frequency, 3);
    }

    #[test]
    fn test_context_switches_truncated_to_ten() {
        let mut tasks = Vec::new();
        for i in 0..12 {
            tasks.push(task(
                CognitiveLoad::Low,
                &format!("ctx{}", i),
                i,
                Some((0, None)),
            ));
        }
        let switches = context_switches(&tasks, window_start());
        assert_eq!(switches.len(), 10);
    }

    #[test]
    fn test_energy_patterns_means_by_hour() {
        let base = window_start();
        let record = |hour: i64, level: f64| EnergyRecord {
            user_id: "u1".to_string(),
            timestamp: base + Duration::hours(hour),
            level,
        };
        let records = vec![record(9, 4.0), record(9, 2.0), record(13, 1.0)];

        let patterns = energy_patterns(&records, base);
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].hour, 9);
        assert!((patterns[0].level - 0.6).abs() < 1e-9); // mean of 0.8 and 0.4
        assert_eq!(patterns[1].hour, 13);
        assert!((patterns[1].level - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_energy_patterns_skips_malformed() {
        let base = window_start();
        let records = vec![
            EnergyRecord {
                user_id: "u1".to_string(),
                timestamp: base + Duration::hours(9),
                level: 400.0,
            },
            EnergyRecord {
                user_id: "u1".to_string(),
                timestamp: base + Duration::hours(9),
                level: 5.0,
            },
        ];
        let patterns = energy_patterns(&records, base);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].level, 1.0);
    }

    #[test]
    fn test_productivity_score_weighted() {
        // Completed: one high (3). Total: high + low (4). Score = 75.
        let tasks = vec![
            task(CognitiveLoad::High, "work", 1, Some((0, Some(60)))),
            task(CognitiveLoad::Low, "work", 2, None),
        ];
        let score = productivity_score(&tasks, window_start()).unwrap();
        assert!((score - 75.0).abs() < 1e-9);
        assert_eq!(productivity_score(&[], window_start()), None);
    }

    #[test]
    fn test_performance_data_per_day() {
        let tasks = vec![
            task(CognitiveLoad::Low, "work", 1, Some((0, Some(30)))),
            task(CognitiveLoad::Low, "work", 2, None),
            task(CognitiveLoad::Low, "work", 26, Some((0, Some(60)))),
        ];
        let series = performance_data(&tasks, window_start());
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, "2026-03-01");
        assert_eq!(series[0].completion_rate, 0.5);
        assert_eq!(series[0].focus_time, Some(30.0));
        assert_eq!(series[1].date, "2026-03-02");
        assert_eq!(series[1].completion_rate, 1.0);
    }

    #[test]
    fn test_average_focus_minutes() {
        let tasks = vec![
            task(CognitiveLoad::Low, "work", 1, Some((0, Some(20)))),
            task(CognitiveLoad::Low, "work", 2, Some((0, Some(40)))),
        ];
        let focus = average_focus_minutes(&tasks, window_start()).unwrap();
        assert!((focus - 30.0).abs() < 1e-9);
        assert_eq!(average_focus_minutes(&[], window_start()), None);
    }
}
