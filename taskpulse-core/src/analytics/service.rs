//! Analytics facade.
//!
//! Single entry point composing the aggregation views and the insight
//! generator. One request maps its time range to a single window start and
//! applies it to every view, fans the five independent store reads out
//! concurrently, and joins them before building the response. The
//! operation is all-or-nothing: the first failing view aborts the whole
//! request and no partial analytics ever escape.

use crate::analytics::aggregate;
use crate::analytics::insights::{AnalyticsSnapshot, InsightGenerator};
use crate::db::EventStore;
use crate::error::{AnalyticsView, Error, Result};
use crate::types::{ProductivityInsight, TaskAnalytics, TimeRange};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Default per-query timeout for aggregation reads.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Facade over the aggregator and insight generator for one event store.
pub struct AnalyticsService<S: EventStore + 'static> {
    store: Arc<S>,
    generator: Arc<InsightGenerator>,
    query_timeout: Duration,
}

impl<S: EventStore + 'static> Clone for AnalyticsService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            generator: Arc::clone(&self.generator),
            query_timeout: self.query_timeout,
        }
    }
}

impl<S: EventStore + 'static> AnalyticsService<S> {
    /// Create a service over an injected store with the default timeout.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_timeout(store, DEFAULT_QUERY_TIMEOUT)
    }

    /// Create a service with an explicit per-query timeout.
    pub fn with_timeout(store: Arc<S>, query_timeout: Duration) -> Self {
        Self {
            store,
            generator: Arc::new(InsightGenerator::new()),
            query_timeout: query_timeout.max(Duration::from_millis(1)),
        }
    }

    /// Run one aggregation view on the blocking pool with a timeout.
    ///
    /// A store failure comes back wrapped with the view's name; exceeding
    /// the timeout comes back as a distinctly tagged timeout error so the
    /// two are separable in logs.
    async fn run_view<T, F>(&self, view: AnalyticsView, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<S>) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let handle = tokio::task::spawn_blocking(move || f(store));

        match tokio::time::timeout(self.query_timeout, handle).await {
            Err(_) => Err(Error::Timeout {
                view,
                timeout_ms: self.query_timeout.as_millis() as u64,
            }),
            Ok(Err(join_err)) => Err(Error::in_view(view, Error::Task(join_err.to_string()))),
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(e))) => Err(Error::in_view(view, e)),
        }
    }

    /// Compute the full analytics for one (user, time range) pair.
    ///
    /// Pure function of store state: calling it twice against an unchanged
    /// store yields identical output for the same `now`.
    pub async fn get_task_analytics_at(
        &self,
        user_id: &str,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<TaskAnalytics> {
        let since = range.window_start(now);
        tracing::debug!(user_id, range = %range, since = %since, "Computing task analytics");

        let completion_view = self.run_view(AnalyticsView::CompletionStats, {
            let user = user_id.to_string();
            move |store| {
                let tasks = store.query_tasks(&user, since)?;
                Ok((
                    aggregate::completion_stats(&tasks, since),
                    aggregate::average_focus_minutes(&tasks, since),
                    aggregate::productivity_score(&tasks, since),
                    aggregate::performance_data(&tasks, since),
                ))
            }
        });

        let peak_view = self.run_view(AnalyticsView::PeakHours, {
            let user = user_id.to_string();
            move |store| {
                let tasks = store.query_tasks(&user, since)?;
                Ok(aggregate::peak_hours(&tasks, since))
            }
        });

        let load_view = self.run_view(AnalyticsView::CognitiveLoad, {
            let user = user_id.to_string();
            move |store| {
                let tasks = store.query_tasks(&user, since)?;
                Ok(aggregate::cognitive_load_distribution(&tasks, since))
            }
        });

        let switch_view = self.run_view(AnalyticsView::ContextSwitching, {
            let user = user_id.to_string();
            move |store| {
                let tasks = store.query_tasks(&user, since)?;
                Ok(aggregate::context_switches(&tasks, since))
            }
        });

        let energy_view = self.run_view(AnalyticsView::EnergyPatterns, {
            let user = user_id.to_string();
            move |store| {
                let records = store.query_energy_records(&user, since)?;
                Ok(aggregate::energy_patterns(&records, since))
            }
        });

        // Fan out, then join; the first failure aborts the whole request
        let (completion_bundle, peaks, loads, switches, energy) = tokio::try_join!(
            completion_view,
            peak_view,
            load_view,
            switch_view,
            energy_view
        )?;

        let (completion, focus, score, performance) = completion_bundle;

        Ok(TaskAnalytics {
            completion_rate: completion.map(|c| c.rate),
            average_completion_time: completion.and_then(|c| c.average_time_hours),
            average_focus_time: focus,
            productivity_score: score,
            peak_performance_hours: peaks,
            cognitive_load_distribution: loads,
            context_switching_patterns: switches,
            energy_patterns: energy,
            performance_data: performance,
        })
    }

    /// Compute analytics with `now` taken from the wall clock.
    pub async fn get_task_analytics(
        &self,
        user_id: &str,
        range: TimeRange,
    ) -> Result<TaskAnalytics> {
        self.get_task_analytics_at(user_id, range, Utc::now()).await
    }

    /// Generate the insight list for a user.
    ///
    /// Fetches the day/week/month aggregates concurrently and evaluates
    /// the fixed rule list over the joined snapshot; fetch completion
    /// order never affects output order.
    pub async fn generate_insights_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProductivityInsight>> {
        let (day, week, month) = tokio::try_join!(
            self.get_task_analytics_at(user_id, TimeRange::Day, now),
            self.get_task_analytics_at(user_id, TimeRange::Week, now),
            self.get_task_analytics_at(user_id, TimeRange::Month, now),
        )?;

        let snapshot = AnalyticsSnapshot { day, week, month };
        let insights = self.generator.generate(&snapshot);

        tracing::debug!(user_id, count = insights.len(), "Generated insights");
        Ok(insights)
    }

    /// Generate insights with `now` taken from the wall clock.
    pub async fn generate_insights(&self, user_id: &str) -> Result<Vec<ProductivityInsight>> {
        self.generate_insights_at(user_id, Utc::now()).await
    }

    /// Compute analytics and insights against one shared observation time.
    ///
    /// Callers wanting both in one response go through here so the two
    /// halves window on the same instant instead of reading the clock
    /// twice.
    pub async fn analytics_report_at(
        &self,
        user_id: &str,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<(TaskAnalytics, Vec<ProductivityInsight>)> {
        tokio::try_join!(
            self.get_task_analytics_at(user_id, range, now),
            self.generate_insights_at(user_id, now),
        )
    }

    /// Compute the report with `now` taken from the wall clock, once.
    pub async fn analytics_report(
        &self,
        user_id: &str,
        range: TimeRange,
    ) -> Result<(TaskAnalytics, Vec<ProductivityInsight>)> {
        self.analytics_report_at(user_id, range, Utc::now()).await
    }
}
