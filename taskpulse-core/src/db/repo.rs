//! Database repository layer
//!
//! Provides the read-only event-store query interface used by the analytics
//! engine, plus the insert operations the task-management side needs.

use crate::error::{Error, Result};
use crate::types::{EnergyRecord, TaskRecord};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::PathBuf;
use std::sync::Mutex;

/// Read-only query interface over persisted task and energy records.
///
/// The analytics facade takes this as an injected dependency so tests can
/// substitute an in-memory store. Implementations return *all* matching
/// rows for the window; there is no pagination contract.
pub trait EventStore: Send + Sync {
    /// All tasks for `user_id` with any lifecycle activity (created,
    /// started, or completed) at or after `since`. Each aggregation view
    /// windows on its own timestamp column afterwards.
    fn query_tasks(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<TaskRecord>>;

    /// All energy self-reports for `user_id` at or after `since`.
    fn query_energy_records(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<EnergyRecord>>;
}

/// SQLite-backed event store.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL mode for better concurrency between the analytics reads
        // and whatever writes task records
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // ============================================
    // Write operations
    // ============================================

    /// Insert or replace a task record
    pub fn insert_task(&self, task: &TaskRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO tasks
                (id, user_id, title, status, cognitive_load, context,
                 created_at, started_at, completed_at, due_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                task.id,
                task.user_id,
                task.title,
                task.status.as_str(),
                task.cognitive_load.as_str(),
                task.context,
                task.created_at.to_rfc3339(),
                task.started_at.map(|t| t.to_rfc3339()),
                task.completed_at.map(|t| t.to_rfc3339()),
                task.due_date.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Insert an energy self-report
    pub fn insert_energy_record(&self, record: &EnergyRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO energy_levels (user_id, timestamp, level)
            VALUES (?1, ?2, ?3)
            "#,
            params![
                record.user_id,
                record.timestamp.to_rfc3339(),
                record.level,
            ],
        )?;
        Ok(())
    }

    // ============================================
    // Row conversion
    // ============================================

    fn parse_ts(value: &str) -> std::result::Result<DateTime<Utc>, String> {
        DateTime::parse_from_rfc3339(value)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| format!("bad timestamp {:?}: {}", value, e))
    }

    fn parse_opt_ts(
        value: Option<&str>,
    ) -> std::result::Result<Option<DateTime<Utc>>, String> {
        value.map(Self::parse_ts).transpose()
    }

    /// Convert raw task columns into a typed record.
    ///
    /// Returns a description of what was wrong for malformed rows, so the
    /// caller can skip them with a warning instead of aborting the query.
    #[allow(clippy::too_many_arguments)]
    fn task_from_columns(
        id: String,
        user_id: String,
        title: String,
        status: String,
        cognitive_load: String,
        context: String,
        created_at: String,
        started_at: Option<String>,
        completed_at: Option<String>,
        due_date: Option<String>,
    ) -> std::result::Result<TaskRecord, String> {
        Ok(TaskRecord {
            id,
            user_id,
            title,
            status: status.parse()?,
            cognitive_load: cognitive_load.parse()?,
            context,
            created_at: Self::parse_ts(&created_at)?,
            started_at: Self::parse_opt_ts(started_at.as_deref())?,
            completed_at: Self::parse_opt_ts(completed_at.as_deref())?,
            due_date: Self::parse_opt_ts(due_date.as_deref())?,
        })
    }
}

impl EventStore for Database {
    fn query_tasks(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<TaskRecord>> {
        let conn = self.conn.lock().unwrap();
        let since_str = since.to_rfc3339();

        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, title, status, cognitive_load, context,
                   created_at, started_at, completed_at, due_date
            FROM tasks
            WHERE user_id = ?1
              AND (created_at >= ?2
                   OR (started_at IS NOT NULL AND started_at >= ?2)
                   OR (completed_at IS NOT NULL AND completed_at >= ?2))
            ORDER BY created_at
            "#,
        )?;

        let rows = stmt.query_map(params![user_id, since_str], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, Option<String>>(7)?,
                row.get::<_, Option<String>>(8)?,
                row.get::<_, Option<String>>(9)?,
            ))
        })?;

        let mut tasks = Vec::new();
        for row in rows {
            let (id, uid, title, status, load, context, created, started, completed, due) =
                row.map_err(Error::from)?;
            match Self::task_from_columns(
                id, uid, title, status, load, context, created, started, completed, due,
            ) {
                Ok(task) => tasks.push(task),
                Err(reason) => {
                    // Malformed rows are skipped, never fatal
                    tracing::warn!(user_id, reason, "Skipping malformed task row");
                }
            }
        }

        Ok(tasks)
    }

    fn query_energy_records(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<EnergyRecord>> {
        let conn = self.conn.lock().unwrap();
        let since_str = since.to_rfc3339();

        let mut stmt = conn.prepare(
            r#"
            SELECT user_id, timestamp, level
            FROM energy_levels
            WHERE user_id = ?1 AND timestamp >= ?2
            ORDER BY timestamp
            "#,
        )?;

        let rows = stmt.query_map(params![user_id, since_str], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (uid, ts, level) = row.map_err(Error::from)?;
            match Self::parse_ts(&ts) {
                Ok(timestamp) => records.push(EnergyRecord {
                    user_id: uid,
                    timestamp,
                    level,
                }),
                Err(reason) => {
                    tracing::warn!(user_id, reason, "Skipping malformed energy row");
                }
            }
        }

        Ok(records)
    }
}
