//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    -- Task records, owned by the task-management side.
    -- The analytics engine only reads this table.
    CREATE TABLE IF NOT EXISTS tasks (
        id             TEXT PRIMARY KEY,
        user_id        TEXT NOT NULL,
        title          TEXT NOT NULL,
        status         TEXT NOT NULL,
        cognitive_load TEXT NOT NULL,
        context        TEXT NOT NULL,
        created_at     DATETIME NOT NULL,
        started_at     DATETIME,
        completed_at   DATETIME,
        due_date       DATETIME
    );

    CREATE INDEX IF NOT EXISTS idx_tasks_user_created ON tasks(user_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_tasks_user_completed ON tasks(user_id, completed_at);
    CREATE INDEX IF NOT EXISTS idx_tasks_user_started ON tasks(user_id, started_at);

    -- Point-in-time energy self-reports.
    CREATE TABLE IF NOT EXISTS energy_levels (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id   TEXT NOT NULL,
        timestamp DATETIME NOT NULL,
        level     REAL NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_energy_user_ts ON energy_levels(user_id, timestamp);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
