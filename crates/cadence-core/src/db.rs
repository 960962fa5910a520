use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::debug;

use crate::error::CoreError;

pub use sqlx::SqlitePool as DbPool;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS recurrence_rules (
        id TEXT PRIMARY KEY NOT NULL,
        position INTEGER NOT NULL,
        description TEXT NOT NULL,
        time TEXT,
        priority INTEGER NOT NULL,
        reminders TEXT NOT NULL,
        notes TEXT,
        pattern TEXT NOT NULL,
        interval INTEGER NOT NULL,
        start_date TEXT NOT NULL,
        end_condition TEXT NOT NULL,
        generated_count INTEGER NOT NULL,
        child_tasks TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY NOT NULL,
        position INTEGER NOT NULL,
        description TEXT NOT NULL,
        due_date TEXT,
        time TEXT,
        priority INTEGER NOT NULL,
        status TEXT NOT NULL,
        reminders TEXT NOT NULL,
        notes TEXT,
        parent_id TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_tasks_parent_id ON tasks(parent_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date)",
];

/// Establishes a connection pool to the SQLite database and creates the
/// schema if it is missing.
///
/// # Arguments
///
/// * `db_path` - The path to the SQLite database file.
pub async fn establish_connection(db_path: &str) -> Result<SqlitePool, CoreError> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    debug!(path = db_path, "database ready");

    Ok(pool)
}

async fn create_schema(pool: &SqlitePool) -> Result<(), CoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
