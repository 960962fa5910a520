use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::{MemoryStore, TaskStore};
use crate::db::{self, DbPool};
use crate::error::CoreError;
use crate::models::{
    parse_clock_time, parse_date, EndCondition, RecurrencePattern, RecurrenceRule, Task,
    TaskPriority, TaskRecord, TaskStatus, DATE_FORMAT, TIME_FORMAT,
};

/// SQLite-backed store.
///
/// The whole snapshot is loaded into memory when the store is opened, and
/// every `save` rewrites it inside a single transaction. A `position`
/// column keeps the insertion order across both tables.
pub struct SqliteStore {
    pool: DbPool,
    inner: MemoryStore,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and loads it.
    pub async fn open(path: &str) -> Result<Self, CoreError> {
        let pool = db::establish_connection(path).await?;
        Self::from_pool(pool).await
    }

    /// Loads the snapshot from an already established pool.
    pub async fn from_pool(pool: DbPool) -> Result<Self, CoreError> {
        let records = Self::load(&pool).await?;
        debug!(records = records.len(), "loaded task store");
        Ok(Self {
            pool,
            inner: MemoryStore::with_records(records),
        })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn load(pool: &DbPool) -> Result<Vec<TaskRecord>, CoreError> {
        let mut positioned: Vec<(i64, TaskRecord)> = Vec::new();

        let rule_rows = sqlx::query("SELECT * FROM recurrence_rules")
            .fetch_all(pool)
            .await?;
        for row in &rule_rows {
            positioned.push((row.try_get("position")?, TaskRecord::Rule(rule_from_row(row)?)));
        }

        let task_rows = sqlx::query("SELECT * FROM tasks").fetch_all(pool).await?;
        for row in &task_rows {
            positioned.push((row.try_get("position")?, TaskRecord::Task(task_from_row(row)?)));
        }

        positioned.sort_by_key(|(position, _)| *position);
        Ok(positioned.into_iter().map(|(_, record)| record).collect())
    }

    async fn insert_rule(
        tx: &mut Transaction<'_, Sqlite>,
        position: i64,
        rule: &RecurrenceRule,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT INTO recurrence_rules (
                id, position, description, time, priority, reminders, notes, pattern,
                interval, start_date, end_condition, generated_count, child_tasks,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(rule.id.to_string())
        .bind(position)
        .bind(&rule.description)
        .bind(rule.time.map(format_time))
        .bind(rule.priority.rank() as i64)
        .bind(serde_json::to_string(&rule.reminders)?)
        .bind(&rule.notes)
        .bind(serde_json::to_string(&rule.pattern)?)
        .bind(rule.interval as i64)
        .bind(rule.start_date.format(DATE_FORMAT).to_string())
        .bind(serde_json::to_string(&rule.end)?)
        .bind(rule.generated_count as i64)
        .bind(serde_json::to_string(&rule.child_tasks)?)
        .bind(rule.created_at.to_rfc3339())
        .bind(rule.updated_at.to_rfc3339())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn insert_task(
        tx: &mut Transaction<'_, Sqlite>,
        position: i64,
        task: &Task,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT INTO tasks (
                id, position, description, due_date, time, priority, status, reminders,
                notes, parent_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(task.id.to_string())
        .bind(position)
        .bind(&task.description)
        .bind(task.due_date.map(|d| d.format(DATE_FORMAT).to_string()))
        .bind(task.time.map(format_time))
        .bind(task.priority.rank() as i64)
        .bind(task.status.to_string())
        .bind(serde_json::to_string(&task.reminders)?)
        .bind(&task.notes)
        .bind(task.parent_id.map(|id| id.to_string()))
        .bind(task.created_at.to_rfc3339())
        .bind(task.updated_at.to_rfc3339())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for SqliteStore {
    fn append_task(&mut self, record: TaskRecord) {
        self.inner.append_task(record);
    }

    fn find_by_id(&self, id: Uuid) -> Option<&TaskRecord> {
        self.inner.find_by_id(id)
    }

    fn find_by_id_mut(&mut self, id: Uuid) -> Option<&mut TaskRecord> {
        self.inner.find_by_id_mut(id)
    }

    fn remove_by_id(&mut self, id: Uuid) -> bool {
        self.inner.remove_by_id(id)
    }

    fn records(&self) -> &[TaskRecord] {
        self.inner.records()
    }

    async fn save(&mut self) -> Result<(), CoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM tasks").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM recurrence_rules").execute(&mut *tx).await?;

        for (position, record) in self.inner.records().iter().enumerate() {
            let position = position as i64;
            match record {
                TaskRecord::Rule(rule) => Self::insert_rule(&mut tx, position, rule).await?,
                TaskRecord::Task(task) => Self::insert_task(&mut tx, position, task).await?,
            }
        }

        tx.commit().await?;
        debug!(records = self.inner.len(), "saved task store");
        Ok(())
    }
}

fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn parse_uuid(raw: &str) -> Result<Uuid, CoreError> {
    Uuid::parse_str(raw).map_err(|e| CoreError::InvalidInput(format!("Corrupt id '{}': {}", raw, e)))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::InvalidInput(format!("Corrupt timestamp '{}': {}", raw, e)))
}

fn parse_priority(rank: i64) -> Result<TaskPriority, CoreError> {
    u8::try_from(rank)
        .ok()
        .and_then(TaskPriority::from_rank)
        .ok_or_else(|| CoreError::InvalidInput(format!("Corrupt priority rank {}", rank)))
}

fn optional_time(row: &SqliteRow) -> Result<Option<NaiveTime>, CoreError> {
    let raw: Option<String> = row.try_get("time")?;
    raw.as_deref().map(parse_clock_time).transpose()
}

fn rule_from_row(row: &SqliteRow) -> Result<RecurrenceRule, CoreError> {
    let id: String = row.try_get("id")?;
    let reminders: String = row.try_get("reminders")?;
    let pattern: String = row.try_get("pattern")?;
    let end: String = row.try_get("end_condition")?;
    let child_tasks: String = row.try_get("child_tasks")?;
    let start_date: String = row.try_get("start_date")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(RecurrenceRule {
        id: parse_uuid(&id)?,
        description: row.try_get("description")?,
        time: optional_time(row)?,
        priority: parse_priority(row.try_get("priority")?)?,
        reminders: serde_json::from_str(&reminders)?,
        notes: row.try_get("notes")?,
        pattern: serde_json::from_str::<RecurrencePattern>(&pattern)?,
        interval: u32::try_from(row.try_get::<i64, _>("interval")?)
            .map_err(|_| CoreError::InvalidInput("Corrupt interval".to_string()))?,
        start_date: parse_date(&start_date)?,
        end: serde_json::from_str::<EndCondition>(&end)?,
        generated_count: u32::try_from(row.try_get::<i64, _>("generated_count")?)
            .map_err(|_| CoreError::InvalidInput("Corrupt generated_count".to_string()))?,
        child_tasks: serde_json::from_str(&child_tasks)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn task_from_row(row: &SqliteRow) -> Result<Task, CoreError> {
    let id: String = row.try_get("id")?;
    let due_date: Option<String> = row.try_get("due_date")?;
    let status: String = row.try_get("status")?;
    let reminders: String = row.try_get("reminders")?;
    let parent_id: Option<String> = row.try_get("parent_id")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Task {
        id: parse_uuid(&id)?,
        description: row.try_get("description")?,
        due_date: due_date.as_deref().map(parse_date).transpose()?,
        time: optional_time(row)?,
        priority: parse_priority(row.try_get("priority")?)?,
        status: status
            .parse::<TaskStatus>()
            .map_err(|e| CoreError::InvalidInput(e.to_string()))?,
        reminders: serde_json::from_str(&reminders)?,
        notes: row.try_get("notes")?,
        parent_id: parent_id.as_deref().map(parse_uuid).transpose()?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
