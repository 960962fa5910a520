//! Task store abstraction and its in-memory implementation.
//!
//! The store holds both concrete tasks and recurrence rules as
//! [`TaskRecord`]s. Lookups and mutation are synchronous against the loaded
//! snapshot; only [`TaskStore::save`] touches durable storage.

use crate::error::CoreError;
use crate::models::{RecurrenceRule, Task, TaskRecord};
use async_trait::async_trait;
use uuid::Uuid;

pub mod sqlite;

pub use sqlite::SqliteStore;

/// Storage seam used by the scheduler
#[async_trait]
pub trait TaskStore: Send {
    /// Appends a record at the end of the store.
    fn append_task(&mut self, record: TaskRecord);

    fn find_by_id(&self, id: Uuid) -> Option<&TaskRecord>;

    fn find_by_id_mut(&mut self, id: Uuid) -> Option<&mut TaskRecord>;

    /// Removes the record with `id`; `false` when nothing matched.
    fn remove_by_id(&mut self, id: Uuid) -> bool;

    /// Every record in insertion order.
    fn records(&self) -> &[TaskRecord];

    fn all_rules(&self) -> Vec<&RecurrenceRule> {
        self.records().iter().filter_map(TaskRecord::as_rule).collect()
    }

    fn all_tasks(&self) -> Vec<&Task> {
        self.records().iter().filter_map(TaskRecord::as_task).collect()
    }

    /// Records whose id (hyphenated form) starts with `prefix`.
    fn find_by_id_prefix(&self, prefix: &str) -> Vec<&TaskRecord> {
        let prefix = prefix.to_ascii_lowercase();
        self.records()
            .iter()
            .filter(|record| record.id().to_string().starts_with(&prefix))
            .collect()
    }

    /// Persists the current snapshot.
    async fn save(&mut self) -> Result<(), CoreError>;
}

/// Vec-backed store; `save` only counts calls.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: Vec<TaskRecord>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<TaskRecord>) -> Self {
        Self { records, saves: 0 }
    }

    /// Number of times `save` has been called.
    pub fn save_count(&self) -> usize {
        self.saves
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.records.iter().position(|record| record.id() == id)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    fn append_task(&mut self, record: TaskRecord) {
        self.records.push(record);
    }

    fn find_by_id(&self, id: Uuid) -> Option<&TaskRecord> {
        self.records.iter().find(|record| record.id() == id)
    }

    fn find_by_id_mut(&mut self, id: Uuid) -> Option<&mut TaskRecord> {
        self.records.iter_mut().find(|record| record.id() == id)
    }

    fn remove_by_id(&mut self, id: Uuid) -> bool {
        match self.position(id) {
            Some(index) => {
                self.records.remove(index);
                true
            }
            None => false,
        }
    }

    fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    async fn save(&mut self) -> Result<(), CoreError> {
        self.saves += 1;
        Ok(())
    }
}
