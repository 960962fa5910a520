use crate::error::CoreError;
use crate::models::{NewRuleData, RecurrenceRule, SchedulerConfig, Task, TaskRecord, TaskStatus, UpdateRuleData};
use crate::store::TaskStore;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

pub mod horizon;
pub mod integrity;
pub mod lifecycle;

pub use horizon::HorizonSummary;
pub use integrity::{IntegrityIssue, IntegrityReport};

// Traits are defined here and implemented in the submodules

/// Creation, editing and deletion of recurrence rules and their instances.
///
/// Lookups that miss return `Ok(false)` / `Ok(None)`; errors are reserved
/// for invalid input and persistence failures.
#[async_trait]
pub trait RuleLifecycle {
    async fn create_rule(&mut self, data: NewRuleData) -> Result<Uuid, CoreError>;
    /// Applies `data` to the rule. Structural changes regenerate its
    /// instances; a new end condition removes the instances it no longer
    /// admits.
    async fn update_rule(&mut self, rule_id: Uuid, data: UpdateRuleData) -> Result<bool, CoreError>;
    async fn delete_rule(&mut self, rule_id: Uuid) -> Result<bool, CoreError>;
    async fn delete_task(&mut self, task_id: Uuid) -> Result<bool, CoreError>;
    async fn detach_instance(&mut self, instance_id: Uuid) -> Result<bool, CoreError>;
    async fn generate_batch(&mut self, rule_id: Uuid, count: usize) -> Result<Option<Vec<Uuid>>, CoreError>;
    async fn generate_more(&mut self, rule_id: Uuid, count: usize) -> Result<bool, CoreError>;
    /// Drops every instance of the rule and rebuilds from its start date:
    /// the start-date instance when the end condition admits it, followed
    /// by one batch of `batch_size`. The occurrence budget restarts at zero.
    async fn regenerate(&mut self, rule_id: Uuid) -> Result<bool, CoreError>;
    async fn set_task_status(&mut self, task_id: Uuid, status: TaskStatus) -> Result<bool, CoreError>;
}

/// Keeps every rule's instances reaching at least `horizon_days` ahead.
#[async_trait]
pub trait HorizonMaintenance {
    /// Runs a pass using today's date in the configured zone.
    async fn ensure_horizon(&mut self) -> Result<HorizonSummary, CoreError>;
    async fn ensure_horizon_at(&mut self, today: NaiveDate) -> Result<HorizonSummary, CoreError>;
}

/// Owns the task store and drives rule lifecycles against it.
///
/// Every mutating operation takes `&mut self`, so a scheduler is a single
/// writer; share it behind a `tokio::sync::Mutex` when needed.
pub struct Scheduler<S: TaskStore> {
    store: S,
    config: SchedulerConfig,
}

impl<S: TaskStore> Scheduler<S> {
    pub fn new(store: S, config: SchedulerConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn rule(&self, id: Uuid) -> Option<&RecurrenceRule> {
        self.store.find_by_id(id).and_then(TaskRecord::as_rule)
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.store.find_by_id(id).and_then(TaskRecord::as_task)
    }

    pub fn rules(&self) -> Vec<&RecurrenceRule> {
        self.store.all_rules()
    }

    /// Live instances of a rule in `child_tasks` order.
    pub fn instances_of(&self, rule_id: Uuid) -> Vec<&Task> {
        self.rule(rule_id)
            .map(|rule| rule.child_tasks.iter().filter_map(|id| self.task(*id)).collect())
            .unwrap_or_default()
    }

    /// Due date of the newest live instance of `rule`.
    pub(crate) fn last_instance_date(&self, rule: &RecurrenceRule) -> Option<NaiveDate> {
        rule.child_tasks
            .iter()
            .rev()
            .filter_map(|id| self.task(*id))
            .find_map(|task| task.due_date)
    }

    /// Resolves a full id or a unique id prefix (at least 2 characters).
    pub fn resolve_id(&self, short_id: &str) -> Result<Uuid, CoreError> {
        if let Ok(id) = Uuid::parse_str(short_id) {
            return self
                .store
                .find_by_id(id)
                .map(TaskRecord::id)
                .ok_or_else(|| CoreError::NotFound(format!("No task or rule with id '{}'", short_id)));
        }

        if short_id.len() < 2 {
            return Err(CoreError::InvalidInput(
                "Short ids need at least 2 characters".to_string(),
            ));
        }

        let matches = self.store.find_by_id_prefix(short_id);
        match matches.as_slice() {
            [] => Err(CoreError::NotFound(format!("No task or rule with id '{}'", short_id))),
            [record] => Ok(record.id()),
            _ => Err(CoreError::AmbiguousId(
                matches
                    .iter()
                    .map(|record| (record.id().to_string(), record.description().to_string()))
                    .collect(),
            )),
        }
    }
}
