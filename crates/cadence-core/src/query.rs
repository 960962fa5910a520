use chrono::NaiveDate;

use crate::models::{Task, TaskStatus};
use crate::store::TaskStore;

/// Agenda filter over concrete tasks. Rules are never returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    /// Inclusive lower bound on the due date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the due date
    pub to: Option<NaiveDate>,
}

impl TaskQuery {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            status: None,
            from: Some(date),
            to: Some(date),
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    fn has_date_bounds(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Undated tasks only match queries without date bounds.
    pub fn matches(&self, task: &Task) -> bool {
        if self.status.map_or(false, |status| status != task.status) {
            return false;
        }
        match task.due_date {
            Some(due) => {
                self.from.map_or(true, |from| due >= from) && self.to.map_or(true, |to| due <= to)
            }
            None => !self.has_date_bounds(),
        }
    }
}

/// Tasks matching `query`, ordered by due date, time and priority, with
/// undated tasks last.
pub fn select<S: TaskStore + ?Sized>(store: &S, query: &TaskQuery) -> Vec<Task> {
    let mut tasks: Vec<Task> = store
        .all_tasks()
        .into_iter()
        .filter(|task| query.matches(task))
        .cloned()
        .collect();
    tasks.sort_by_key(Task::agenda_key);
    tasks
}

/// Every task due on `date`.
pub fn tasks_on<S: TaskStore + ?Sized>(store: &S, date: NaiveDate) -> Vec<Task> {
    select(store, &TaskQuery::on(date))
}
