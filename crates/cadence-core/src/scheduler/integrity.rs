//! Consistency checks between rules and their instances.

use chrono::{NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

use super::Scheduler;
use crate::error::CoreError;
use crate::models::TaskRecord;
use crate::store::TaskStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// A rule lists a child that does not exist or belongs elsewhere
    DanglingChild { rule_id: Uuid, child_id: Uuid },
    /// An instance points at a parent that is not a rule
    OrphanInstance { task_id: Uuid, parent_id: Uuid },
    /// An instance's parent does not list it
    UnlistedInstance { task_id: Uuid, rule_id: Uuid },
    UnorderedChildren { rule_id: Uuid },
    /// The generation counter is below the number of live instances
    CountBelowLive { rule_id: Uuid, generated: u32, live: usize },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::DanglingChild { rule_id, child_id } => {
                write!(f, "rule {} lists missing instance {}", rule_id, child_id)
            }
            IntegrityIssue::OrphanInstance { task_id, parent_id } => {
                write!(f, "instance {} points to missing rule {}", task_id, parent_id)
            }
            IntegrityIssue::UnlistedInstance { task_id, rule_id } => {
                write!(f, "instance {} is not listed by rule {}", task_id, rule_id)
            }
            IntegrityIssue::UnorderedChildren { rule_id } => {
                write!(f, "rule {} has instances out of chronological order", rule_id)
            }
            IntegrityIssue::CountBelowLive { rule_id, generated, live } => write!(
                f,
                "rule {} counts {} generated instances but has {} live",
                rule_id, generated, live
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub records_checked: usize,
    pub issues: Vec<IntegrityIssue>,
    pub repaired: bool,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl<S: TaskStore> Scheduler<S> {
    /// Checks every rule/instance link; with `repair`, fixes what it finds
    /// and saves.
    ///
    /// Repairs drop dangling child ids, detach orphans into standalone
    /// tasks, re-list unlisted instances, sort child lists by due date and
    /// raise the generation counter to the live count.
    pub async fn verify_integrity(&mut self, repair: bool) -> Result<IntegrityReport, CoreError> {
        let issues = self.collect_issues();
        let mut report = IntegrityReport {
            records_checked: self.store().records().len(),
            issues,
            repaired: false,
        };

        for issue in &report.issues {
            warn!(%issue, "integrity issue");
        }

        if repair && !report.is_clean() {
            self.apply_repairs(&report.issues);
            self.store_mut().save().await?;
            report.repaired = true;
            info!(fixed = report.issues.len(), "repaired integrity issues");
        }

        Ok(report)
    }

    fn collect_issues(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();

        for rule in self.rules() {
            let mut previous: Option<NaiveDate> = None;
            let mut ordered = true;

            for child_id in &rule.child_tasks {
                match self.task(*child_id) {
                    Some(task) if task.parent_id == Some(rule.id) => {
                        if let (Some(prev), Some(due)) = (previous, task.due_date) {
                            if due < prev {
                                ordered = false;
                            }
                        }
                        previous = task.due_date.or(previous);
                    }
                    _ => issues.push(IntegrityIssue::DanglingChild {
                        rule_id: rule.id,
                        child_id: *child_id,
                    }),
                }
            }

            if !ordered {
                issues.push(IntegrityIssue::UnorderedChildren { rule_id: rule.id });
            }
        }

        for task in self.store().all_tasks() {
            let Some(parent_id) = task.parent_id else {
                continue;
            };
            match self.rule(parent_id) {
                None => issues.push(IntegrityIssue::OrphanInstance {
                    task_id: task.id,
                    parent_id,
                }),
                Some(rule) if !rule.child_tasks.contains(&task.id) => {
                    issues.push(IntegrityIssue::UnlistedInstance {
                        task_id: task.id,
                        rule_id: parent_id,
                    })
                }
                Some(_) => {}
            }
        }

        // Counted against the list as it will be after the fixes above
        for rule in self.rules() {
            let live = rule
                .child_tasks
                .iter()
                .filter(|id| self.task(**id).map_or(false, |t| t.parent_id == Some(rule.id)))
                .count()
                + issues
                    .iter()
                    .filter(|issue| matches!(issue, IntegrityIssue::UnlistedInstance { rule_id, .. } if *rule_id == rule.id))
                    .count();
            if (rule.generated_count as usize) < live {
                issues.push(IntegrityIssue::CountBelowLive {
                    rule_id: rule.id,
                    generated: rule.generated_count,
                    live,
                });
            }
        }

        issues
    }

    fn apply_repairs(&mut self, issues: &[IntegrityIssue]) {
        let mut dangling: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
        let mut relist: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        let mut touched: HashSet<Uuid> = HashSet::new();

        for issue in issues {
            match issue {
                IntegrityIssue::DanglingChild { rule_id, child_id } => {
                    dangling.entry(*rule_id).or_default().insert(*child_id);
                    touched.insert(*rule_id);
                }
                IntegrityIssue::OrphanInstance { task_id, .. } => {
                    if let Some(task) = self.store_mut().find_by_id_mut(*task_id).and_then(TaskRecord::as_task_mut) {
                        task.parent_id = None;
                        task.updated_at = Utc::now();
                    }
                }
                IntegrityIssue::UnlistedInstance { task_id, rule_id } => {
                    relist.entry(*rule_id).or_default().push(*task_id);
                    touched.insert(*rule_id);
                }
                IntegrityIssue::UnorderedChildren { rule_id } | IntegrityIssue::CountBelowLive { rule_id, .. } => {
                    touched.insert(*rule_id);
                }
            }
        }

        for rule_id in touched {
            let due_dates: HashMap<Uuid, Option<NaiveDate>> = self
                .store()
                .all_tasks()
                .into_iter()
                .filter(|task| task.parent_id == Some(rule_id))
                .map(|task| (task.id, task.due_date))
                .collect();

            let Some(rule) = self.store_mut().find_by_id_mut(rule_id).and_then(TaskRecord::as_rule_mut) else {
                continue;
            };

            if let Some(drop) = dangling.get(&rule_id) {
                rule.child_tasks.retain(|id| !drop.contains(id));
            }
            if let Some(extra) = relist.remove(&rule_id) {
                rule.child_tasks.extend(extra);
            }
            // Undated instances sort last
            rule.child_tasks
                .sort_by_key(|id| due_dates.get(id).copied().flatten().unwrap_or(NaiveDate::MAX));
            rule.generated_count = rule.generated_count.max(rule.child_tasks.len() as u32);
            rule.updated_at = Utc::now();
        }
    }
}
