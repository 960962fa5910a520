use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

use super::{RuleLifecycle, Scheduler};
use crate::error::CoreError;
use crate::models::{
    validate_end, validate_interval, EndCondition, NewRuleData, RecurrenceRule, Task, TaskRecord, TaskStatus,
    UpdateRuleData,
};
use crate::recurrence::OccurrenceGenerator;
use crate::store::TaskStore;

#[async_trait]
impl<S: TaskStore> RuleLifecycle for Scheduler<S> {
    async fn create_rule(&mut self, data: NewRuleData) -> Result<Uuid, CoreError> {
        data.validate()?;

        let mut rule = RecurrenceRule::from_new(data);
        let first = if rule.end.admits(rule.start_date) {
            let instance = Task::instance_of(&rule, rule.start_date);
            rule.child_tasks.push(instance.id);
            rule.generated_count = 1;
            Some(instance)
        } else {
            None
        };

        let rule_id = rule.id;
        info!(rule = %rule_id, pattern = rule.pattern.type_name(), "created recurrence rule");

        self.store_mut().append_task(TaskRecord::Rule(rule));
        if let Some(instance) = first {
            self.store_mut().append_task(TaskRecord::Task(instance));
        }
        self.store_mut().save().await?;

        Ok(rule_id)
    }

    async fn update_rule(&mut self, rule_id: Uuid, data: UpdateRuleData) -> Result<bool, CoreError> {
        let structural = match self.rule(rule_id) {
            Some(rule) => data.is_structural_for(rule),
            None => return Ok(false),
        };

        if let Some(description) = &data.description {
            if description.trim().is_empty() {
                return Err(CoreError::InvalidInput("Description cannot be empty".to_string()));
            }
        }
        if let Some(interval) = data.interval {
            validate_interval(interval)?;
        }
        if let Some(pattern) = &data.pattern {
            pattern.validate()?;
        }
        if let Some(end) = &data.end {
            validate_end(end)?;
        }

        let end_changed = data.end.is_some();
        let Some(rule) = self.store_mut().find_by_id_mut(rule_id).and_then(TaskRecord::as_rule_mut) else {
            return Ok(false);
        };

        if let Some(description) = data.description {
            rule.description = description;
        }
        if let Some(time) = data.time {
            rule.time = time;
        }
        if let Some(priority) = data.priority {
            rule.priority = priority;
        }
        if let Some(mut reminders) = data.reminders {
            reminders.sort_unstable();
            rule.reminders = reminders;
        }
        if let Some(notes) = data.notes {
            rule.notes = notes;
        }
        if let Some(end) = data.end {
            rule.end = end;
        }
        if let Some(start_date) = data.start_date {
            rule.start_date = start_date;
        }
        if let Some(pattern) = data.pattern {
            rule.pattern = pattern;
        }
        if let Some(interval) = data.interval {
            rule.interval = interval;
        }
        rule.updated_at = Utc::now();

        let mut pruned = 0;
        if structural {
            self.regenerate_in_memory(rule_id);
        } else if end_changed {
            pruned = self.prune_to_end(rule_id);
        }
        debug!(rule = %rule_id, structural, pruned, "updated recurrence rule");

        self.store_mut().save().await?;
        Ok(true)
    }

    async fn delete_rule(&mut self, rule_id: Uuid) -> Result<bool, CoreError> {
        if self.rule(rule_id).is_none() {
            return Ok(false);
        }

        let removed = self.remove_instances_of(rule_id);
        self.store_mut().remove_by_id(rule_id);
        info!(rule = %rule_id, instances = removed, "deleted recurrence rule");

        self.store_mut().save().await?;
        Ok(true)
    }

    async fn delete_task(&mut self, task_id: Uuid) -> Result<bool, CoreError> {
        let is_rule = match self.store().find_by_id(task_id) {
            Some(record) => record.as_rule().is_some(),
            None => return Ok(false),
        };

        if is_rule {
            self.delete_rule(task_id).await
        } else {
            self.detach_instance(task_id).await
        }
    }

    async fn detach_instance(&mut self, instance_id: Uuid) -> Result<bool, CoreError> {
        let parent_id = match self.task(instance_id) {
            Some(task) => task.parent_id,
            None => return Ok(false),
        };

        if let Some(parent_id) = parent_id {
            if let Some(parent) = self.store_mut().find_by_id_mut(parent_id).and_then(TaskRecord::as_rule_mut) {
                // generated_count stays: the termination budget counts every
                // instance ever generated
                parent.child_tasks.retain(|id| *id != instance_id);
                parent.updated_at = Utc::now();
            }
        }
        self.store_mut().remove_by_id(instance_id);
        debug!(task = %instance_id, parent = ?parent_id, "deleted task");

        self.store_mut().save().await?;
        Ok(true)
    }

    async fn generate_batch(&mut self, rule_id: Uuid, count: usize) -> Result<Option<Vec<Uuid>>, CoreError> {
        let created = self.generate_batch_in_memory(rule_id, count);
        if created.is_some() {
            self.store_mut().save().await?;
        }
        Ok(created)
    }

    async fn generate_more(&mut self, rule_id: Uuid, count: usize) -> Result<bool, CoreError> {
        Ok(self.generate_batch(rule_id, count).await?.is_some())
    }

    async fn regenerate(&mut self, rule_id: Uuid) -> Result<bool, CoreError> {
        if !self.regenerate_in_memory(rule_id) {
            return Ok(false);
        }
        self.store_mut().save().await?;
        Ok(true)
    }

    async fn set_task_status(&mut self, task_id: Uuid, status: TaskStatus) -> Result<bool, CoreError> {
        let Some(task) = self.store_mut().find_by_id_mut(task_id).and_then(TaskRecord::as_task_mut) else {
            return Ok(false);
        };
        task.status = status;
        task.updated_at = Utc::now();
        debug!(task = %task_id, %status, "updated task status");

        self.store_mut().save().await?;
        Ok(true)
    }
}

impl<S: TaskStore> Scheduler<S> {
    /// Dates the next batch of `count` would produce, without persisting.
    pub fn preview(&self, rule_id: Uuid, count: usize) -> Option<Vec<NaiveDate>> {
        let rule = self.rule(rule_id)?;
        let anchor = self.last_instance_date(rule).unwrap_or(rule.start_date);
        let budget = rule.remaining_budget(count);
        Some(OccurrenceGenerator::for_rule(rule).generate(anchor, budget))
    }

    /// Appends up to `count` instances after the newest one; `None` when
    /// `rule_id` is not a rule. Does not save.
    pub(crate) fn generate_batch_in_memory(&mut self, rule_id: Uuid, count: usize) -> Option<Vec<Uuid>> {
        let rule = self.rule(rule_id)?;
        let budget = rule.remaining_budget(count);
        if budget == 0 {
            debug!(rule = %rule_id, "occurrence budget exhausted");
            return Some(Vec::new());
        }

        let anchor = self.last_instance_date(rule).unwrap_or(rule.start_date);
        let dates = OccurrenceGenerator::for_rule(rule).generate(anchor, budget);
        let instances: Vec<Task> = dates.iter().map(|date| Task::instance_of(rule, *date)).collect();
        let ids: Vec<Uuid> = instances.iter().map(|task| task.id).collect();

        for instance in instances {
            self.store_mut().append_task(TaskRecord::Task(instance));
        }

        let rule = self.store_mut().find_by_id_mut(rule_id).and_then(TaskRecord::as_rule_mut)?;
        rule.child_tasks.extend(ids.iter().copied());
        rule.generated_count += ids.len() as u32;
        if !ids.is_empty() {
            rule.updated_at = Utc::now();
        }

        debug!(
            rule = %rule_id,
            %anchor,
            requested = count,
            created = ids.len(),
            generated_count = rule.generated_count,
            "generated batch"
        );
        Some(ids)
    }

    /// Rebuilds a rule's instances from its start date. Does not save.
    pub(crate) fn regenerate_in_memory(&mut self, rule_id: Uuid) -> bool {
        if self.rule(rule_id).is_none() {
            return false;
        }
        let removed = self.remove_instances_of(rule_id);

        let batch_size = self.config().batch_size;
        let Some(rule) = self.store_mut().find_by_id_mut(rule_id).and_then(TaskRecord::as_rule_mut) else {
            return false;
        };
        rule.child_tasks.clear();
        rule.generated_count = 0;

        let seed = if rule.end.admits(rule.start_date) {
            let instance = Task::instance_of(rule, rule.start_date);
            rule.child_tasks.push(instance.id);
            rule.generated_count = 1;
            Some(instance)
        } else {
            None
        };
        rule.updated_at = Utc::now();

        if let Some(instance) = seed {
            self.store_mut().append_task(TaskRecord::Task(instance));
        }
        let created = self.generate_batch_in_memory(rule_id, batch_size).map_or(0, |ids| ids.len());

        info!(rule = %rule_id, removed, created, "regenerated recurrence rule");
        true
    }

    /// Removes the instances the rule's end condition no longer admits:
    /// those after an end date, or those past the first `end_count` by due
    /// date. `generated_count` is capped at `end_count`. Does not save.
    fn prune_to_end(&mut self, rule_id: Uuid) -> usize {
        let Some(rule) = self.rule(rule_id) else {
            return 0;
        };
        let end = rule.end;

        let mut dated: Vec<(NaiveDate, Uuid)> = self
            .instances_of(rule_id)
            .into_iter()
            .filter_map(|task| task.due_date.map(|due| (due, task.id)))
            .collect();
        dated.sort_unstable();

        let doomed: HashSet<Uuid> = match end {
            EndCondition::Never => HashSet::new(),
            EndCondition::OnDate { end_date } => dated
                .iter()
                .filter(|(due, _)| *due > end_date)
                .map(|(_, id)| *id)
                .collect(),
            EndCondition::AfterCount { end_count } => {
                dated.iter().skip(end_count as usize).map(|(_, id)| *id).collect()
            }
        };

        for id in &doomed {
            self.store_mut().remove_by_id(*id);
        }
        if let Some(rule) = self.store_mut().find_by_id_mut(rule_id).and_then(TaskRecord::as_rule_mut) {
            rule.child_tasks.retain(|id| !doomed.contains(id));
            if let EndCondition::AfterCount { end_count } = end {
                rule.generated_count = rule.generated_count.min(end_count);
            }
        }
        doomed.len()
    }

    /// Removes every instance owned by `rule_id`, whether listed in its
    /// `child_tasks` or only pointing back through `parent_id`.
    fn remove_instances_of(&mut self, rule_id: Uuid) -> usize {
        let mut doomed: HashSet<Uuid> = self
            .rule(rule_id)
            .map(|rule| rule.child_tasks.iter().copied().collect())
            .unwrap_or_default();
        doomed.extend(
            self.store()
                .all_tasks()
                .into_iter()
                .filter(|task| task.parent_id == Some(rule_id))
                .map(|task| task.id),
        );

        doomed
            .into_iter()
            .filter(|id| self.store_mut().remove_by_id(*id))
            .count()
    }
}
