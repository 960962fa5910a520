use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{HorizonMaintenance, Scheduler};
use crate::error::CoreError;
use crate::store::TaskStore;
use crate::timezone::today_in;

/// Outcome of one horizon pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HorizonSummary {
    pub rules_scanned: usize,
    pub rules_extended: usize,
    pub instances_created: usize,
    /// Rules that can produce no further instances
    pub rules_terminated: usize,
}

impl HorizonSummary {
    pub fn changed(&self) -> bool {
        self.instances_created > 0
    }
}

#[async_trait]
impl<S: TaskStore> HorizonMaintenance for Scheduler<S> {
    async fn ensure_horizon(&mut self) -> Result<HorizonSummary, CoreError> {
        let today = today_in(self.config().timezone);
        self.ensure_horizon_at(today).await
    }

    async fn ensure_horizon_at(&mut self, today: NaiveDate) -> Result<HorizonSummary, CoreError> {
        let rule_ids: Vec<Uuid> = self.rules().iter().map(|rule| rule.id).collect();
        let mut summary = HorizonSummary {
            rules_scanned: rule_ids.len(),
            ..Default::default()
        };

        for rule_id in rule_ids {
            let (created, terminated) = self.extend_rule(rule_id, today);
            if created > 0 {
                summary.rules_extended += 1;
                summary.instances_created += created;
            }
            if terminated {
                summary.rules_terminated += 1;
            }
        }

        if summary.changed() {
            self.store_mut().save().await?;
        }

        info!(
            %today,
            scanned = summary.rules_scanned,
            extended = summary.rules_extended,
            created = summary.instances_created,
            terminated = summary.rules_terminated,
            "horizon pass complete"
        );
        Ok(summary)
    }
}

impl<S: TaskStore> Scheduler<S> {
    /// Whether a rule's newest instance already reaches the horizon.
    fn horizon_covered(&self, rule_id: Uuid, today: NaiveDate) -> bool {
        let Some(rule) = self.rule(rule_id) else {
            return true;
        };
        match self.last_instance_date(rule) {
            Some(last) => (last - today).num_days() >= self.config().horizon_days,
            None => false,
        }
    }

    /// Runs batches for one rule until it covers the horizon, terminates,
    /// or hits the per-pass cap. Returns (instances created, terminated).
    fn extend_rule(&mut self, rule_id: Uuid, today: NaiveDate) -> (usize, bool) {
        let batch_size = self.config().batch_size;
        let max_batches = self.config().max_batches_per_pass;
        let mut created = 0;

        for _ in 0..max_batches {
            if self.horizon_covered(rule_id, today) {
                return (created, false);
            }
            if self.rule(rule_id).map_or(true, |rule| rule.is_exhausted()) {
                debug!(rule = %rule_id, "rule exhausted its occurrence count");
                return (created, true);
            }

            match self.generate_batch_in_memory(rule_id, batch_size) {
                Some(ids) if !ids.is_empty() => created += ids.len(),
                _ => {
                    debug!(rule = %rule_id, "rule has no further occurrences");
                    return (created, true);
                }
            }
        }

        if !self.horizon_covered(rule_id, today) {
            warn!(
                rule = %rule_id,
                max_batches,
                "horizon not reached within the per-pass batch cap"
            );
        }
        (created, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EndCondition, NewRuleData, RecurrencePattern, SchedulerConfig};
    use crate::scheduler::RuleLifecycle;
    use crate::store::MemoryStore;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn scheduler_with(config: SchedulerConfig) -> Scheduler<MemoryStore> {
        Scheduler::new(MemoryStore::new(), config)
    }

    #[tokio::test]
    async fn test_horizon_reaches_window_and_is_idempotent() {
        let mut s = scheduler_with(SchedulerConfig::default());
        let id = s
            .create_rule(NewRuleData::new("Daily log", date(2024, 1, 1), RecurrencePattern::Daily))
            .await
            .unwrap();
        let today = date(2024, 1, 1);

        let first = s.ensure_horizon_at(today).await.unwrap();
        assert_eq!(first.rules_scanned, 1);
        assert_eq!(first.rules_extended, 1);
        assert!(first.instances_created > 0);

        let rule = s.rule(id).unwrap();
        let last = s.last_instance_date(rule).unwrap();
        assert!((last - today).num_days() >= 90);
        // Daily batches of 10 overshoot by less than one batch
        assert!((last - today).num_days() < 100);

        let saves = s.store().save_count();
        let second = s.ensure_horizon_at(today).await.unwrap();
        assert_eq!(second.instances_created, 0);
        assert_eq!(second.rules_extended, 0);
        assert_eq!(s.store().save_count(), saves);
    }

    #[tokio::test]
    async fn test_horizon_respects_count_termination() {
        let mut s = scheduler_with(SchedulerConfig::default());
        let mut data = NewRuleData::new("Course", date(2024, 1, 1), RecurrencePattern::weekly([1]));
        data.end = EndCondition::AfterCount { end_count: 5 };
        let id = s.create_rule(data).await.unwrap();

        let summary = s.ensure_horizon_at(date(2024, 1, 1)).await.unwrap();
        assert_eq!(summary.instances_created, 4);
        assert_eq!(summary.rules_terminated, 1);
        assert_eq!(s.rule(id).unwrap().live_count(), 5);
        assert_eq!(s.rule(id).unwrap().generated_count, 5);
    }

    #[tokio::test]
    async fn test_horizon_respects_end_date() {
        let mut s = scheduler_with(SchedulerConfig::default());
        let mut data = NewRuleData::new("Sprint", date(2024, 1, 1), RecurrencePattern::Daily);
        data.end = EndCondition::OnDate { end_date: date(2024, 1, 20) };
        let id = s.create_rule(data).await.unwrap();

        let summary = s.ensure_horizon_at(date(2024, 1, 1)).await.unwrap();
        assert_eq!(summary.rules_terminated, 1);
        let instances = s.instances_of(id);
        assert_eq!(instances.len(), 20);
        assert!(instances.iter().all(|t| t.due_date <= Some(date(2024, 1, 20))));
    }

    #[tokio::test]
    async fn test_horizon_catches_up_after_gap() {
        let mut s = scheduler_with(SchedulerConfig::default());
        let id = s
            .create_rule(NewRuleData::new("Monthly bill", date(2020, 1, 15), RecurrencePattern::Monthly { day_of_month: None }))
            .await
            .unwrap();

        let today = date(2024, 6, 1);
        s.ensure_horizon_at(today).await.unwrap();
        let rule = s.rule(id).unwrap();
        let last = s.last_instance_date(rule).unwrap();
        assert!((last - today).num_days() >= 90);

        let dates: Vec<_> = s.instances_of(id).iter().filter_map(|t| t.due_date).collect();
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_horizon_batch_cap() {
        let config = SchedulerConfig {
            max_batches_per_pass: 2,
            batch_size: 3,
            ..Default::default()
        };
        let mut s = scheduler_with(config);
        let id = s
            .create_rule(NewRuleData::new("Capped", date(2024, 1, 1), RecurrencePattern::Daily))
            .await
            .unwrap();

        let summary = s.ensure_horizon_at(date(2024, 1, 1)).await.unwrap();
        assert_eq!(summary.instances_created, 6);
        assert_eq!(summary.rules_terminated, 0);
        assert_eq!(s.rule(id).unwrap().live_count(), 7);
    }

    #[rstest]
    #[case(30)]
    #[case(90)]
    #[case(365)]
    #[tokio::test]
    async fn test_horizon_window_is_configurable(#[case] horizon_days: i64) {
        let config = SchedulerConfig {
            horizon_days,
            ..Default::default()
        };
        let mut s = scheduler_with(config);
        let id = s
            .create_rule(NewRuleData::new("Weekly review", date(2024, 1, 5), RecurrencePattern::weekly([4])))
            .await
            .unwrap();

        let today = date(2024, 1, 5);
        s.ensure_horizon_at(today).await.unwrap();
        let rule = s.rule(id).unwrap();
        let reach = (s.last_instance_date(rule).unwrap() - today).num_days();
        assert!(reach >= horizon_days);
    }
}
