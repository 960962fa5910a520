use anyhow::Result;
use cadence_core::scheduler::Scheduler;
use cadence_core::store::TaskStore;
use cadence_core::timezone::today_in;

use crate::views::table::{display_rules, ViewRule};

pub fn list_rules<S: TaskStore>(scheduler: &Scheduler<S>) -> Result<()> {
    let today = today_in(scheduler.config().timezone);
    let rules: Vec<ViewRule> = scheduler
        .rules()
        .into_iter()
        .map(|rule| ViewRule::new(rule, &scheduler.instances_of(rule.id), today))
        .collect();
    display_rules(&rules, today);
    Ok(())
}
