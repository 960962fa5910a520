use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::scheduler::Scheduler;
use cadence_core::store::TaskStore;
use cadence_core::timezone::today_in;

use crate::cli::PreviewCommand;
use crate::util::resolve_rule_id;
use crate::views::table::display_dates;

pub fn preview<S: TaskStore>(scheduler: &Scheduler<S>, command: PreviewCommand) -> Result<()> {
    let rule_id = resolve_rule_id(scheduler, &command.id)?;
    let dates = scheduler
        .preview(rule_id, command.count)
        .ok_or_else(|| anyhow!(CoreError::NotFound(format!("Rule '{}' not found", command.id))))?;

    if let Some(rule) = scheduler.rule(rule_id) {
        println!("Next occurrences of '{}' ({}):", rule.description, rule.describe());
    }
    display_dates(&dates, today_in(scheduler.config().timezone));
    Ok(())
}
