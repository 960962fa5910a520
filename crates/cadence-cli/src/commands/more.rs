use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::scheduler::{RuleLifecycle, Scheduler};
use cadence_core::store::TaskStore;
use owo_colors::{OwoColorize, Style};

use crate::cli::MoreCommand;
use crate::util::resolve_rule_id;

pub async fn generate_more<S: TaskStore>(scheduler: &mut Scheduler<S>, command: MoreCommand) -> Result<()> {
    let rule_id = resolve_rule_id(scheduler, &command.id)?;
    let count = command.count.unwrap_or(scheduler.config().batch_size);
    if count == 0 {
        return Err(anyhow!(CoreError::InvalidInput("--count must be at least 1".to_string())));
    }

    let before = scheduler.rule(rule_id).map_or(0, |rule| rule.live_count());
    scheduler.generate_more(rule_id, count).await?;
    let Some(rule) = scheduler.rule(rule_id) else {
        return Err(anyhow!(CoreError::NotFound(format!("Rule '{}' not found", command.id))));
    };

    let created = rule.live_count().saturating_sub(before);
    if created == 0 {
        println!("No more occurrences: {}", rule.end);
    } else {
        println!(
            "{} Generated {} instance(s) of '{}'",
            "✓".style(Style::new().green().bold()),
            created,
            rule.description
        );
    }
    Ok(())
}
