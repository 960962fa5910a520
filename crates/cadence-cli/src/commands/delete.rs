use anyhow::Result;
use cadence_core::scheduler::{RuleLifecycle, Scheduler};
use cadence_core::store::TaskStore;
use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};

use crate::cli::DeleteCommand;
use crate::util::resolve_id;

pub async fn delete<S: TaskStore>(scheduler: &mut Scheduler<S>, command: DeleteCommand) -> Result<()> {
    let id = resolve_id(scheduler, &command.id)?;

    let prompt = match (scheduler.rule(id), scheduler.task(id)) {
        (Some(rule), _) => format!(
            "Delete rule '{}' and its {} instance(s)?",
            rule.description,
            rule.live_count()
        ),
        (None, Some(task)) => format!("Delete task '{}'?", task.description),
        (None, None) => format!("Delete '{}'?", command.id),
    };

    if !command.force {
        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false);
        if !confirmed {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    let is_rule = scheduler.rule(id).is_some();
    if scheduler.delete_task(id).await? {
        let what = if is_rule { "rule" } else { "task" };
        println!("{} Deleted {} {}", "✓".style(Style::new().green().bold()), what, id);
    } else {
        println!("Nothing to delete for '{}'.", command.id);
    }
    Ok(())
}
