use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::models::TaskStatus;
use cadence_core::scheduler::{RuleLifecycle, Scheduler};
use cadence_core::store::TaskStore;
use owo_colors::{OwoColorize, Style};

use crate::cli::IdCommand;
use crate::util::resolve_id;

async fn set_status<S: TaskStore>(scheduler: &mut Scheduler<S>, command: IdCommand, status: TaskStatus) -> Result<()> {
    let task_id = resolve_id(scheduler, &command.id)?;
    if scheduler.rule(task_id).is_some() {
        return Err(anyhow!(CoreError::InvalidInput(format!(
            "'{}' is a recurrence rule; complete one of its instances instead",
            command.id
        ))));
    }

    if !scheduler.set_task_status(task_id, status).await? {
        return Err(anyhow!(CoreError::NotFound(format!("Task '{}' not found", command.id))));
    }

    if let Some(task) = scheduler.task(task_id) {
        let verb = match status {
            TaskStatus::Completed => "Completed",
            TaskStatus::Pending => "Reopened",
        };
        println!("{} {} task: '{}'", "✓".style(Style::new().green().bold()), verb, task.description);
    }
    Ok(())
}

pub async fn do_task<S: TaskStore>(scheduler: &mut Scheduler<S>, command: IdCommand) -> Result<()> {
    set_status(scheduler, command, TaskStatus::Completed).await
}

pub async fn undo_task<S: TaskStore>(scheduler: &mut Scheduler<S>, command: IdCommand) -> Result<()> {
    set_status(scheduler, command, TaskStatus::Pending).await
}
