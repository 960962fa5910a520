use anyhow::Result;
use cadence_core::query::{select, TaskQuery};
use cadence_core::scheduler::Scheduler;
use cadence_core::store::TaskStore;
use cadence_core::timezone::today_in;

use crate::cli::ListCommand;
use crate::parser::parse_date_input;
use crate::views::table::{display_tasks, ViewTask};

pub fn list_tasks<S: TaskStore>(scheduler: &Scheduler<S>, command: ListCommand) -> Result<()> {
    let tz = scheduler.config().timezone;
    let today = today_in(tz);

    let mut query = if command.today {
        TaskQuery::on(today)
    } else {
        TaskQuery {
            status: None,
            from: command.from.as_deref().map(|d| parse_date_input(d, tz)).transpose()?,
            to: command.to.as_deref().map(|d| parse_date_input(d, tz)).transpose()?,
        }
    };
    query.status = command.status;

    let tasks: Vec<ViewTask> = select(scheduler.store(), &query).iter().map(ViewTask::from).collect();
    display_tasks(&tasks, today);
    Ok(())
}
