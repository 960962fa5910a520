use anyhow::Result;
use cadence_core::models::{DATE_FORMAT, TIME_FORMAT};
use cadence_core::scheduler::Scheduler;
use cadence_core::store::TaskStore;
use cadence_core::timezone::{timezone_abbreviation, today_in};
use chrono::Utc;
use owo_colors::OwoColorize;

use crate::cli::IdCommand;
use crate::util::resolve_id;
use crate::views::table::{display_tasks, ViewTask};

/// Prints a rule with its instances, or a single task.
pub fn show<S: TaskStore>(scheduler: &Scheduler<S>, command: IdCommand) -> Result<()> {
    let id = resolve_id(scheduler, &command.id)?;
    let tz = scheduler.config().timezone;
    let today = today_in(tz);

    if let Some(rule) = scheduler.rule(id) {
        println!("{}", rule.description.bold());
        println!("  ID:        {}", rule.id.to_string().yellow());
        println!("  Pattern:   {}", rule.describe());
        println!("  Starts:    {}", rule.start_date.format(DATE_FORMAT));
        println!("  Ends:      {}", rule.end);
        if let Some(time) = rule.time {
            println!(
                "  Time:      {} {}",
                time.format(TIME_FORMAT),
                timezone_abbreviation(tz, Utc::now())
            );
        }
        println!("  Timezone:  {}", tz);
        println!("  Priority:  {}", rule.priority);
        if !rule.reminders.is_empty() {
            let reminders: Vec<String> = rule.reminders.iter().map(|m| format!("{}m", m)).collect();
            println!("  Reminders: {}", reminders.join(", "));
        }
        if let Some(notes) = &rule.notes {
            println!("  Notes:     {}", notes);
        }
        println!(
            "  Instances: {} live, {} generated",
            rule.live_count(),
            rule.generated_count
        );
        println!();

        let tasks: Vec<ViewTask> = scheduler.instances_of(id).into_iter().map(ViewTask::from).collect();
        display_tasks(&tasks, today);
    } else if let Some(task) = scheduler.task(id) {
        display_tasks(&[ViewTask::from(task)], today);
        match task.parent_id.and_then(|parent| scheduler.rule(parent)) {
            Some(rule) => println!("Instance of rule {} ({})", rule.id.to_string().yellow(), rule.description),
            None => println!("Standalone task"),
        }
        if let Some(notes) = &task.notes {
            println!("Notes: {}", notes);
        }
    }

    Ok(())
}
