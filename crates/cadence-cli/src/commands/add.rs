use anyhow::Result;
use cadence_core::models::{NewRuleData, DATE_FORMAT};
use cadence_core::scheduler::{RuleLifecycle, Scheduler};
use cadence_core::store::TaskStore;
use cadence_core::timezone::today_in;
use owo_colors::{OwoColorize, Style};

use crate::cli::AddCommand;
use crate::parser::{parse_date_input, parse_time_input};
use crate::util::{build_end, build_pattern};

pub async fn add_rule<S: TaskStore>(scheduler: &mut Scheduler<S>, command: AddCommand) -> Result<()> {
    let tz = scheduler.config().timezone;
    let start_date = match &command.start {
        Some(start) => parse_date_input(start, tz)?,
        None => today_in(tz),
    };
    let pattern = build_pattern(command.every, &command.pattern)?;

    let mut data = NewRuleData::new(command.description, start_date, pattern);
    data.time = command.at.as_deref().map(parse_time_input).transpose()?;
    if let Some(priority) = command.priority {
        data.priority = priority;
    }
    if let Some(interval) = command.pattern.interval {
        data.interval = interval;
    }
    if let Some(end) = build_end(command.until.as_deref(), command.count, tz)? {
        data.end = end;
    }
    data.reminders = command.reminders;
    data.notes = command.notes;

    let rule_id = scheduler.create_rule(data).await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();
    if let Some(rule) = scheduler.rule(rule_id) {
        println!(
            "{} Created rule: {}",
            "✓".style(success_style),
            rule.description.bright_white().bold()
        );
        println!("  {} {}, starting {}", "→".style(info_style), rule.describe(), rule.start_date.format(DATE_FORMAT));
        println!("  {} {}", "→".style(info_style), rule.end);
    }
    println!("Rule ID: {}", rule_id);

    Ok(())
}
