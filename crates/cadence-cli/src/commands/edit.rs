use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::models::{EndCondition, UpdateRuleData};
use cadence_core::scheduler::{RuleLifecycle, Scheduler};
use cadence_core::store::TaskStore;
use owo_colors::{OwoColorize, Style};

use crate::cli::EditCommand;
use crate::parser::{parse_date_input, parse_time_input};
use crate::util::{build_end, frequency_of, merge_pattern, resolve_rule_id};

fn build_update<S: TaskStore>(scheduler: &Scheduler<S>, command: &EditCommand, rule_id: uuid::Uuid) -> Result<UpdateRuleData> {
    let tz = scheduler.config().timezone;
    let rule = scheduler
        .rule(rule_id)
        .ok_or_else(|| anyhow!(CoreError::NotFound(format!("Rule '{}' not found", command.id))))?;

    let mut update = UpdateRuleData {
        description: command.description.clone(),
        priority: command.priority,
        reminders: command.reminders.clone(),
        interval: command.pattern.interval,
        ..Default::default()
    };

    if command.clear_time {
        update.time = Some(None);
    } else if let Some(at) = &command.at {
        update.time = Some(Some(parse_time_input(at)?));
    }

    if command.clear_notes {
        update.notes = Some(None);
    } else if let Some(notes) = &command.notes {
        update.notes = Some(Some(notes.clone()));
    }

    if let Some(start) = &command.start {
        update.start_date = Some(parse_date_input(start, tz)?);
    }

    let pattern_args = &command.pattern;
    if command.every.is_some() || pattern_args.on.is_some() || pattern_args.day.is_some() || pattern_args.month.is_some() {
        let every = command.every.unwrap_or_else(|| frequency_of(&rule.pattern));
        update.pattern = Some(merge_pattern(&rule.pattern, every, pattern_args)?);
    }

    update.end = if command.forever {
        Some(EndCondition::Never)
    } else {
        build_end(command.until.as_deref(), command.count, tz)?
    };

    Ok(update)
}

pub async fn edit_rule<S: TaskStore>(scheduler: &mut Scheduler<S>, command: EditCommand) -> Result<()> {
    let rule_id = resolve_rule_id(scheduler, &command.id)?;
    let update = build_update(scheduler, &command, rule_id)?;
    let structural = scheduler
        .rule(rule_id)
        .map_or(false, |rule| update.is_structural_for(rule));
    let end_changed = update.end.is_some();

    if !scheduler.update_rule(rule_id, update).await? {
        return Err(anyhow!(CoreError::NotFound(format!("Rule '{}' not found", command.id))));
    }

    let success_style = Style::new().green().bold();
    if let Some(rule) = scheduler.rule(rule_id) {
        println!("{} Updated rule: {}", "✓".style(success_style), rule.description.bold());
        if structural {
            println!(
                "  {} Schedule changed, instances regenerated ({} now)",
                "→".blue(),
                rule.live_count()
            );
        } else if end_changed {
            println!("  {} End condition changed ({} instances now)", "→".blue(), rule.live_count());
        }
    }
    Ok(())
}
