use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::models::{EndCondition, RecurrencePattern};
use cadence_core::scheduler::Scheduler;
use cadence_core::store::TaskStore;
use chrono_tz::Tz;
use uuid::Uuid;

use crate::cli::{Frequency, PatternArgs};
use crate::parser::{parse_date_input, parse_weekdays};

pub fn resolve_id<S: TaskStore>(scheduler: &Scheduler<S>, short_id: &str) -> Result<Uuid> {
    scheduler.resolve_id(short_id).map_err(|e| anyhow!(e))
}

/// Resolves `short_id` and requires it to name a recurrence rule.
pub fn resolve_rule_id<S: TaskStore>(scheduler: &Scheduler<S>, short_id: &str) -> Result<Uuid> {
    let id = resolve_id(scheduler, short_id)?;
    if scheduler.rule(id).is_none() {
        return Err(anyhow!(CoreError::InvalidInput(format!(
            "'{}' is a task, not a recurrence rule",
            short_id
        ))));
    }
    Ok(id)
}

/// Builds a pattern from the frequency and its anchor flags, rejecting flags
/// that do not apply to the frequency.
pub fn build_pattern(every: Frequency, args: &PatternArgs) -> Result<RecurrencePattern> {
    let reject = |flag: &str| {
        anyhow!(CoreError::InvalidInput(format!(
            "--{} does not apply to {:?} rules",
            flag,
            every
        )))
    };

    let pattern = match every {
        Frequency::Daily => {
            if args.on.is_some() {
                return Err(reject("on"));
            }
            if args.day.is_some() {
                return Err(reject("day"));
            }
            if args.month.is_some() {
                return Err(reject("month"));
            }
            RecurrencePattern::Daily
        }
        Frequency::Weekly => {
            if args.day.is_some() {
                return Err(reject("day"));
            }
            if args.month.is_some() {
                return Err(reject("month"));
            }
            let week_days = match &args.on {
                Some(on) => parse_weekdays(on)?,
                None => Default::default(),
            };
            RecurrencePattern::Weekly { week_days }
        }
        Frequency::Monthly => {
            if args.on.is_some() {
                return Err(reject("on"));
            }
            if args.month.is_some() {
                return Err(reject("month"));
            }
            RecurrencePattern::Monthly { day_of_month: args.day }
        }
        Frequency::Yearly => {
            if args.on.is_some() {
                return Err(reject("on"));
            }
            RecurrencePattern::Yearly {
                month_of_year: args.month,
                day_of_month: args.day,
            }
        }
    };

    pattern.validate()?;
    Ok(pattern)
}

/// Applies anchor flags to an existing pattern. With the same frequency,
/// anchors not given on the command line keep their stored values;
/// a new frequency starts from scratch.
pub fn merge_pattern(base: &RecurrencePattern, every: Frequency, args: &PatternArgs) -> Result<RecurrencePattern> {
    let supplied = build_pattern(every, args)?;
    if frequency_of(base) != every {
        return Ok(supplied);
    }

    let merged = match (base, supplied) {
        (RecurrencePattern::Weekly { week_days }, RecurrencePattern::Weekly { .. }) if args.on.is_none() => {
            RecurrencePattern::Weekly { week_days: week_days.clone() }
        }
        (RecurrencePattern::Monthly { day_of_month }, RecurrencePattern::Monthly { day_of_month: day }) => {
            RecurrencePattern::Monthly { day_of_month: day.or(*day_of_month) }
        }
        (
            RecurrencePattern::Yearly { month_of_year, day_of_month },
            RecurrencePattern::Yearly { month_of_year: month, day_of_month: day },
        ) => RecurrencePattern::Yearly {
            month_of_year: month.or(*month_of_year),
            day_of_month: day.or(*day_of_month),
        },
        (_, supplied) => supplied,
    };

    merged.validate()?;
    Ok(merged)
}

/// Maps a stored pattern back to its frequency.
pub fn frequency_of(pattern: &RecurrencePattern) -> Frequency {
    match pattern {
        RecurrencePattern::Daily => Frequency::Daily,
        RecurrencePattern::Weekly { .. } => Frequency::Weekly,
        RecurrencePattern::Monthly { .. } => Frequency::Monthly,
        RecurrencePattern::Yearly { .. } => Frequency::Yearly,
    }
}

pub fn build_end(until: Option<&str>, count: Option<u32>, tz: Tz) -> Result<Option<EndCondition>> {
    match (until, count) {
        (Some(_), Some(_)) => Err(anyhow!(CoreError::InvalidInput(
            "--until and --count cannot be combined".to_string()
        ))),
        (Some(until), None) => Ok(Some(EndCondition::OnDate {
            end_date: parse_date_input(until, tz)?,
        })),
        (None, Some(end_count)) => Ok(Some(EndCondition::AfterCount { end_count })),
        (None, None) => Ok(None),
    }
}

/// First eight characters of an ID, as shown in tables.
pub fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}
