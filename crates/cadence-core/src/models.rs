use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CoreError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| CoreError::InvalidDate(format!("'{}' is not a YYYY-MM-DD date", s)))
}

/// Parses a 24-hour `HH:MM` clock time (seconds are tolerated and dropped).
pub fn parse_clock_time(s: &str) -> Result<NaiveTime, CoreError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| CoreError::InvalidInput(format!("'{}' is not an HH:MM time", s)))
}

/// Serde adapter storing `Option<NaiveTime>` as `"HH:MM"`.
pub(crate) mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => serializer.serialize_some(&t.format(super::TIME_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| super::parse_clock_time(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task status: {0}")]
pub struct ParseTaskStatusError(String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" | "todo" => Ok(TaskStatus::Pending),
            "completed" | "done" => Ok(TaskStatus::Completed),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Task priority, ordered from most to least urgent (rank 1..=3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl TaskPriority {
    pub fn rank(self) -> u8 {
        match self {
            TaskPriority::High => 1,
            TaskPriority::Medium => 2,
            TaskPriority::Low => 3,
        }
    }

    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            1 => Some(TaskPriority::High),
            2 => Some(TaskPriority::Medium),
            3 => Some(TaskPriority::Low),
            _ => None,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task priority: {0}")]
pub struct ParseTaskPriorityError(String);

impl FromStr for TaskPriority {
    type Err = ParseTaskPriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" | "1" => Ok(TaskPriority::High),
            "medium" | "2" => Ok(TaskPriority::Medium),
            "low" | "3" => Ok(TaskPriority::Low),
            _ => Err(ParseTaskPriorityError(s.to_string())),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPriority::High => write!(f, "high"),
            TaskPriority::Medium => write!(f, "medium"),
            TaskPriority::Low => write!(f, "low"),
        }
    }
}

/// A concrete, dated task. Recurring instances carry `parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    #[serde(default, with = "clock_time")]
    pub time: Option<NaiveTime>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    #[serde(default)]
    pub reminders: Vec<u32>,
    pub notes: Option<String>,
    /// Back-reference to the owning rule, used for lookup only
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            description: String::new(),
            due_date: None,
            time: None,
            priority: TaskPriority::Medium,
            status: TaskStatus::Pending,
            reminders: Vec::new(),
            notes: None,
            parent_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

impl Task {
    /// Builds a pending instance of `rule` due on `date`.
    pub fn instance_of(rule: &RecurrenceRule, date: NaiveDate) -> Self {
        Self {
            description: rule.description.clone(),
            due_date: Some(date),
            time: rule.time,
            priority: rule.priority,
            reminders: rule.reminders.clone(),
            notes: rule.notes.clone(),
            parent_id: Some(rule.id),
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_recurring_instance(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Agenda ordering: date, then time, then priority; undated tasks last.
    pub fn agenda_key(&self) -> (NaiveDate, NaiveTime, TaskPriority) {
        (
            self.due_date.unwrap_or(NaiveDate::MAX),
            self.time.unwrap_or(NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)),
            self.priority,
        )
    }
}

// ============================================================================
// Recurrence Rule
// ============================================================================

/// Recurrence pattern with its type-specific anchors.
///
/// Absent anchors fall back to the anchor date: an empty weekday set means
/// "the anchor's weekday", a missing day means "the anchor's day", clamped
/// to the target month's length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "recurrence_type", rename_all = "snake_case")]
pub enum RecurrencePattern {
    Daily,
    Weekly {
        /// 0 = Monday .. 6 = Sunday
        #[serde(default)]
        week_days: BTreeSet<u8>,
    },
    Monthly {
        #[serde(default)]
        day_of_month: Option<u32>,
    },
    Yearly {
        #[serde(default)]
        month_of_year: Option<u32>,
        #[serde(default)]
        day_of_month: Option<u32>,
    },
}

const WEEKDAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

impl RecurrencePattern {
    pub fn weekly(days: impl IntoIterator<Item = u8>) -> Self {
        RecurrencePattern::Weekly { week_days: days.into_iter().collect() }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            RecurrencePattern::Daily => Ok(()),
            RecurrencePattern::Weekly { week_days } => match week_days.iter().find(|d| **d > 6) {
                Some(d) => Err(CoreError::InvalidInput(format!("weekday index out of range (0-6): {}", d))),
                None => Ok(()),
            },
            RecurrencePattern::Monthly { day_of_month } => validate_day(*day_of_month),
            RecurrencePattern::Yearly { month_of_year, day_of_month } => {
                if let Some(m) = month_of_year {
                    if !(1..=12).contains(m) {
                        return Err(CoreError::InvalidInput(format!("month out of range (1-12): {}", m)));
                    }
                }
                validate_day(*day_of_month)
            }
        }
    }

    /// Fills every implicit anchor from `start_date`.
    ///
    /// Batches are anchored at the last generated instance, which may carry
    /// a clamped day (Feb 29 for a day-31 rule); resolving against the
    /// rule's start date keeps later batches on the intended day.
    pub fn resolve_against(&self, start_date: NaiveDate) -> Self {
        match self {
            RecurrencePattern::Daily => RecurrencePattern::Daily,
            RecurrencePattern::Weekly { week_days } if week_days.is_empty() => {
                RecurrencePattern::weekly([start_date.weekday().num_days_from_monday() as u8])
            }
            RecurrencePattern::Weekly { week_days } => RecurrencePattern::Weekly { week_days: week_days.clone() },
            RecurrencePattern::Monthly { day_of_month } => RecurrencePattern::Monthly {
                day_of_month: Some(day_of_month.unwrap_or(start_date.day())),
            },
            RecurrencePattern::Yearly { month_of_year, day_of_month } => RecurrencePattern::Yearly {
                month_of_year: Some(month_of_year.unwrap_or(start_date.month())),
                day_of_month: Some(day_of_month.unwrap_or(start_date.day())),
            },
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly { .. } => "weekly",
            RecurrencePattern::Monthly { .. } => "monthly",
            RecurrencePattern::Yearly { .. } => "yearly",
        }
    }

    fn unit(&self) -> &'static str {
        match self {
            RecurrencePattern::Daily => "day",
            RecurrencePattern::Weekly { .. } => "week",
            RecurrencePattern::Monthly { .. } => "month",
            RecurrencePattern::Yearly { .. } => "year",
        }
    }

    /// Human description such as "Every 2 weeks on Mon, Wed".
    pub fn describe(&self, interval: u32) -> String {
        let mut out = if interval <= 1 {
            let mut name = self.type_name().to_string();
            name[..1].make_ascii_uppercase();
            name
        } else {
            format!("Every {} {}s", interval, self.unit())
        };

        match self {
            RecurrencePattern::Daily => {}
            RecurrencePattern::Weekly { week_days } if !week_days.is_empty() => {
                let names: Vec<&str> = week_days
                    .iter()
                    .filter_map(|d| WEEKDAY_NAMES.get(*d as usize).copied())
                    .collect();
                out.push_str(&format!(" on {}", names.join(", ")));
            }
            RecurrencePattern::Weekly { .. } => {}
            RecurrencePattern::Monthly { day_of_month: Some(day) } => {
                out.push_str(&format!(" on day {}", day));
            }
            RecurrencePattern::Monthly { day_of_month: None } => {}
            RecurrencePattern::Yearly { month_of_year, day_of_month } => match (month_of_year, day_of_month) {
                (Some(m), Some(d)) => out.push_str(&format!(" on {}/{}", m, d)),
                (Some(m), None) => out.push_str(&format!(" in month {}", m)),
                (None, Some(d)) => out.push_str(&format!(" on day {}", d)),
                (None, None) => {}
            },
        }
        out
    }
}

fn validate_day(day: Option<u32>) -> Result<(), CoreError> {
    match day {
        Some(d) if !(1..=31).contains(&d) => {
            Err(CoreError::InvalidInput(format!("day of month out of range (1-31): {}", d)))
        }
        _ => Ok(()),
    }
}

/// When a rule stops producing instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "end_type", rename_all = "snake_case")]
pub enum EndCondition {
    #[default]
    Never,
    OnDate { end_date: NaiveDate },
    AfterCount { end_count: u32 },
}

impl EndCondition {
    pub fn end_date(&self) -> Option<NaiveDate> {
        match self {
            EndCondition::OnDate { end_date } => Some(*end_date),
            _ => None,
        }
    }

    pub fn end_count(&self) -> Option<u32> {
        match self {
            EndCondition::AfterCount { end_count } => Some(*end_count),
            _ => None,
        }
    }

    /// Whether `date` falls on or before the end date (always true without one).
    #[inline]
    pub fn admits(&self, date: NaiveDate) -> bool {
        self.end_date().map_or(true, |end| date <= end)
    }
}

impl fmt::Display for EndCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndCondition::Never => write!(f, "No end date"),
            EndCondition::OnDate { end_date } => write!(f, "Until {}", end_date.format(DATE_FORMAT)),
            EndCondition::AfterCount { end_count } => write!(f, "For {} occurrences", end_count),
        }
    }
}

/// The master record of a repeating task.
///
/// The rule owns its instances through `child_tasks` (chronological order);
/// instances only point back through `parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurrenceRule {
    pub id: Uuid,
    pub description: String,
    #[serde(default, with = "clock_time")]
    pub time: Option<NaiveTime>,
    pub priority: TaskPriority,
    #[serde(default)]
    pub reminders: Vec<u32>,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub pattern: RecurrencePattern,
    pub interval: u32,
    pub start_date: NaiveDate,
    #[serde(flatten)]
    pub end: EndCondition,
    /// Generation counter: incremented per generated instance, reset only by
    /// regeneration. Deleting a single instance does not decrement it.
    pub generated_count: u32,
    pub child_tasks: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurrenceRule {
    pub fn from_new(data: NewRuleData) -> Self {
        let now = Utc::now();
        let mut reminders = data.reminders;
        reminders.sort_unstable();
        Self {
            id: Uuid::new_v4(),
            description: data.description,
            time: data.time,
            priority: data.priority,
            reminders,
            notes: data.notes,
            pattern: data.pattern,
            interval: data.interval,
            start_date: data.start_date,
            end: data.end,
            generated_count: 0,
            child_tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of instances currently linked to the rule.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.child_tasks.len()
    }

    /// True once an occurrence-count termination has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.end
            .end_count()
            .map_or(false, |limit| self.generated_count >= limit)
    }

    /// Caps a requested batch size by the remaining `end_count` budget.
    pub fn remaining_budget(&self, requested: usize) -> usize {
        match self.end.end_count() {
            Some(limit) => requested.min(limit.saturating_sub(self.generated_count) as usize),
            None => requested,
        }
    }

    pub fn describe(&self) -> String {
        self.pattern.describe(self.interval)
    }
}

/// A single entry of the task store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskRecord {
    Task(Task),
    Rule(RecurrenceRule),
}

impl TaskRecord {
    pub fn id(&self) -> Uuid {
        match self {
            TaskRecord::Task(t) => t.id,
            TaskRecord::Rule(r) => r.id,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            TaskRecord::Task(t) => &t.description,
            TaskRecord::Rule(r) => &r.description,
        }
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self {
            TaskRecord::Task(t) => Some(t),
            TaskRecord::Rule(_) => None,
        }
    }

    pub fn as_task_mut(&mut self) -> Option<&mut Task> {
        match self {
            TaskRecord::Task(t) => Some(t),
            TaskRecord::Rule(_) => None,
        }
    }

    pub fn as_rule(&self) -> Option<&RecurrenceRule> {
        match self {
            TaskRecord::Rule(r) => Some(r),
            TaskRecord::Task(_) => None,
        }
    }

    pub fn as_rule_mut(&mut self) -> Option<&mut RecurrenceRule> {
        match self {
            TaskRecord::Rule(r) => Some(r),
            TaskRecord::Task(_) => None,
        }
    }
}

// ============================================================================
// Data Transfer Objects (DTOs) for Rule Operations
// ============================================================================

/// Data required to create a new recurrence rule
#[derive(Debug, Clone)]
pub struct NewRuleData {
    pub description: String,
    /// First occurrence and anchor of the rule
    pub start_date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub priority: TaskPriority,
    pub pattern: RecurrencePattern,
    pub interval: u32,
    pub end: EndCondition,
    /// Minutes before each occurrence
    pub reminders: Vec<u32>,
    pub notes: Option<String>,
}

impl NewRuleData {
    pub fn new(description: impl Into<String>, start_date: NaiveDate, pattern: RecurrencePattern) -> Self {
        Self {
            description: description.into(),
            start_date,
            time: None,
            priority: TaskPriority::Medium,
            pattern,
            interval: 1,
            end: EndCondition::Never,
            reminders: Vec::new(),
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.description.trim().is_empty() {
            return Err(CoreError::InvalidInput("description must not be empty".to_string()));
        }
        validate_interval(self.interval)?;
        validate_end(&self.end)?;
        self.pattern.validate()
    }
}

/// Largest accepted repeat interval, in units of the pattern's frequency.
pub const MAX_INTERVAL: u32 = 1000;

pub(crate) fn validate_interval(interval: u32) -> Result<(), CoreError> {
    if interval == 0 {
        return Err(CoreError::InvalidInput("interval must be at least 1".to_string()));
    }
    if interval > MAX_INTERVAL {
        return Err(CoreError::InvalidInput(format!(
            "interval must be at most {}",
            MAX_INTERVAL
        )));
    }
    Ok(())
}

pub(crate) fn validate_end(end: &EndCondition) -> Result<(), CoreError> {
    if let EndCondition::AfterCount { end_count: 0 } = end {
        return Err(CoreError::InvalidInput("end count must be at least 1".to_string()));
    }
    Ok(())
}

/// Data for modifying an existing rule.
///
/// `start_date`, `pattern` and `interval` are structural: changing any of
/// them regenerates every instance. The other fields are applied in place.
#[derive(Debug, Clone, Default)]
pub struct UpdateRuleData {
    pub description: Option<String>,
    pub time: Option<Option<NaiveTime>>,
    pub priority: Option<TaskPriority>,
    pub reminders: Option<Vec<u32>>,
    pub notes: Option<Option<String>>,
    pub end: Option<EndCondition>,
    pub start_date: Option<NaiveDate>,
    pub pattern: Option<RecurrencePattern>,
    pub interval: Option<u32>,
}

impl UpdateRuleData {
    /// Whether applying this update to `rule` changes a structural field.
    pub fn is_structural_for(&self, rule: &RecurrenceRule) -> bool {
        self.start_date.map_or(false, |d| d != rule.start_date)
            || self.pattern.as_ref().map_or(false, |p| *p != rule.pattern)
            || self.interval.map_or(false, |i| i != rule.interval)
    }
}

/// Tuning for instance generation and horizon maintenance
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Minimum number of days of future instances to keep per rule
    pub horizon_days: i64,
    /// Instances generated per batch
    pub batch_size: usize,
    /// Upper bound on batches per rule in a single horizon pass
    pub max_batches_per_pass: usize,
    /// Zone used to decide what "today" is
    pub timezone: Tz,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            horizon_days: 90,
            batch_size: 10,
            max_batches_per_pass: 52,
            timezone: Tz::UTC,
        }
    }
}
