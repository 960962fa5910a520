use cadence_core::models::{RecurrenceRule, Task, TaskPriority, TaskStatus, DATE_FORMAT, TIME_FORMAT};
use chrono::{Duration, NaiveDate, NaiveTime};
use chrono_humanize::HumanTime;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use uuid::Uuid;

use crate::util::short_id;

#[derive(Debug, Clone)]
pub struct ViewTask {
    pub id: Uuid,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub recurring: bool,
}

impl From<&Task> for ViewTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            description: task.description.clone(),
            due_date: task.due_date,
            time: task.time,
            priority: task.priority,
            status: task.status,
            recurring: task.is_recurring_instance(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewRule {
    pub id: Uuid,
    pub description: String,
    pub pattern: String,
    pub ends: String,
    pub start_date: NaiveDate,
    pub live: usize,
    pub generated: u32,
    pub next: Option<NaiveDate>,
}

impl ViewRule {
    /// `next` is the first pending instance on or after `today`.
    pub fn new(rule: &RecurrenceRule, instances: &[&Task], today: NaiveDate) -> Self {
        let next = instances
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .filter_map(|t| t.due_date)
            .find(|d| *d >= today);
        Self {
            id: rule.id,
            description: rule.description.clone(),
            pattern: rule.describe(),
            ends: rule.end.to_string(),
            start_date: rule.start_date,
            live: rule.live_count(),
            generated: rule.generated_count,
            next,
        }
    }
}

/// "today", "tomorrow", "yesterday" or a humanized distance like "in 5 days".
pub fn relative_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "yesterday".to_string(),
        days => HumanTime::from(Duration::days(days)).to_string(),
    }
}

fn priority_cell(priority: TaskPriority) -> Cell {
    let cell = Cell::new(priority.to_string());
    match priority {
        TaskPriority::High => cell.fg(Color::Red).add_attribute(Attribute::Bold),
        TaskPriority::Medium => cell.fg(Color::Yellow),
        TaskPriority::Low => cell.fg(Color::Green),
    }
}

pub fn display_tasks(tasks: &[ViewTask], today: NaiveDate) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Description", "Due", "Time", "Priority", "Status"]);

    for task in tasks {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(task.id)));

        let mut name = String::new();
        if task.recurring {
            name.push_str("↻ ");
        }
        name.push_str(&task.description);
        let name_cell = match task.status {
            TaskStatus::Completed => Cell::new(name)
                .add_attribute(Attribute::CrossedOut)
                .fg(Color::DarkGrey),
            TaskStatus::Pending => Cell::new(name),
        };
        row.add_cell(name_cell);

        let due_cell = match task.due_date {
            Some(due) => {
                let text = format!("{} ({})", due.format(DATE_FORMAT), relative_label(due, today));
                if task.status == TaskStatus::Completed {
                    Cell::new(text)
                } else if due < today {
                    Cell::new(text).fg(Color::Red)
                } else if due == today {
                    Cell::new(text).fg(Color::Yellow)
                } else {
                    Cell::new(text)
                }
            }
            None => Cell::new("-"),
        };
        row.add_cell(due_cell);

        row.add_cell(Cell::new(
            task.time
                .map(|t| t.format(TIME_FORMAT).to_string())
                .unwrap_or_else(|| "-".to_string()),
        ));
        row.add_cell(priority_cell(task.priority));

        let status_cell = match task.status {
            TaskStatus::Completed => Cell::new(task.status.to_string()).fg(Color::Green),
            TaskStatus::Pending => Cell::new(task.status.to_string()),
        };
        row.add_cell(status_cell);

        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_rules(rules: &[ViewRule], today: NaiveDate) {
    if rules.is_empty() {
        println!("No rules found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Description", "Pattern", "Ends", "Start", "Instances", "Next"]);

    for rule in rules {
        let next = match rule.next {
            Some(date) => Cell::new(format!("{} ({})", date.format(DATE_FORMAT), relative_label(date, today))),
            None => Cell::new("-").fg(Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(short_id(rule.id)),
            Cell::new(&rule.description).add_attribute(Attribute::Bold),
            Cell::new(&rule.pattern),
            Cell::new(&rule.ends),
            Cell::new(rule.start_date.format(DATE_FORMAT)),
            Cell::new(format!("{}/{}", rule.live, rule.generated)),
            next,
        ]);
    }

    println!("{table}");
}

pub fn display_dates(dates: &[NaiveDate], today: NaiveDate) {
    if dates.is_empty() {
        println!("No upcoming occurrences.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Date", "Weekday", "When"]);
    for (i, date) in dates.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(date.format(DATE_FORMAT)),
            Cell::new(date.format("%A")),
            Cell::new(relative_label(*date, today)),
        ]);
    }

    println!("{table}");
}
