use cadence_core::models::{TaskPriority, TaskStatus};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Recurring-task scheduler: define rules once, get dated instances ahead of time
#[derive(Parser, Debug)]
#[command(name = "cadence", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a recurrence rule
    Add(AddCommand),
    /// List recurrence rules
    Rules,
    /// Show a rule and its instances
    Show(IdCommand),
    /// List task instances (the agenda)
    List(ListCommand),
    /// Edit a recurrence rule
    Edit(EditCommand),
    /// Delete a rule with its instances, or a single task
    Delete(DeleteCommand),
    /// Generate more instances of a rule
    More(MoreCommand),
    /// Preview upcoming occurrence dates without storing them
    Preview(PreviewCommand),
    /// Run horizon maintenance and report what changed
    Horizon,
    /// Mark a task as completed
    Do(IdCommand),
    /// Mark a task as pending again
    Undo(IdCommand),
    /// Check rule and instance links
    Check(CheckCommand),
}

impl Commands {
    /// Whether the command changes stored records.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Commands::Add(_)
                | Commands::Edit(_)
                | Commands::Delete(_)
                | Commands::More(_)
                | Commands::Do(_)
                | Commands::Undo(_)
                | Commands::Check(CheckCommand { repair: true })
        )
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Pattern anchors shared by `add` and `edit`
#[derive(Args, Debug, Clone, Default)]
pub struct PatternArgs {
    /// Repeat every N units (days, weeks, months, years)
    #[arg(long)]
    pub interval: Option<u32>,
    /// Weekdays for weekly rules (mon,wed,fri | weekdays | weekends)
    #[arg(long)]
    pub on: Option<String>,
    /// Day of month for monthly and yearly rules (1-31)
    #[arg(long)]
    pub day: Option<u32>,
    /// Month for yearly rules (1-12)
    #[arg(long)]
    pub month: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// What the task is
    pub description: String,
    /// First occurrence (YYYY-MM-DD or 'tomorrow', 'next monday'); defaults to today
    #[arg(short, long)]
    pub start: Option<String>,
    /// Time of day (e.g. '14:30', '9:00 AM')
    #[arg(long)]
    pub at: Option<String>,
    /// high, medium or low
    #[arg(short, long)]
    pub priority: Option<TaskPriority>,
    /// How the rule repeats
    #[arg(short, long, value_enum, default_value_t = Frequency::Daily)]
    pub every: Frequency,
    #[command(flatten)]
    pub pattern: PatternArgs,
    /// Last date an instance may fall on
    #[arg(long, conflicts_with = "count")]
    pub until: Option<String>,
    /// Total number of occurrences
    #[arg(long)]
    pub count: Option<u32>,
    /// Reminder offsets in minutes before the task
    #[arg(long = "remind", num_args = 1..)]
    pub reminders: Vec<u32>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct IdCommand {
    /// Full ID or unique prefix (at least 2 characters)
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Earliest due date
    #[arg(long)]
    pub from: Option<String>,
    /// Latest due date
    #[arg(long)]
    pub to: Option<String>,
    /// pending or completed
    #[arg(long)]
    pub status: Option<TaskStatus>,
    /// Only tasks due today
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub today: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The rule to edit
    pub id: String,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub at: Option<String>,
    #[arg(long, conflicts_with = "at")]
    pub clear_time: bool,

    #[arg(long)]
    pub priority: Option<TaskPriority>,

    /// Replace reminder offsets (minutes)
    #[arg(long = "remind", num_args = 1..)]
    pub reminders: Option<Vec<u32>>,

    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long, conflicts_with = "notes")]
    pub clear_notes: bool,

    /// New start date (regenerates instances)
    #[arg(long)]
    pub start: Option<String>,
    /// New frequency (regenerates instances)
    #[arg(long, value_enum)]
    pub every: Option<Frequency>,
    #[command(flatten)]
    pub pattern: PatternArgs,

    #[arg(long, conflicts_with_all = ["count", "forever"])]
    pub until: Option<String>,
    #[arg(long, conflicts_with = "forever")]
    pub count: Option<u32>,
    /// Remove the end condition
    #[arg(long)]
    pub forever: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct MoreCommand {
    pub id: String,
    /// Number of instances to generate (defaults to the configured batch size)
    #[arg(short, long)]
    pub count: Option<usize>,
}

#[derive(Parser, Debug, Clone)]
pub struct PreviewCommand {
    pub id: String,
    #[arg(short, long, default_value = "10")]
    pub count: usize,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckCommand {
    /// Fix the problems found
    #[arg(long)]
    pub repair: bool,
}
