use anyhow::Result;
use cadence_core::error::CoreError;
use cadence_core::scheduler::{HorizonMaintenance, Scheduler};
use cadence_core::store::SqliteStore;
use clap::Parser;
use owo_colors::{OwoColorize, Style};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod parser;
mod timezone;
mod util;
mod views;

use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cadence=warn,cadence_core=warn,cadence_cli=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::new().unwrap_or_else(|e| {
        warn!(error = %e, "invalid configuration, using defaults");
        Config::default()
    });

    if let Err(e) = run(cli.command, &config).await {
        handle_error(e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &Config) -> Result<()> {
    let scheduler_config = config.scheduler_config()?;
    let store = SqliteStore::open(&config.database_path).await?;
    let mut scheduler = Scheduler::new(store, scheduler_config);

    let is_horizon = matches!(command, Commands::Horizon);
    let mutating = command.is_mutating();
    if !is_horizon {
        let summary = scheduler.ensure_horizon().await?;
        debug!(created = summary.instances_created, "startup horizon pass");
    }

    match command {
        Commands::Add(command) => commands::add::add_rule(&mut scheduler, command).await?,
        Commands::Rules => commands::rules::list_rules(&scheduler)?,
        Commands::Show(command) => commands::show::show(&scheduler, command)?,
        Commands::List(command) => commands::list::list_tasks(&scheduler, command)?,
        Commands::Edit(command) => commands::edit::edit_rule(&mut scheduler, command).await?,
        Commands::Delete(command) => commands::delete::delete(&mut scheduler, command).await?,
        Commands::More(command) => commands::more::generate_more(&mut scheduler, command).await?,
        Commands::Preview(command) => commands::preview::preview(&scheduler, command)?,
        Commands::Horizon => commands::horizon::run_horizon(&mut scheduler).await?,
        Commands::Do(command) => commands::r#do::do_task(&mut scheduler, command).await?,
        Commands::Undo(command) => commands::r#do::undo_task(&mut scheduler, command).await?,
        Commands::Check(command) => commands::check::check(&mut scheduler, command).await?,
    }

    if mutating {
        scheduler.ensure_horizon().await?;
    }
    Ok(())
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    match err.downcast_ref::<CoreError>() {
        Some(CoreError::NotFound(s)) => {
            eprintln!("{} {}", "Error:".style(error_style), s);
        }
        Some(CoreError::AmbiguousId(candidates)) => {
            eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
            eprintln!("Did you mean one of these?");
            for (id, description) in candidates {
                eprintln!("  {} ({})", id.yellow(), description);
            }
        }
        Some(CoreError::InvalidInput(s)) => {
            eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
        }
        Some(CoreError::InvalidDate(s)) => {
            eprintln!("{} Invalid date: {}", "Error:".style(error_style), s);
        }
        Some(CoreError::InvalidTimezone(tz)) => {
            eprintln!("{} Unknown timezone '{}'", "Error:".style(error_style), tz);
            eprintln!("Did you mean one of these?");
            for suggestion in timezone::suggest_timezone(tz) {
                eprintln!("  {}", suggestion.yellow());
            }
        }
        _ => eprintln!("{} {}", "Error:".style(error_style), err),
    }
}
