use anyhow::Result;
use cadence_core::scheduler::Scheduler;
use cadence_core::store::TaskStore;
use owo_colors::{OwoColorize, Style};

use crate::cli::CheckCommand;

pub async fn check<S: TaskStore>(scheduler: &mut Scheduler<S>, command: CheckCommand) -> Result<()> {
    let report = scheduler.verify_integrity(command.repair).await?;

    if report.is_clean() {
        println!(
            "{} {} record(s) checked, no problems found",
            "✓".style(Style::new().green().bold()),
            report.records_checked
        );
        return Ok(());
    }

    println!("{} problem(s) in {} record(s):", report.issues.len(), report.records_checked);
    for issue in &report.issues {
        println!("  {} {}", "•".yellow(), issue);
    }
    if report.repaired {
        println!("{} Repaired", "✓".style(Style::new().green().bold()));
    } else {
        println!("Run with --repair to fix them.");
    }
    Ok(())
}
