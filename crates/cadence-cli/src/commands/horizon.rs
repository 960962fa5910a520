use anyhow::Result;
use cadence_core::scheduler::{HorizonMaintenance, Scheduler};
use cadence_core::store::TaskStore;
use owo_colors::{OwoColorize, Style};

pub async fn run_horizon<S: TaskStore>(scheduler: &mut Scheduler<S>) -> Result<()> {
    let summary = scheduler.ensure_horizon().await?;
    let horizon_days = scheduler.config().horizon_days;

    if summary.changed() {
        println!(
            "{} Created {} instance(s) across {} rule(s)",
            "✓".style(Style::new().green().bold()),
            summary.instances_created,
            summary.rules_extended
        );
    } else {
        println!("All {} rule(s) already cover the next {} days.", summary.rules_scanned, horizon_days);
    }
    if summary.rules_terminated > 0 {
        println!("  {} {} rule(s) have ended", "→".blue(), summary.rules_terminated);
    }
    Ok(())
}
