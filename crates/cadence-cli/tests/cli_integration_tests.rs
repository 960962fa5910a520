//! Black-box tests of the `cadence` binary. Every rule uses explicit dates
//! with a count or a far-future start, so results do not depend on today.

use predicates::prelude::*;

mod helpers;
use helpers::{assertions, CliTestHarness};

#[test]
fn test_cli_help_and_version() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["--help"])
        .stdout(predicate::str::contains("Recurring-task scheduler"))
        .stdout(predicate::str::contains("preview"));

    harness.run_success(&["--version"]).stdout(predicate::str::contains("cadence"));

    harness
        .run_failure(&["invalid-command"])
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_empty_store() {
    let harness = CliTestHarness::new();

    harness.run_success(&["rules"]).stdout(predicate::str::contains("No rules found."));
    harness.run_success(&["list"]).stdout(predicate::str::contains("No tasks found."));
    assert!(harness.db_path().exists());
}

#[test]
fn test_monthly_rule_clamps_to_month_end() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&[
            "add", "Pay rent", "--start", "2024-01-31", "--every", "monthly", "--day", "31", "--count", "5",
        ])
        .stdout(assertions::rule_created_successfully());

    let rules = harness.stdout_of(&["rules"]);
    assert!(assertions::has_rule_table_headers().eval(&rules));
    let rule_id = CliTestHarness::short_id_in(&rules, "Pay rent").expect("rule row");

    harness
        .run_success(&["show", &rule_id])
        .stdout(predicate::str::contains("Monthly on day 31"))
        .stdout(predicate::str::contains("For 5 occurrences"))
        .stdout(predicate::str::contains("2024-01-31"))
        .stdout(predicate::str::contains("2024-02-29"))
        .stdout(predicate::str::contains("2024-03-31"))
        .stdout(predicate::str::contains("2024-04-30"))
        .stdout(predicate::str::contains("2024-05-31"))
        .stdout(predicate::str::contains("2024-06-30").not())
        .stdout(predicate::str::contains("5 live, 5 generated"));
}

#[test]
fn test_weekly_set_and_leap_yearly() {
    let harness = CliTestHarness::new();

    let gym = harness.add_rule(&[
        "Gym", "--start", "2024-01-01", "--every", "weekly", "--on", "mon,wed,fri", "--count", "3",
    ]);
    harness
        .run_success(&["show", &gym])
        .stdout(predicate::str::contains("2024-01-01"))
        .stdout(predicate::str::contains("2024-01-03"))
        .stdout(predicate::str::contains("2024-01-05"))
        .stdout(predicate::str::contains("2024-01-08").not());

    let leap = harness.add_rule(&["Leap check", "--start", "2024-02-29", "--every", "yearly", "--count", "2"]);
    harness
        .run_success(&["show", &leap])
        .stdout(predicate::str::contains("2024-02-29"))
        .stdout(predicate::str::contains("2025-02-28"));
}

#[test]
fn test_agenda_filters_and_status_changes() {
    let harness = CliTestHarness::new();
    harness.add_rule(&["Standup", "--start", "2024-03-01", "--at", "9:30 AM", "--count", "4"]);

    let agenda = harness.stdout_of(&["list", "--from", "2024-03-02", "--to", "2024-03-03"]);
    assert!(assertions::has_task_table_headers().eval(&agenda));
    assert!(agenda.contains("2024-03-02"));
    assert!(agenda.contains("2024-03-03"));
    assert!(!agenda.contains("2024-03-01"));
    assert!(!agenda.contains("2024-03-04"));
    assert!(agenda.contains("09:30"));

    let task_id = CliTestHarness::short_id_in(&agenda, "2024-03-02").expect("task row");
    harness
        .run_success(&["do", &task_id])
        .stdout(predicate::str::contains("Completed task: 'Standup'"));

    let completed = harness.stdout_of(&["list", "--status", "completed"]);
    assert!(completed.contains("2024-03-02"));
    assert!(!completed.contains("2024-03-03"));

    harness
        .run_success(&["undo", &task_id])
        .stdout(predicate::str::contains("Reopened task"));
    harness
        .run_success(&["list", "--status", "done"])
        .stdout(predicate::str::contains("No tasks found."));
}

#[test]
fn test_preview_more_and_exhaustion() {
    let harness = CliTestHarness::new();
    let rule_id = harness.add_rule(&["Review", "--start", "2099-01-05", "--every", "weekly", "--count", "3"]);

    harness
        .run_success(&["preview", &rule_id, "--count", "5"])
        .stdout(predicate::str::contains("2099-01-12"))
        .stdout(predicate::str::contains("2099-01-19"))
        .stdout(predicate::str::contains("2099-01-26").not());

    harness
        .run_success(&["more", &rule_id, "--count", "2"])
        .stdout(predicate::str::contains("Generated 2 instance(s)"));
    harness
        .run_success(&["more", &rule_id])
        .stdout(predicate::str::contains("No more occurrences"));
    harness
        .run_success(&["preview", &rule_id])
        .stdout(predicate::str::contains("No upcoming occurrences."));
}

#[test]
fn test_open_ended_future_rule_preview() {
    let harness = CliTestHarness::new();
    let rule_id = harness.add_rule(&["Backup", "--start", "2099-01-01"]);

    harness
        .run_success(&["preview", &rule_id, "-c", "3"])
        .stdout(predicate::str::contains("2099-01-02"))
        .stdout(predicate::str::contains("2099-01-04"))
        .stdout(predicate::str::contains("2099-01-05").not());

    harness
        .run_success(&["horizon"])
        .stdout(predicate::str::contains("already cover the next 90 days"));
}

#[test]
fn test_edit_regenerates_on_schedule_change() {
    let harness = CliTestHarness::new();
    let rule_id = harness.add_rule(&["Review", "--start", "2099-01-05", "--every", "weekly", "--count", "3"]);
    harness.run_success(&["more", &rule_id, "--count", "2"]);

    harness
        .run_success(&["edit", &rule_id, "--description", "Weekly review", "--priority", "high"])
        .stdout(predicate::str::contains("Updated rule"))
        .stdout(predicate::str::contains("regenerated").not());

    harness
        .run_success(&["edit", &rule_id, "--start", "2099-02-02"])
        .stdout(predicate::str::contains("instances regenerated (3 now)"));

    harness
        .run_success(&["show", &rule_id])
        .stdout(predicate::str::contains("Weekly review"))
        .stdout(predicate::str::contains("2099-02-16"))
        .stdout(predicate::str::contains("2099-01-12").not());
}

#[test]
fn test_edit_anchor_keeps_other_anchors() {
    let harness = CliTestHarness::new();
    let rule_id = harness.add_rule(&[
        "Leap check", "--start", "2024-02-29", "--every", "yearly", "--month", "2", "--day", "29", "--count", "2",
    ]);

    harness
        .run_success(&["edit", &rule_id, "--day", "15"])
        .stdout(predicate::str::contains("instances regenerated"));

    harness
        .run_success(&["show", &rule_id])
        .stdout(predicate::str::contains("Yearly on 2/15"))
        .stdout(predicate::str::contains("2025-02-15"))
        .stdout(predicate::str::contains("2025-01-15").not());
}

#[test]
fn test_edit_end_condition_removes_instances() {
    let harness = CliTestHarness::new();
    let rule_id = harness.add_rule(&["Stretch", "--start", "2024-01-01", "--count", "11"]);

    harness
        .run_success(&["edit", &rule_id, "--until", "2024-01-03"])
        .stdout(predicate::str::contains("End condition changed (3 instances now)"));

    harness
        .run_success(&["show", &rule_id])
        .stdout(predicate::str::contains("2024-01-03"))
        .stdout(predicate::str::contains("2024-01-04").not())
        .stdout(predicate::str::contains("3 live"));
}

#[test]
fn test_show_prints_timezone() {
    let harness = CliTestHarness::new();
    let rule_id = harness.add_rule(&["Standup", "--start", "2024-03-01", "--at", "9:30 AM", "--count", "2"]);

    harness
        .run_success(&["show", &rule_id])
        .stdout(predicate::str::contains("09:30 UTC"))
        .stdout(predicate::str::contains("Timezone:  UTC"));
}

#[test]
fn test_delete_cascades_to_instances() {
    let harness = CliTestHarness::new();
    let rule_id = harness.add_rule(&["Water plants", "--start", "2024-05-01", "--count", "3"]);

    harness
        .run_success(&["delete", &rule_id])
        .stdout(predicate::str::contains("Deletion cancelled."));

    harness
        .run_success(&["delete", &rule_id, "--force"])
        .stdout(predicate::str::contains("Deleted rule"));

    harness.run_success(&["rules"]).stdout(predicate::str::contains("No rules found."));
    harness.run_success(&["list"]).stdout(predicate::str::contains("No tasks found."));
    harness
        .run_success(&["check"])
        .stdout(predicate::str::contains("no problems found"));
}

#[test]
fn test_error_reporting() {
    let harness = CliTestHarness::new();
    let rule_id = harness.add_rule(&["Stretch", "--start", "2024-01-01", "--count", "2"]);

    harness
        .run_failure(&["show", "zz"])
        .stderr(predicate::str::contains("No task or rule"));
    harness
        .run_failure(&["show", "a"])
        .stderr(predicate::str::contains("at least 2 characters"));
    harness
        .run_failure(&["add", "Bad", "--start", "the day after never"])
        .stderr(predicate::str::contains("Failed to parse date"));
    harness
        .run_failure(&["add", "Bad", "--every", "daily", "--on", "mon"])
        .stderr(predicate::str::contains("does not apply"));
    harness
        .run_failure(&["add", "   ", "--count", "1"])
        .stderr(predicate::str::contains("Invalid input"));
    harness
        .run_failure(&["do", &rule_id])
        .stderr(predicate::str::contains("is a recurrence rule"));
}

#[test]
fn test_configuration_errors() {
    let harness = CliTestHarness::new();

    harness
        .command()
        .env("CADENCE_TIMEZONE", "Mars/Olympus")
        .arg("rules")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown timezone 'Mars/Olympus'"));

    std::fs::write(harness.dir().join("cadence.toml"), "horizon_days = 0\n").expect("write config");
    harness
        .run_failure(&["rules"])
        .stderr(predicate::str::contains("horizon_days must be at least 1"));
}
