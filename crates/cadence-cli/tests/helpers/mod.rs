#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Runs the `cadence` binary against a throwaway database
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        Self { temp_dir, db_path }
    }

    /// Command with the database and timezone pinned, run from the temp dir
    /// so no stray `cadence.toml` is picked up.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("cadence").expect("Failed to find cadence binary");
        cmd.current_dir(self.temp_dir.path())
            .env("CADENCE_DATABASE_PATH", &self.db_path)
            .env("CADENCE_TIMEZONE", "UTC")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    pub fn stdout_of(&self, args: &[&str]) -> String {
        let output = self.run_success(args).get_output().stdout.clone();
        String::from_utf8(output).expect("stdout is not UTF-8")
    }

    /// Creates a rule and returns its full ID from the `Rule ID:` line.
    pub fn add_rule(&self, args: &[&str]) -> String {
        let mut full_args = vec!["add"];
        full_args.extend_from_slice(args);
        let stdout = self.stdout_of(&full_args);
        stdout
            .lines()
            .find_map(|line| line.strip_prefix("Rule ID: "))
            .map(|id| id.trim().to_string())
            .expect("add did not print a rule ID")
    }

    /// Short ID of the table row that mentions `needle`.
    pub fn short_id_in(output: &str, needle: &str) -> Option<String> {
        output
            .lines()
            .filter(|line| line.contains(needle))
            .flat_map(|line| line.split_whitespace())
            .find(|token| token.len() == 8 && token.chars().all(|c| c.is_ascii_hexdigit()))
            .map(str::to_string)
    }
}

pub mod assertions {
    use predicates::prelude::*;

    pub fn has_task_table_headers() -> impl Predicate<str> {
        predicate::str::contains("ID")
            .and(predicate::str::contains("Description"))
            .and(predicate::str::contains("Due"))
            .and(predicate::str::contains("Status"))
    }

    pub fn has_rule_table_headers() -> impl Predicate<str> {
        predicate::str::contains("Pattern")
            .and(predicate::str::contains("Ends"))
            .and(predicate::str::contains("Instances"))
    }

    pub fn rule_created_successfully() -> impl Predicate<str> {
        predicate::str::contains("✓")
            .and(predicate::str::contains("Created rule"))
            .and(predicate::str::contains("Rule ID:"))
    }
}
