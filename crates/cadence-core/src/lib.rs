//! # Cadence Core Library
//!
//! Recurring-task scheduling: recurrence rules generate concrete, dated task
//! instances in batches, and a rolling horizon keeps every rule populated a
//! configurable number of days ahead.
//!
//! ## Features
//!
//! - **Calendar-aware recurrence**: daily, weekly (weekday sets), monthly and
//!   yearly patterns with intervals; month-end and leap-day clamping
//! - **Termination**: open-ended, until a date, or after a number of occurrences
//! - **Rolling horizon**: idempotent maintenance passes that top up instances
//! - **Lifecycle management**: structural edits regenerate, detaching an
//!   instance keeps the occurrence budget
//! - **Pluggable storage**: in-memory store for tests, SQLite store via sqlx
//!
//! ## Core Modules
//!
//! - [`calendar`]: Month lengths, leap years, day clamping
//! - [`models`]: Tasks, rules, patterns and transfer objects
//! - [`recurrence`]: The occurrence generator
//! - [`scheduler`]: Lifecycle, horizon maintenance and integrity checks
//! - [`store`]: Task store abstraction and implementations
//! - [`query`]: Agenda filtering and ordering
//! - [`timezone`]: Timezone parsing and "today" resolution
//! - [`db`]: SQLite connection and schema setup
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cadence_core::{
//!     models::{NewRuleData, RecurrencePattern, SchedulerConfig},
//!     scheduler::{HorizonMaintenance, RuleLifecycle, Scheduler},
//!     store::SqliteStore,
//! };
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cadence_core::error::CoreError> {
//!     let store = SqliteStore::open("cadence.db").await?;
//!     let mut scheduler = Scheduler::new(store, SchedulerConfig::default());
//!
//!     let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//!     let rule_id = scheduler
//!         .create_rule(NewRuleData::new("Standup", start, RecurrencePattern::weekly([0, 1, 2, 3, 4])))
//!         .await?;
//!
//!     let summary = scheduler.ensure_horizon().await?;
//!     println!("{} created {} instances", rule_id, summary.instances_created);
//!     Ok(())
//! }
//! ```

pub mod calendar;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod recurrence;
pub mod scheduler;
pub mod store;
pub mod timezone;
