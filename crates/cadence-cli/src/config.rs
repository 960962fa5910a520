use cadence_core::error::CoreError;
use cadence_core::models::SchedulerConfig;
use cadence_core::timezone::parse_timezone;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::timezone::detect_system_timezone;

const CONFIG_FILE: &str = "cadence.toml";
const ENV_PREFIX: &str = "CADENCE_";

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// Path of the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// IANA zone that decides what "today" is
    #[serde(default = "detect_system_timezone")]
    pub timezone: String,
    /// Days of future instances kept per rule
    #[serde(default = "default_horizon_days")]
    pub horizon_days: i64,
    /// Instances generated per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Batch cap per rule in one horizon pass
    #[serde(default = "default_max_batches_per_pass")]
    pub max_batches_per_pass: usize,
}

fn default_database_path() -> String {
    "cadence.db".to_string()
}

fn default_horizon_days() -> i64 {
    SchedulerConfig::default().horizon_days
}

fn default_batch_size() -> usize {
    SchedulerConfig::default().batch_size
}

fn default_max_batches_per_pass() -> usize {
    SchedulerConfig::default().max_batches_per_pass
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            timezone: detect_system_timezone(),
            horizon_days: default_horizon_days(),
            batch_size: default_batch_size(),
            max_batches_per_pass: default_max_batches_per_pass(),
        }
    }
}

impl Config {
    /// Loads `cadence.toml` from the working directory, overridden by
    /// `CADENCE_*` environment variables.
    pub fn new() -> Result<Self, figment::Error> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(CONFIG_FILE))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }

    /// Validates the values and converts them for the scheduler.
    pub fn scheduler_config(&self) -> Result<SchedulerConfig, CoreError> {
        if self.horizon_days < 1 {
            return Err(CoreError::InvalidInput(format!(
                "horizon_days must be at least 1 (got {})",
                self.horizon_days
            )));
        }
        if self.batch_size == 0 || self.max_batches_per_pass == 0 {
            return Err(CoreError::InvalidInput(
                "batch_size and max_batches_per_pass must be at least 1".to_string(),
            ));
        }

        Ok(SchedulerConfig {
            horizon_days: self.horizon_days,
            batch_size: self.batch_size,
            max_batches_per_pass: self.max_batches_per_pass,
            timezone: parse_timezone(&self.timezone)?,
        })
    }
}
