use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Parse an IANA timezone name
pub fn parse_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone.trim())
        .map_err(|_| CoreError::InvalidTimezone(timezone.trim().to_string()))
}

/// Validate IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<(), CoreError> {
    parse_timezone(timezone).map(|_| ())
}

/// Calendar date of `at_time` as seen in `tz`
pub fn date_in(tz: Tz, at_time: DateTime<Utc>) -> NaiveDate {
    at_time.with_timezone(&tz).date_naive()
}

/// Today's calendar date in `tz`.
///
/// Every scheduling decision about "today" goes through the configured zone,
/// so a run just after midnight UTC still sees the local date.
pub fn today_in(tz: Tz) -> NaiveDate {
    date_in(tz, Utc::now())
}

/// Get timezone abbreviation (e.g., "EST", "EDT")
pub fn timezone_abbreviation(tz: Tz, at_time: DateTime<Utc>) -> String {
    at_time.with_timezone(&tz).format("%Z").to_string()
}
