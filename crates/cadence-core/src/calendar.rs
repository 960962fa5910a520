//! Calendar arithmetic shared by the occurrence generator.
//!
//! All functions are total over `year >= 1` and `month` in `1..=12`; callers
//! validate user input before it reaches this module.

use chrono::NaiveDate;

const MONTH_LENGTHS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Gregorian leap year rule.
#[inline]
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Returns the number of days in `month` of `year` (28..=31).
#[inline]
pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    if month == 2 && is_leap_year(year) {
        29
    } else {
        MONTH_LENGTHS[(month - 1) as usize]
    }
}

/// Clamps `day` to the length of the target month, so that day 31 applied
/// to February yields 28 or 29.
#[inline]
pub fn clamp_day(day: u32, year: i32, month: u32) -> u32 {
    day.min(last_day_of_month(year, month))
}

/// Steps `months` forward from (`year`, `month`), carrying into the year.
/// Returns `None` when the year would overflow.
pub fn add_months(year: i32, month: u32, months: u32) -> Option<(i32, u32)> {
    let zero_based = (month - 1).checked_add(months)?;
    let year = year.checked_add(i32::try_from(zero_based / 12).ok()?)?;
    Some((year, zero_based % 12 + 1))
}

/// Builds a date with `day` clamped to the month length.
pub(crate) fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, clamp_day(day, year, month))
}
