use cadence_core::models::{parse_clock_time, parse_date};
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_english::{parse_date_string, Dialect};
use chrono_tz::Tz;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Failed to parse date '{0}': use YYYY-MM-DD or phrases like 'tomorrow' or 'next friday'")]
    Date(String),
    #[error("Failed to parse time '{0}': use HH:MM (24h) or H:MM AM/PM")]
    Time(String),
    #[error("Unknown weekday '{0}': use mon, tue, wed, thu, fri, sat, sun")]
    Weekday(String),
}

/// Parses an absolute `YYYY-MM-DD` date or an English phrase relative to
/// now in `tz`.
pub fn parse_date_input(input: &str, tz: Tz) -> Result<NaiveDate, ParseError> {
    if let Ok(date) = parse_date(input) {
        return Ok(date);
    }
    let now = tz.from_utc_datetime(&Utc::now().naive_utc());
    parse_date_string(input.trim(), now, Dialect::Uk)
        .map(|dt| dt.date_naive())
        .map_err(|_| ParseError::Date(input.to_string()))
}

/// Parses `14:30`, `9:05` or `9:05 PM`.
pub fn parse_time_input(input: &str) -> Result<NaiveTime, ParseError> {
    if let Ok(time) = parse_clock_time(input) {
        return Ok(time);
    }
    let normalized = input.trim().to_uppercase();
    NaiveTime::parse_from_str(&normalized, "%I:%M %p")
        .or_else(|_| NaiveTime::parse_from_str(&normalized, "%I:%M%p"))
        .map_err(|_| ParseError::Time(input.to_string()))
}

fn weekday_index(name: &str) -> Option<u8> {
    match name {
        "mon" | "monday" | "0" => Some(0),
        "tue" | "tues" | "tuesday" | "1" => Some(1),
        "wed" | "wednesday" | "2" => Some(2),
        "thu" | "thur" | "thurs" | "thursday" | "3" => Some(3),
        "fri" | "friday" | "4" => Some(4),
        "sat" | "saturday" | "5" => Some(5),
        "sun" | "sunday" | "6" => Some(6),
        _ => None,
    }
}

/// Parses a comma separated weekday list (`mon,wed,fri`), also accepting
/// `weekdays` and `weekends`. Monday is 0.
pub fn parse_weekdays(input: &str) -> Result<BTreeSet<u8>, ParseError> {
    let mut days = BTreeSet::new();
    for part in input.split(',').map(|p| p.trim().to_lowercase()).filter(|p| !p.is_empty()) {
        match part.as_str() {
            "weekdays" => days.extend(0..5),
            "weekends" => days.extend([5, 6]),
            name => {
                days.insert(weekday_index(name).ok_or_else(|| ParseError::Weekday(part.clone()))?);
            }
        }
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_absolute_date_wins() {
        assert_eq!(
            parse_date_input("2024-02-29", Tz::UTC),
            Ok(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
    }

    #[test]
    fn test_relative_dates() {
        let tz = Tz::UTC;
        let today = Utc::now().date_naive();
        assert_eq!(parse_date_input("today", tz), Ok(today));
        assert_eq!(parse_date_input("tomorrow", tz), Ok(today.succ_opt().unwrap()));
        assert!(matches!(parse_date_input("someday soon", tz), Err(ParseError::Date(_))));
    }

    #[rstest]
    #[case("14:30", 14, 30)]
    #[case("9:05", 9, 5)]
    #[case("9:00 AM", 9, 0)]
    #[case("9:15 pm", 21, 15)]
    #[case("12:00 AM", 0, 0)]
    #[case("7:45PM", 19, 45)]
    fn test_time_input(#[case] input: &str, #[case] hour: u32, #[case] minute: u32) {
        assert_eq!(parse_time_input(input), Ok(NaiveTime::from_hms_opt(hour, minute, 0).unwrap()));
    }

    #[test]
    fn test_bad_time() {
        assert!(matches!(parse_time_input("25:00"), Err(ParseError::Time(_))));
        assert!(matches!(parse_time_input("noon"), Err(ParseError::Time(_))));
    }

    #[rstest]
    #[case("mon,wed,fri", vec![0, 2, 4])]
    #[case("Tuesday, THU", vec![1, 3])]
    #[case("weekdays", vec![0, 1, 2, 3, 4])]
    #[case("weekends,mon", vec![0, 5, 6])]
    #[case("sun,sun", vec![6])]
    #[case("", vec![])]
    fn test_weekdays(#[case] input: &str, #[case] expected: Vec<u8>) {
        assert_eq!(parse_weekdays(input).unwrap().into_iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_unknown_weekday() {
        assert_eq!(parse_weekdays("mon,funday"), Err(ParseError::Weekday("funday".to_string())));
    }

    const NAMES: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

    proptest! {
        #[test]
        fn prop_any_weekday_subset_parses(days in proptest::collection::btree_set(0u8..7, 0..7)) {
            let input = days.iter().map(|d| NAMES[*d as usize]).collect::<Vec<_>>().join(",");
            prop_assert_eq!(parse_weekdays(&input).unwrap(), days);
        }
    }
}
