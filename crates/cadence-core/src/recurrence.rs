use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeSet;

use crate::calendar::{add_months, clamped_date};
use crate::models::{EndCondition, RecurrencePattern, RecurrenceRule};

/// OccurrenceGenerator: expands a recurrence pattern into concrete dates.
///
/// Generation is pure and restartable: every call depends only on the
/// anchor and the pattern, and yields dates strictly after the anchor in
/// ascending order without duplicates.
#[derive(Debug, Clone)]
pub struct OccurrenceGenerator {
    pattern: RecurrencePattern,
    interval: u32,
    end: EndCondition,
}

impl OccurrenceGenerator {
    pub fn new(pattern: RecurrencePattern, interval: u32, end: EndCondition) -> Self {
        Self {
            pattern,
            interval: interval.max(1),
            end,
        }
    }

    /// Creates a generator for `rule` with its implicit anchors resolved
    /// against the rule's start date.
    pub fn for_rule(rule: &RecurrenceRule) -> Self {
        Self::new(rule.pattern.resolve_against(rule.start_date), rule.interval, rule.end)
    }

    /// Generates up to `count` occurrence dates strictly after `anchor`.
    ///
    /// # Behavior
    /// - daily: `anchor + k * interval` days
    /// - weekly: every matching weekday after the anchor, restricted to the
    ///   weeks `0, interval, 2 * interval, ..` counted from the anchor's week
    /// - monthly: month stepped cumulatively by `interval`, day clamped
    /// - yearly: year stepped by `interval`, day clamped (Feb 29 → Feb 28)
    /// - an `OnDate` end drops every date after the end date, so fewer than
    ///   `count` dates may come back
    pub fn generate(&self, anchor: NaiveDate, count: usize) -> Vec<NaiveDate> {
        let mut dates = match &self.pattern {
            RecurrencePattern::Daily => self.daily(anchor, count),
            RecurrencePattern::Weekly { week_days } => self.weekly(anchor, count, week_days),
            RecurrencePattern::Monthly { day_of_month } => {
                self.monthly(anchor, count, day_of_month.unwrap_or(anchor.day()))
            }
            RecurrencePattern::Yearly { month_of_year, day_of_month } => self.yearly(
                anchor,
                count,
                month_of_year.unwrap_or(anchor.month()),
                day_of_month.unwrap_or(anchor.day()),
            ),
        };

        dates.retain(|d| self.end.admits(*d));
        dates
    }

    fn daily(&self, anchor: NaiveDate, count: usize) -> Vec<NaiveDate> {
        let step = Duration::days(self.interval as i64);
        let mut dates = Vec::with_capacity(count);
        let mut current = anchor;
        while dates.len() < count {
            match current.checked_add_signed(step) {
                Some(next) => {
                    dates.push(next);
                    current = next;
                }
                None => break,
            }
        }
        dates
    }

    fn weekly(&self, anchor: NaiveDate, count: usize, week_days: &BTreeSet<u8>) -> Vec<NaiveDate> {
        let days: BTreeSet<u32> = if week_days.is_empty() {
            BTreeSet::from([anchor.weekday().num_days_from_monday()])
        } else {
            week_days.iter().map(|d| u32::from(*d)).filter(|d| *d < 7).collect()
        };
        if days.is_empty() {
            return Vec::new();
        }

        let week_start = match anchor
            .checked_sub_signed(Duration::days(anchor.weekday().num_days_from_monday() as i64))
        {
            Some(monday) => monday,
            None => return Vec::new(),
        };
        let period = self.interval as i64;
        let mut dates = Vec::with_capacity(count);
        let mut current = anchor;

        while dates.len() < count {
            current = match current.succ_opt() {
                Some(next) => next,
                None => break,
            };

            let week_offset = (current - week_start).num_days() / 7;
            let into_period = week_offset % period;
            if into_period != 0 {
                // Jump to the Monday of the next active week.
                let skip_weeks = period - into_period;
                let next_active = week_start.checked_add_signed(Duration::weeks(week_offset + skip_weeks));
                current = match next_active.and_then(|monday| monday.pred_opt()) {
                    Some(day_before) => day_before,
                    None => break,
                };
                continue;
            }

            if days.contains(&current.weekday().num_days_from_monday()) {
                dates.push(current);
            }
        }
        dates
    }

    fn monthly(&self, anchor: NaiveDate, count: usize, day: u32) -> Vec<NaiveDate> {
        let mut dates = Vec::with_capacity(count);
        let (mut year, mut month) = (anchor.year(), anchor.month());
        for _ in 0..count {
            (year, month) = match add_months(year, month, self.interval) {
                Some(next) => next,
                None => break,
            };
            match clamped_date(year, month, day) {
                Some(date) => dates.push(date),
                None => break,
            }
        }
        dates
    }

    fn yearly(&self, anchor: NaiveDate, count: usize, month: u32, day: u32) -> Vec<NaiveDate> {
        let Ok(step) = i32::try_from(self.interval) else {
            return Vec::new();
        };
        let mut dates = Vec::with_capacity(count);
        let mut year = anchor.year();
        for _ in 0..count {
            year = match year.checked_add(step) {
                Some(next) => next,
                None => break,
            };
            match clamped_date(year, month, day) {
                Some(date) => dates.push(date),
                None => break,
            }
        }
        dates
    }
}

/// Convenience wrapper over [`OccurrenceGenerator::generate`].
pub fn generate(
    anchor: NaiveDate,
    count: usize,
    pattern: &RecurrencePattern,
    interval: u32,
    end: EndCondition,
) -> Vec<NaiveDate> {
    OccurrenceGenerator::new(pattern.clone(), interval, end).generate(anchor, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewRuleData;
    use proptest::prelude::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dates(list: &[(i32, u32, u32)]) -> Vec<NaiveDate> {
        list.iter().map(|(y, m, d)| date(*y, *m, *d)).collect()
    }

    mod daily_tests {
        use super::*;

        #[test]
        fn test_daily_interval() {
            let got = generate(date(2024, 2, 27), 3, &RecurrencePattern::Daily, 2, EndCondition::Never);
            assert_eq!(got, dates(&[(2024, 2, 29), (2024, 3, 2), (2024, 3, 4)]));
        }

        #[test]
        fn test_daily_end_date_filter() {
            let end = EndCondition::OnDate { end_date: date(2024, 1, 4) };
            let got = generate(date(2024, 1, 1), 10, &RecurrencePattern::Daily, 1, end);
            assert_eq!(got, dates(&[(2024, 1, 2), (2024, 1, 3), (2024, 1, 4)]));
        }

        #[test]
        fn test_zero_count() {
            assert!(generate(date(2024, 1, 1), 0, &RecurrencePattern::Daily, 1, EndCondition::Never).is_empty());
        }
    }

    mod weekly_tests {
        use super::*;

        #[test]
        fn test_weekly_set_crosses_week_boundary() {
            // 2024-01-01 is a Monday
            let got = generate(
                date(2024, 1, 1),
                3,
                &RecurrencePattern::weekly([0, 2, 4]),
                1,
                EndCondition::Never,
            );
            assert_eq!(got, dates(&[(2024, 1, 3), (2024, 1, 5), (2024, 1, 8)]));
        }

        #[test]
        fn test_weekly_empty_set_uses_anchor_weekday() {
            let got = generate(
                date(2024, 1, 3),
                2,
                &RecurrencePattern::weekly([]),
                1,
                EndCondition::Never,
            );
            assert_eq!(got, dates(&[(2024, 1, 10), (2024, 1, 17)]));
        }

        #[test]
        fn test_weekly_interval_skips_off_weeks() {
            let got = generate(
                date(2024, 1, 1),
                4,
                &RecurrencePattern::weekly([0, 4]),
                2,
                EndCondition::Never,
            );
            // Fri of the anchor week, then the Mon/Fri of every second week
            assert_eq!(
                got,
                dates(&[(2024, 1, 5), (2024, 1, 15), (2024, 1, 19), (2024, 1, 29)])
            );
        }

        #[test]
        fn test_weekly_interval_from_mid_week_anchor() {
            // Anchor Saturday, only Sundays, every 3 weeks. The anchor's week
            // runs Mon 01-01 to Sun 01-07, so its own Sunday still counts.
            let got = generate(
                date(2024, 1, 6),
                3,
                &RecurrencePattern::weekly([6]),
                3,
                EndCondition::Never,
            );
            assert_eq!(got, dates(&[(2024, 1, 7), (2024, 1, 28), (2024, 2, 18)]));
        }

        #[test]
        fn test_weekly_interval_one_is_plain_walk() {
            let plain = generate(
                date(2024, 1, 1),
                12,
                &RecurrencePattern::weekly([1, 3]),
                1,
                EndCondition::Never,
            );
            for pair in plain.windows(2) {
                let gap = (pair[1] - pair[0]).num_days();
                assert!(gap == 2 || gap == 5, "unexpected gap {}", gap);
            }
        }
    }

    mod monthly_tests {
        use super::*;

        #[test]
        fn test_monthly_clamps_to_leap_february() {
            let got = generate(
                date(2024, 1, 31),
                4,
                &RecurrencePattern::Monthly { day_of_month: Some(31) },
                1,
                EndCondition::Never,
            );
            assert_eq!(
                got,
                dates(&[(2024, 2, 29), (2024, 3, 31), (2024, 4, 30), (2024, 5, 31)])
            );
        }

        #[test]
        fn test_monthly_year_rollover_with_interval() {
            let got = generate(
                date(2024, 11, 15),
                3,
                &RecurrencePattern::Monthly { day_of_month: None },
                3,
                EndCondition::Never,
            );
            assert_eq!(got, dates(&[(2025, 2, 15), (2025, 5, 15), (2025, 8, 15)]));
        }

        #[test]
        fn test_monthly_unset_day_follows_anchor() {
            // Without resolution the clamped anchor day carries forward
            let got = generate(
                date(2024, 2, 29),
                1,
                &RecurrencePattern::Monthly { day_of_month: None },
                1,
                EndCondition::Never,
            );
            assert_eq!(got, dates(&[(2024, 3, 29)]));
        }
    }

    mod yearly_tests {
        use super::*;

        #[test]
        fn test_yearly_leap_clamp() {
            let got = generate(
                date(2024, 2, 29),
                1,
                &RecurrencePattern::Yearly { month_of_year: None, day_of_month: None },
                1,
                EndCondition::Never,
            );
            assert_eq!(got, dates(&[(2025, 2, 28)]));
        }

        #[test]
        fn test_yearly_explicit_anchor_returns_to_leap_day() {
            let got = generate(
                date(2024, 2, 29),
                4,
                &RecurrencePattern::Yearly { month_of_year: Some(2), day_of_month: Some(29) },
                1,
                EndCondition::Never,
            );
            assert_eq!(
                got,
                dates(&[(2025, 2, 28), (2026, 2, 28), (2027, 2, 28), (2028, 2, 29)])
            );
        }

        #[test]
        fn test_yearly_interval_and_month() {
            let got = generate(
                date(2024, 1, 10),
                2,
                &RecurrencePattern::Yearly { month_of_year: Some(6), day_of_month: None },
                2,
                EndCondition::Never,
            );
            assert_eq!(got, dates(&[(2026, 6, 10), (2028, 6, 10)]));
        }
    }

    #[test]
    fn test_for_rule_resolves_against_start_date() {
        let rule = crate::models::RecurrenceRule::from_new(NewRuleData::new(
            "Invoice",
            date(2024, 1, 31),
            RecurrencePattern::Monthly { day_of_month: None },
        ));
        // Anchored at a clamped instance, the rule still returns to day 31
        let got = OccurrenceGenerator::for_rule(&rule).generate(date(2024, 2, 29), 1);
        assert_eq!(got, dates(&[(2024, 3, 31)]));
    }

    #[rstest]
    #[case(RecurrencePattern::Daily)]
    #[case(RecurrencePattern::weekly([5]))]
    #[case(RecurrencePattern::Monthly { day_of_month: Some(31) })]
    #[case(RecurrencePattern::Yearly { month_of_year: Some(2), day_of_month: Some(29) })]
    fn test_generation_is_deterministic(#[case] pattern: RecurrencePattern) {
        let generator = OccurrenceGenerator::new(pattern, 2, EndCondition::Never);
        assert_eq!(generator.generate(date(2024, 1, 1), 8), generator.generate(date(2024, 1, 1), 8));
        assert_eq!(
            generator.generate(date(2024, 1, 1), 1).first(),
            generator.generate(date(2024, 1, 1), 8).first()
        );
    }

    #[rstest]
    #[case(RecurrencePattern::Daily)]
    #[case(RecurrencePattern::weekly([0]))]
    #[case(RecurrencePattern::weekly([2, 4]))]
    #[case(RecurrencePattern::Monthly { day_of_month: Some(31) })]
    #[case(RecurrencePattern::Yearly { month_of_year: Some(2), day_of_month: Some(29) })]
    fn test_huge_interval_stops_at_calendar_end(
        #[case] pattern: RecurrencePattern,
        #[values(20_000_000, i32::MAX as u32, 3_000_000_000, u32::MAX)] interval: u32,
    ) {
        let anchor = date(2024, 1, 3);
        let got = generate(anchor, 5, &pattern, interval, EndCondition::Never);
        assert!(got.len() <= 5);
        assert!(got.iter().all(|d| *d > anchor));
        assert!(got.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[rstest]
    #[case(i32::MAX as u32)]
    #[case(3_000_000_000)]
    fn test_yearly_interval_past_year_range_is_empty(#[case] interval: u32) {
        let pattern = RecurrencePattern::Yearly { month_of_year: None, day_of_month: None };
        assert!(generate(date(2024, 1, 1), 3, &pattern, interval, EndCondition::Never).is_empty());
    }

    #[test]
    fn test_weekly_huge_interval_only_uses_first_week() {
        // Wednesday anchor: Thursday of the same week, then the next active week is out of range
        let got = generate(date(2024, 1, 3), 3, &RecurrencePattern::weekly([0, 3]), 20_000_000, EndCondition::Never);
        assert_eq!(got, dates(&[(2024, 1, 4)]));

        let near_end = NaiveDate::MAX - Duration::days(3);
        assert!(generate(near_end, 3, &RecurrencePattern::weekly([0]), 20_000_000, EndCondition::Never).len() <= 1);
    }

    fn pattern_strategy() -> impl Strategy<Value = RecurrencePattern> {
        prop_oneof![
            Just(RecurrencePattern::Daily),
            proptest::collection::btree_set(0u8..7, 0..7)
                .prop_map(|week_days| RecurrencePattern::Weekly { week_days }),
            proptest::option::of(1u32..=31).prop_map(|day_of_month| RecurrencePattern::Monthly { day_of_month }),
            (proptest::option::of(1u32..=12), proptest::option::of(1u32..=31)).prop_map(
                |(month_of_year, day_of_month)| RecurrencePattern::Yearly { month_of_year, day_of_month }
            ),
        ]
    }

    proptest! {
        #[test]
        fn prop_dates_strictly_ascending_after_anchor(
            pattern in pattern_strategy(),
            interval in 1u32..5,
            count in 0usize..40,
            offset in 0i64..3000,
        ) {
            let anchor = date(2020, 1, 1) + Duration::days(offset);
            let got = generate(anchor, count, &pattern, interval, EndCondition::Never);
            prop_assert_eq!(got.len(), count);
            if let Some(first) = got.first() {
                prop_assert!(*first > anchor);
            }
            for pair in got.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
        }

        #[test]
        fn prop_end_date_is_respected(
            pattern in pattern_strategy(),
            interval in 1u32..4,
            span in 0i64..400,
        ) {
            let anchor = date(2023, 6, 15);
            let end_date = anchor + Duration::days(span);
            let got = generate(anchor, 30, &pattern, interval, EndCondition::OnDate { end_date });
            prop_assert!(got.iter().all(|d| *d <= end_date));
        }
    }
}
