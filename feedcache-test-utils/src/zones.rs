//! A time zone with daylight saving, for calendar-day tests.
//!
//! [`UsEastern`] follows the United States Eastern rule in force since 2007:
//! clocks go from 02:00 EST to 03:00 EDT on the second Sunday of March and
//! from 02:00 EDT back to 01:00 EST on the first Sunday of November. Days
//! are 23 and 25 hours long on those dates.

use std::fmt;

use chrono::{
    Datelike, FixedOffset, MappedLocalTime, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeDelta, TimeZone, Utc, Weekday,
};

const STANDARD: i32 = -5 * 3600;
const DAYLIGHT: i32 = -4 * 3600;

/// US Eastern time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsEastern;

/// EST or EDT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsEasternOffset {
    seconds: i32,
}

impl UsEasternOffset {
    pub fn is_daylight(&self) -> bool {
        self.seconds == DAYLIGHT
    }
}

impl Offset for UsEasternOffset {
    fn fix(&self) -> FixedOffset {
        FixedOffset::east_opt(self.seconds).unwrap_or_else(|| Utc.fix())
    }
}

impl fmt::Display for UsEasternOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.fix(), f)
    }
}

/// Daylight time of `year` as a half-open UTC range.
fn daylight_span(year: i32) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = NaiveDate::from_weekday_of_month_opt(year, 3, Weekday::Sun, 2)?
        .and_hms_opt(7, 0, 0)?;
    let end = NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Sun, 1)?
        .and_hms_opt(6, 0, 0)?;
    Some((start, end))
}

fn offset_seconds_at(utc: &NaiveDateTime) -> i32 {
    match daylight_span(utc.year()) {
        Some((start, end)) if *utc >= start && *utc < end => DAYLIGHT,
        _ => STANDARD,
    }
}

impl TimeZone for UsEastern {
    type Offset = UsEasternOffset;

    fn from_offset(_offset: &UsEasternOffset) -> Self {
        UsEastern
    }

    fn offset_from_local_date(&self, local: &NaiveDate) -> MappedLocalTime<UsEasternOffset> {
        self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
    }

    fn offset_from_local_datetime(
        &self,
        local: &NaiveDateTime,
    ) -> MappedLocalTime<UsEasternOffset> {
        // A wall-clock reading belongs to an offset when the UTC instant it
        // names under that offset actually uses it.
        let fits = |seconds: i32| {
            local
                .checked_sub_signed(TimeDelta::seconds(i64::from(seconds)))
                .is_some_and(|utc| offset_seconds_at(&utc) == seconds)
        };
        let offset = |seconds| UsEasternOffset { seconds };

        match (fits(DAYLIGHT), fits(STANDARD)) {
            (true, true) => MappedLocalTime::Ambiguous(offset(DAYLIGHT), offset(STANDARD)),
            (true, false) => MappedLocalTime::Single(offset(DAYLIGHT)),
            (false, true) => MappedLocalTime::Single(offset(STANDARD)),
            (false, false) => MappedLocalTime::None,
        }
    }

    fn offset_from_utc_date(&self, utc: &NaiveDate) -> UsEasternOffset {
        self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
    }

    fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> UsEasternOffset {
        UsEasternOffset {
            seconds: offset_seconds_at(utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TimestampExt;
    use crate::{CachePolicy, Timestamp};

    const WEEK: i64 = 7 * 86_400;
    const HOUR: i64 = 3_600;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_offsets_switch_at_2025_transitions() {
        let offset = |t: Timestamp| *t.with_timezone(&UsEastern).offset();

        assert!(!offset(utc(2025, 3, 9, 6, 59)).is_daylight());
        assert!(offset(utc(2025, 3, 9, 7, 0)).is_daylight());
        assert!(offset(utc(2025, 11, 2, 5, 59)).is_daylight());
        assert!(!offset(utc(2025, 11, 2, 6, 0)).is_daylight());
    }

    #[test]
    fn test_local_times_in_gap_and_overlap() {
        let spring_gap = NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert_eq!(UsEastern.from_local_datetime(&spring_gap), MappedLocalTime::None);

        let autumn_overlap = NaiveDate::from_ymd_opt(2025, 11, 2)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        match UsEastern.from_local_datetime(&autumn_overlap) {
            MappedLocalTime::Ambiguous(earlier, later) => {
                assert_eq!(earlier.with_timezone(&Utc), utc(2025, 11, 2, 5, 30));
                assert_eq!(later.with_timezone(&Utc), utc(2025, 11, 2, 6, 30));
            }
            other => panic!("expected ambiguous local time, got {other:?}"),
        }
    }

    #[test]
    fn test_policy_week_is_an_hour_short_across_spring_forward() {
        // 12:00 EST on Monday 2025-03-03; seven days later is 12:00 EDT.
        let cached_at = utc(2025, 3, 3, 17, 0);
        let policy = CachePolicy::in_zone(7, UsEastern);

        let boundary = policy.expiry(cached_at).unwrap();
        assert_eq!(boundary, cached_at.adding_seconds(WEEK - HOUR));
        assert!(policy.is_fresh(cached_at, boundary.adding_seconds(-1)));
        assert!(!policy.is_fresh(cached_at, boundary));

        let half_hour_short = cached_at.adding_seconds(WEEK - HOUR / 2);
        assert!(!policy.is_fresh(cached_at, half_hour_short));
        assert!(CachePolicy::new(7).is_fresh(cached_at, half_hour_short));
    }

    #[test]
    fn test_policy_week_is_an_hour_long_across_fall_back() {
        // 12:00 EDT on Tuesday 2025-10-28; seven days later is 12:00 EST.
        let cached_at = utc(2025, 10, 28, 16, 0);
        let policy = CachePolicy::in_zone(7, UsEastern);

        let boundary = policy.expiry(cached_at).unwrap();
        assert_eq!(boundary, cached_at.adding_seconds(WEEK + HOUR));
        assert!(policy.is_fresh(cached_at, boundary.adding_seconds(-1)));
        assert!(!policy.is_fresh(cached_at, boundary));

        let exact_week = cached_at.adding_seconds(WEEK);
        assert!(policy.is_fresh(cached_at, exact_week));
        assert!(!CachePolicy::new(7).is_fresh(cached_at, exact_week));
    }

    #[test]
    fn test_boundary_landing_in_spring_gap_is_not_fresh() {
        // 02:30 EST on 2025-03-02 plus seven days is 02:30 on 2025-03-09,
        // which never appears on Eastern clocks.
        let cached_at = utc(2025, 3, 2, 7, 30);
        let policy = CachePolicy::in_zone(7, UsEastern);

        assert_eq!(policy.expiry(cached_at), None);
        assert!(!policy.is_fresh(cached_at, cached_at));
    }
}
