//! Calendar zone selection
//!
//! [`CalendarZone`] picks, at runtime, which calendar a [`crate::CachePolicy`]
//! counts days in: UTC, or the zone of the machine the cache runs on.

use chrono::{
    FixedOffset, Local, MappedLocalTime, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Utc,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ConfigError;

/// Calendar that freshness days are counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarZone {
    /// Every day is 24 hours long.
    Utc,
    /// The process's local zone, daylight-saving transitions included.
    #[default]
    Local,
}

/// Offset of a [`CalendarZone`] at a given instant.
///
/// Remembers its zone so date arithmetic on a `DateTime<CalendarZone>`
/// keeps following that zone's rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarOffset {
    zone: CalendarZone,
    offset: FixedOffset,
}

impl CalendarOffset {
    fn new(zone: CalendarZone, offset: impl Offset) -> Self {
        Self {
            zone,
            offset: offset.fix(),
        }
    }
}

impl Offset for CalendarOffset {
    fn fix(&self) -> FixedOffset {
        self.offset
    }
}

impl fmt::Display for CalendarOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.offset, f)
    }
}

impl TimeZone for CalendarZone {
    type Offset = CalendarOffset;

    fn from_offset(offset: &CalendarOffset) -> Self {
        offset.zone
    }

    fn offset_from_local_date(&self, local: &NaiveDate) -> MappedLocalTime<CalendarOffset> {
        self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
    }

    fn offset_from_local_datetime(
        &self,
        local: &NaiveDateTime,
    ) -> MappedLocalTime<CalendarOffset> {
        let zone = *self;
        match zone {
            Self::Utc => Utc
                .offset_from_local_datetime(local)
                .map(|offset| CalendarOffset::new(zone, offset)),
            Self::Local => Local
                .offset_from_local_datetime(local)
                .map(|offset| CalendarOffset::new(zone, offset)),
        }
    }

    fn offset_from_utc_date(&self, utc: &NaiveDate) -> CalendarOffset {
        self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
    }

    fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> CalendarOffset {
        match self {
            Self::Utc => CalendarOffset::new(*self, Utc.offset_from_utc_datetime(utc)),
            Self::Local => CalendarOffset::new(*self, Local.offset_from_utc_datetime(utc)),
        }
    }
}

impl fmt::Display for CalendarZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Utc => "utc",
            Self::Local => "local",
        })
    }
}

impl FromStr for CalendarZone {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utc" => Ok(Self::Utc),
            "local" => Ok(Self::Local),
            _ => Err(ConfigError::InvalidValue {
                field: "calendar_zone".to_string(),
                value: s.to_string(),
                reason: "expected utc or local".to_string(),
            }),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, Duration};

    fn instant() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, 17, 0, 0).unwrap()
    }

    #[test]
    fn test_utc_zone_has_zero_offset() {
        let local = instant().with_timezone(&CalendarZone::Utc);
        assert_eq!(local.offset().fix().local_minus_utc(), 0);
        assert_eq!(local.naive_local(), instant().naive_utc());
    }

    #[test]
    fn test_local_zone_matches_chrono_local() {
        let ours = instant().with_timezone(&CalendarZone::Local);
        let chrono_local = instant().with_timezone(&Local);
        assert_eq!(ours.offset().fix(), chrono_local.offset().fix());
        assert_eq!(ours.naive_local(), chrono_local.naive_local());
    }

    #[test]
    fn test_day_arithmetic_keeps_the_zone() {
        let start = instant().with_timezone(&CalendarZone::Utc);
        let later = start.checked_add_days(Days::new(7)).unwrap();
        assert_eq!(later.timezone(), CalendarZone::Utc);
        assert_eq!(later.with_timezone(&Utc), instant() + Duration::days(7));
    }

    #[test]
    fn test_parsing_and_display() {
        assert_eq!("UTC".parse::<CalendarZone>(), Ok(CalendarZone::Utc));
        assert_eq!(" local ".parse::<CalendarZone>(), Ok(CalendarZone::Local));
        assert!("mars".parse::<CalendarZone>().is_err());
        for zone in [CalendarZone::Utc, CalendarZone::Local] {
            assert_eq!(zone.to_string().parse::<CalendarZone>(), Ok(zone));
        }
    }
}
