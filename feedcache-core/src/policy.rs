//! Cache freshness policy
//!
//! A snapshot is fresh while the reference time is strictly before the
//! snapshot timestamp plus the maximum age. The maximum age is counted in
//! calendar days in the policy's time zone, so a day that is 23 or 25 hours
//! long around a daylight-saving change still counts as one day.

use chrono::{Days, TimeZone, Utc};

use crate::{Timestamp, DEFAULT_MAX_CACHE_AGE_DAYS};

/// Pure, stateless freshness decision.
///
/// The zone is injected rather than read from the environment; `Utc` is the
/// default and has no daylight-saving transitions. [`crate::CalendarZone`]
/// chooses between UTC and the local zone at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy<Tz: TimeZone = Utc> {
    max_age_days: u32,
    zone: Tz,
}

impl CachePolicy<Utc> {
    /// Create a policy that counts days in UTC.
    pub fn new(max_age_days: u32) -> Self {
        Self::in_zone(max_age_days, Utc)
    }
}

impl Default for CachePolicy<Utc> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CACHE_AGE_DAYS)
    }
}

impl<Tz: TimeZone> CachePolicy<Tz> {
    /// Create a policy that counts calendar days in `zone`.
    pub fn in_zone(max_age_days: u32, zone: Tz) -> Self {
        Self { max_age_days, zone }
    }

    pub fn max_age_days(&self) -> u32 {
        self.max_age_days
    }

    pub fn zone(&self) -> &Tz {
        &self.zone
    }

    /// The first instant at which a snapshot taken at `timestamp` is stale.
    ///
    /// Returns `None` when the calendar cannot produce the boundary: the
    /// result is out of range, or the local wall-clock time does not exist
    /// or is ambiguous in the policy's zone.
    pub fn expiry(&self, timestamp: Timestamp) -> Option<Timestamp> {
        timestamp
            .with_timezone(&self.zone)
            .checked_add_days(Days::new(u64::from(self.max_age_days)))
            .map(|boundary| boundary.with_timezone(&Utc))
    }

    /// Whether a snapshot taken at `timestamp` is still fresh at `reference`.
    pub fn is_fresh(&self, timestamp: Timestamp, reference: Timestamp) -> bool {
        match self.expiry(timestamp) {
            Some(boundary) => reference < boundary,
            None => false,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
