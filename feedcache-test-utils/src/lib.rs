//! feedcache Test Utilities
//!
//! Centralized test infrastructure for the feedcache workspace:
//! - Proptest generators for feed types
//! - A recording [`FeedStoreSpy`] for loader tests
//! - Test fixtures for common scenarios
//! - Store contract checks every backend must pass
//! - Custom assertions for store results
//! - A daylight-saving time zone for calendar-day tests

pub mod spy;
pub mod store_specs;
pub mod zones;

pub use spy::{FeedStoreSpy, ReceivedMessage};
pub use zones::UsEastern;

// Re-export core types for convenience
pub use feedcache_core::{
    CachePolicy, CacheSnapshot, CachedFeed, CachedRecord, FeedRecord, StorageError,
    StoreOperationKind, Timestamp,
};
pub use feedcache_storage::{FeedStore, StoreResult};

use chrono::{Days, TimeZone, Utc};
use url::Url;
use uuid::Uuid;

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to `warn`. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating feed types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Generate a Timestamp (DateTime<Utc>) with nanosecond precision.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        // Generate timestamps within a reasonable range (2020-2030)
        (1577836800i64..1893456000i64, 0u32..1_000_000_000).prop_map(|(secs, nanos)| {
            chrono::DateTime::from_timestamp(secs, nanos).unwrap_or_else(Utc::now)
        })
    }

    /// Generate an https URL with a short path.
    pub fn arb_url() -> impl Strategy<Value = Url> {
        ("[a-z]{1,12}", "[a-z0-9]{0,16}").prop_map(|(host, path)| {
            Url::parse(&format!("https://{host}.com/{path}"))
                .unwrap_or_else(|_| fixtures::any_url())
        })
    }

    /// Generate a FeedRecord with any combination of optional fields.
    pub fn arb_feed_record() -> impl Strategy<Value = FeedRecord> {
        (
            arb_uuid(),
            proptest::option::of("[ -~]{0,40}"),
            proptest::option::of("[ -~]{0,20}"),
            arb_url(),
        )
            .prop_map(|(id, description, location, url)| {
                FeedRecord::new(id, description, location, url)
            })
    }

    /// Generate an ordered feed, possibly empty.
    pub fn arb_feed() -> impl Strategy<Value = Vec<FeedRecord>> {
        proptest::collection::vec(arb_feed_record(), 0..8)
    }

    /// Generate a stored snapshot.
    pub fn arb_snapshot() -> impl Strategy<Value = CacheSnapshot> {
        (arb_feed(), arb_timestamp()).prop_map(|(feed, timestamp)| {
            CacheSnapshot::new(feedcache_core::to_cached(&feed), timestamp)
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// A valid URL with no meaning.
    pub fn any_url() -> Url {
        Url::parse("https://any-url.com").unwrap_or_else(|e| panic!("fixture URL: {e}"))
    }

    /// A storage error to inject.
    pub fn any_storage_error() -> StorageError {
        StorageError::read("any error")
    }

    /// A record with a fresh id and every field set.
    pub fn unique_record() -> FeedRecord {
        FeedRecord::new(
            Uuid::new_v4(),
            Some("any description".to_string()),
            Some("any location".to_string()),
            any_url(),
        )
    }

    /// Two unique records, as the domain sees them and as stores receive them.
    pub fn unique_feed() -> (Vec<FeedRecord>, Vec<CachedRecord>) {
        let models = vec![unique_record(), unique_record()];
        let cached = feedcache_core::to_cached(&models);
        (models, cached)
    }

    /// A fixed instant for deterministic clocks.
    pub fn fixed_now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 9, 11, 8, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Timestamp arithmetic for building fresh and stale snapshots.
    pub trait TimestampExt {
        fn adding_days(self, days: i64) -> Timestamp;
        fn adding_seconds(self, seconds: i64) -> Timestamp;
    }

    impl TimestampExt for Timestamp {
        fn adding_days(self, days: i64) -> Timestamp {
            self + chrono::Duration::days(days)
        }

        fn adding_seconds(self, seconds: i64) -> Timestamp {
            self + chrono::Duration::seconds(seconds)
        }
    }

    /// The oldest timestamp that is no longer fresh at `now`: `now` moved
    /// back by the maximum age in calendar days of the policy's zone.
    pub fn expiration_boundary<Tz: TimeZone>(
        now: Timestamp,
        policy: &CachePolicy<Tz>,
    ) -> Timestamp {
        let days = Days::new(u64::from(policy.max_age_days()));
        match now.with_timezone(policy.zone()).checked_sub_days(days) {
            Some(boundary) => boundary.with_timezone(&Utc),
            None => panic!(
                "No calendar date {} days before {now}",
                policy.max_age_days()
            ),
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for store results.

    use super::*;

    /// Assert that a retrieval found exactly `records` cached at `timestamp`.
    #[track_caller]
    pub fn assert_found(
        result: &StoreResult<CachedFeed>,
        records: &[CachedRecord],
        timestamp: Timestamp,
    ) {
        match result {
            Ok(CachedFeed::Found(snapshot)) => {
                assert_eq!(snapshot.records, records, "Cached records mismatch");
                assert_eq!(snapshot.timestamp, timestamp, "Cached timestamp mismatch");
            }
            other => panic!("Expected found cache, got: {:?}", other),
        }
    }

    /// Assert that a retrieval found no snapshot.
    #[track_caller]
    pub fn assert_empty(result: &StoreResult<CachedFeed>) {
        match result {
            Ok(CachedFeed::Empty) => {}
            other => panic!("Expected empty cache, got: {:?}", other),
        }
    }

    /// Assert that a store operation failed as `operation`.
    #[track_caller]
    pub fn assert_failed<T: std::fmt::Debug>(
        result: &StoreResult<T>,
        operation: StoreOperationKind,
    ) {
        match result {
            Err(e) => assert_eq!(e.operation(), operation, "Wrong failing operation: {e}"),
            Ok(value) => panic!("Expected {operation} failure, got Ok({:?})", value),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unique_feed_maps_to_cached() {
        let (models, cached) = unique_feed();
        assert_eq!(models.len(), 2);
        assert_ne!(models[0].id, models[1].id);
        assert_eq!(cached[0].id, models[0].id);
        assert_eq!(cached[1].url, models[1].url);
    }

    #[test]
    fn test_expiration_boundary_uses_policy_age() {
        let now = fixed_now();
        let boundary = expiration_boundary(now, &CachePolicy::default());
        assert_eq!(boundary, now.adding_days(-7));
        assert!(!CachePolicy::default().is_fresh(boundary, now));
        assert!(CachePolicy::default().is_fresh(boundary.adding_seconds(1), now));
    }

    #[test]
    fn test_expiration_boundary_counts_days_in_policy_zone() {
        // 12:00 EDT on 2025-03-10 is seven Eastern days after 12:00 EST on 2025-03-03.
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 16, 0, 0).unwrap();
        let policy = CachePolicy::in_zone(7, UsEastern);

        let boundary = expiration_boundary(now, &policy);
        assert_eq!(boundary, Utc.with_ymd_and_hms(2025, 3, 3, 17, 0, 0).unwrap());
        assert_eq!(boundary, now.adding_days(-7).adding_seconds(3_600));
        assert!(!policy.is_fresh(boundary, now));
        assert!(policy.is_fresh(boundary.adding_seconds(1), now));
    }

    #[test]
    fn test_assertions_accept_matching_results() {
        let (_, cached) = unique_feed();
        let now = fixed_now();
        assertions::assert_found(&Ok(CachedFeed::found(cached.clone(), now)), &cached, now);
        assertions::assert_empty(&Ok(CachedFeed::Empty));
        assertions::assert_failed::<()>(
            &Err(StorageError::delete("x")),
            StoreOperationKind::Delete,
        );
    }

    proptest! {
        #[test]
        fn prop_generated_records_survive_cache_mapping(feed in generators::arb_feed()) {
            let cached = feedcache_core::to_cached(&feed);
            let back: Vec<FeedRecord> = cached.into_iter().map(FeedRecord::from).collect();
            prop_assert_eq!(back, feed);
        }
    }
}
