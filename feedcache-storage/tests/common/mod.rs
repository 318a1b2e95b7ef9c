//! Contract suite shared by the backend integration tests.

/// Generate the contract tests every store must pass.
///
/// `$make` is an expression returning `(store, guard)`; the guard keeps any
/// temporary location alive for the duration of the test.
macro_rules! feed_store_contract {
    ($make:expr) => {
        mod contract {
            use super::*;
            use feedcache_test_utils::store_specs::*;

            #[tokio::test]
            async fn test_retrieve_delivers_empty_on_empty_cache() {
                let (store, _guard) = $make;
                assert_that_retrieve_delivers_empty_on_empty_cache(&store).await;
            }

            #[tokio::test]
            async fn test_retrieve_has_no_side_effects_on_empty_cache() {
                let (store, _guard) = $make;
                assert_that_retrieve_has_no_side_effects_on_empty_cache(&store).await;
            }

            #[tokio::test]
            async fn test_retrieve_delivers_found_values_on_non_empty_cache() {
                let (store, _guard) = $make;
                assert_that_retrieve_delivers_found_values_on_non_empty_cache(&store).await;
            }

            #[tokio::test]
            async fn test_retrieve_has_no_side_effects_on_non_empty_cache() {
                let (store, _guard) = $make;
                assert_that_retrieve_has_no_side_effects_on_non_empty_cache(&store).await;
            }

            #[tokio::test]
            async fn test_insert_delivers_no_error_on_empty_cache() {
                let (store, _guard) = $make;
                assert_that_insert_delivers_no_error_on_empty_cache(&store).await;
            }

            #[tokio::test]
            async fn test_insert_delivers_no_error_on_non_empty_cache() {
                let (store, _guard) = $make;
                assert_that_insert_delivers_no_error_on_non_empty_cache(&store).await;
            }

            #[tokio::test]
            async fn test_insert_overrides_previously_inserted_cache_values() {
                let (store, _guard) = $make;
                assert_that_insert_overrides_previously_inserted_cache_values(&store).await;
            }

            #[tokio::test]
            async fn test_delete_delivers_no_error_on_empty_cache() {
                let (store, _guard) = $make;
                assert_that_delete_delivers_no_error_on_empty_cache(&store).await;
            }

            #[tokio::test]
            async fn test_delete_has_no_side_effects_on_empty_cache() {
                let (store, _guard) = $make;
                assert_that_delete_has_no_side_effects_on_empty_cache(&store).await;
            }

            #[tokio::test]
            async fn test_delete_delivers_no_error_on_non_empty_cache() {
                let (store, _guard) = $make;
                assert_that_delete_delivers_no_error_on_non_empty_cache(&store).await;
            }

            #[tokio::test]
            async fn test_delete_empties_previously_inserted_cache() {
                let (store, _guard) = $make;
                assert_that_delete_empties_previously_inserted_cache(&store).await;
            }

            #[tokio::test]
            async fn test_side_effects_run_serially() {
                let (store, _guard) = $make;
                assert_that_side_effects_run_serially(&store).await;
            }

            #[tokio::test]
            async fn test_retrieve_observes_preceding_insert() {
                let (store, _guard) = $make;
                assert_that_retrieve_observes_preceding_insert(&store).await;
            }
        }
    };
}
