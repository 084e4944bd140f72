//! Property-based tests for append and traversal.

use proptest::prelude::*;
use ringcache_core::{Cache, CacheConfig, HEADER_SIZE, SPAN_WIDTH};
use ringcache_storage::{InMemoryBackend, StorageBackend};

/// Cache sizes from barely-fits-one-frame upwards.
fn maximum_bytes_strategy() -> impl Strategy<Value = u64> {
    (HEADER_SIZE + SPAN_WIDTH + 28)..=512
}

/// Payloads small enough to fit in the smallest generated cache.
fn payloads_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(1u8..=255, 1..=28), 1..120)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn survivors_are_a_non_empty_suffix(
        maximum_bytes in maximum_bytes_strategy(),
        payloads in payloads_strategy(),
    ) {
        let mut cache =
            Cache::with_backend(InMemoryBackend::new(), CacheConfig::new(maximum_bytes)).unwrap();

        for (i, payload) in payloads.iter().enumerate() {
            cache.append(payload).unwrap();

            let read: Vec<Vec<u8>> = cache
                .read_all()
                .unwrap()
                .into_iter()
                .map(|b| b.to_vec())
                .collect();
            let appended = &payloads[..=i];

            prop_assert!(!read.is_empty());
            prop_assert!(read.len() <= appended.len());
            prop_assert_eq!(read.as_slice(), &appended[appended.len() - read.len()..]);
        }
    }

    #[test]
    fn used_bytes_never_exceed_capacity(
        maximum_bytes in maximum_bytes_strategy(),
        payloads in payloads_strategy(),
    ) {
        let mut cache =
            Cache::with_backend(InMemoryBackend::new(), CacheConfig::new(maximum_bytes)).unwrap();

        for payload in &payloads {
            cache.append(payload).unwrap();

            let used = cache.used_bytes().unwrap();
            prop_assert!(used <= cache.header().capacity());
            prop_assert!(cache.backend().size().unwrap() <= maximum_bytes);

            let live: u64 = cache
                .read_all()
                .unwrap()
                .iter()
                .map(|m| SPAN_WIDTH + m.len() as u64)
                .sum();
            prop_assert_eq!(live, used);
        }
    }

    #[test]
    fn count_matches_traversal(
        maximum_bytes in maximum_bytes_strategy(),
        payloads in payloads_strategy(),
    ) {
        let mut cache =
            Cache::with_backend(InMemoryBackend::new(), CacheConfig::new(maximum_bytes)).unwrap();
        for payload in &payloads {
            cache.append(payload).unwrap();
        }

        let count = cache.message_count().unwrap();
        prop_assert_eq!(count, cache.read_all().unwrap().len());
    }

    #[test]
    fn reopening_preserves_contents(
        maximum_bytes in maximum_bytes_strategy(),
        payloads in payloads_strategy(),
    ) {
        let mut cache =
            Cache::with_backend(InMemoryBackend::new(), CacheConfig::new(maximum_bytes)).unwrap();
        for payload in &payloads {
            cache.append(payload).unwrap();
        }
        let before = cache.read_all().unwrap();
        let data = cache.backend().data();
        drop(cache);

        let mut reopened =
            Cache::with_backend(InMemoryBackend::with_data(data), CacheConfig::new(maximum_bytes))
                .unwrap();
        prop_assert!(reopened.is_writable());
        prop_assert_eq!(reopened.read_all().unwrap(), before);
    }
}
