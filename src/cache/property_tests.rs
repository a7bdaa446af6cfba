//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check store behaviour over generated operation sequences.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

use crate::cache::{CacheStore, ManualClock};

// == Test Configuration ==
const TEST_MAX_SIZE: usize = 100;
const TEST_DEFAULT_TTL_MS: u64 = 300_000;

fn manual_store(max_size: usize) -> (CacheStore<String>, ManualClock) {
    let clock = ManualClock::new(1_700_000_000_000);
    let store = CacheStore::with_clock(max_size, TEST_DEFAULT_TTL_MS, Arc::new(clock.clone()));
    (store, clock)
}

// == Strategies ==
/// Generates cache keys shaped like `<resource>:<id>`
fn key_strategy() -> impl Strategy<Value = String> {
    ("(user|product|order|news)", "[0-9]{1,3}").prop_map(|(ns, id)| format!("{}:{}", ns, id))
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}".prop_map(|s| s)
}

fn unique_keys_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set(key_strategy(), min..max).prop_map(|set| set.into_iter().collect())
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Has { key: String },
    Delete { key: String },
    Advance { ms: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Has { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
        (0u64..200_000).prop_map(|ms| CacheOp::Advance { ms }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Hits and misses match what `get` returned; `has` never counts.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let (mut store, clock) = manual_store(TEST_MAX_SIZE);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => store.set(key, value, None),
                CacheOp::Get { key } => match store.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Has { key } => {
                    store.has(&key);
                }
                CacheOp::Delete { key } => {
                    store.delete(&key);
                }
                CacheOp::Advance { ms } => clock.advance(ms),
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.size, store.len(), "Size mismatch");
        prop_assert_eq!(stats.total_requests(), expected_hits + expected_misses);
    }

    // A value read back before its TTL elapses is the value that was stored.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let (mut store, _) = manual_store(TEST_MAX_SIZE);

        store.set(key.clone(), value.clone(), None);
        prop_assert_eq!(store.get(&key), Some(value));
    }

    // The second of two writes to one key wins, and only one entry exists.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        let (mut store, _) = manual_store(TEST_MAX_SIZE);

        store.set(key.clone(), value1, None);
        store.set(key.clone(), value2.clone(), None);

        prop_assert_eq!(store.get(&key), Some(value2));
        prop_assert_eq!(store.len(), 1);
    }

    // Size never exceeds capacity after any `set`.
    #[test]
    fn prop_capacity_enforcement(
        max_size in 1usize..20,
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..200)
    ) {
        let (mut store, _) = manual_store(max_size);

        for (key, value) in entries {
            store.set(key, value, None);
            prop_assert!(
                store.len() <= max_size,
                "Cache size {} exceeds max {}",
                store.len(),
                max_size
            );
        }
    }

    // Entries disappear from both `get` and `has` once their TTL has passed.
    #[test]
    fn prop_ttl_expiration_behavior(
        key in key_strategy(),
        value in value_strategy(),
        ttl_ms in 1u64..100_000
    ) {
        let (mut store, clock) = manual_store(TEST_MAX_SIZE);

        store.set(key.clone(), value.clone(), Some(ttl_ms));
        clock.advance(ttl_ms);
        prop_assert!(store.has(&key), "Entry should still be valid at its expiry instant");

        clock.advance(1);
        prop_assert!(store.get(&key).is_none(), "Entry should be gone after its TTL");
        prop_assert!(!store.has(&key));
    }

    // Filling to capacity and adding one more evicts exactly the oldest write.
    #[test]
    fn prop_lru_eviction_order(
        keys in unique_keys_strategy(3, 10),
        new_value in value_strategy()
    ) {
        let new_key = "fresh:key".to_string();
        let capacity = keys.len();
        let (mut store, _) = manual_store(capacity);

        for key in &keys {
            store.set(key.clone(), format!("value_{}", key), None);
        }
        prop_assert_eq!(store.len(), capacity);

        store.set(new_key.clone(), new_value, None);

        prop_assert_eq!(store.len(), capacity);
        prop_assert!(!store.has(&keys[0]), "Oldest key '{}' should have been evicted", keys[0]);
        prop_assert!(store.has(&new_key));
        for key in keys.iter().skip(1) {
            prop_assert!(store.has(key), "Key '{}' should still exist", key);
        }
    }

    // A read moves a key out of the eviction slot; the next oldest goes instead.
    #[test]
    fn prop_lru_access_tracking(
        keys in unique_keys_strategy(3, 8),
        new_value in value_strategy()
    ) {
        let new_key = "fresh:key".to_string();
        let (mut store, _) = manual_store(keys.len());

        for key in &keys {
            store.set(key.clone(), format!("value_{}", key), None);
        }

        let accessed_key = keys[0].clone();
        prop_assert!(store.get(&accessed_key).is_some());

        store.set(new_key.clone(), new_value, None);

        prop_assert!(store.has(&accessed_key), "Touched key '{}' was evicted", accessed_key);
        prop_assert!(!store.has(&keys[1]), "Key '{}' should have been evicted", keys[1]);
        prop_assert!(store.has(&new_key));
    }

    // Prefix invalidation removes exactly the keys with that prefix.
    #[test]
    fn prop_invalidate_pattern_exact(
        keys in unique_keys_strategy(1, 30),
        prefix in "(user|product|order|news):"
    ) {
        let (mut store, _) = manual_store(TEST_MAX_SIZE);
        for key in &keys {
            store.set(key.clone(), "v".to_string(), None);
        }

        let matching: HashSet<&String> = keys.iter().filter(|k| k.starts_with(&prefix)).collect();
        let removed = store.invalidate_pattern(&prefix);

        prop_assert_eq!(removed, matching.len());
        for key in &keys {
            prop_assert_eq!(store.has(key), !matching.contains(key));
        }
    }
}

// == Concurrent Access ==
proptest! {
    #![proptest_config(ProptestConfig::with_cases(25))]

    // Interleaved tasks sharing one manager keep the capacity bound and sane stats.
    #[test]
    fn prop_concurrent_operation_correctness(
        initial in prop::collection::vec((key_strategy(), value_strategy()), 1..20),
        operations in prop::collection::vec(cache_op_strategy(), 10..50)
    ) {
        use crate::cache::CacheManager;

        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(async {
            let manager: CacheManager<String> = CacheManager::new(16, TEST_DEFAULT_TTL_MS);
            for (key, value) in &initial {
                manager.set(key.clone(), value.clone(), None).await;
            }

            let mut handles = vec![];
            for op in operations {
                let manager = manager.clone();
                handles.push(tokio::spawn(async move {
                    match op {
                        CacheOp::Set { key, value } => manager.set(key, value, None).await,
                        CacheOp::Get { key } => {
                            manager.get(&key).await;
                        }
                        CacheOp::Has { key } => {
                            manager.has(&key).await;
                        }
                        CacheOp::Delete { key } => {
                            manager.delete(&key).await;
                        }
                        CacheOp::Advance { .. } => {}
                    }
                }));
            }

            for handle in handles {
                handle.await.expect("Task should not panic");
            }

            let stats = manager.stats().await;
            prop_assert!(stats.size <= 16, "Cache should not exceed max size");
            let hit_rate = stats.hit_rate();
            prop_assert!(
                (0.0..=100.0).contains(&hit_rate),
                "Hit rate should be a percentage, got {}",
                hit_rate
            );
            Ok(())
        })?;
    }
}
