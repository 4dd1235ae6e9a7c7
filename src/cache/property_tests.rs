//! Property-Based Tests for the Cache Engine
//!
//! Uses proptest to verify the engine's guarantees over arbitrary keys,
//! payloads and operation sequences.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use tempfile::tempdir;

use crate::cache::{paths, Cache};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 8;

// == Strategies ==
/// Generates arbitrary keys, including empty and non-alphanumeric ones
fn key_strategy() -> impl Strategy<Value = String> {
    ".{0,48}"
}

/// Generates keys from a small space so operation sequences revisit them
fn dense_key_strategy() -> impl Strategy<Value = String> {
    "[ab]{1,4}"
}

/// Generates binary payloads of assorted sizes
fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

/// Generates a sequence of cache operations for model-based testing
#[derive(Debug, Clone)]
enum CacheOp {
    Write { key: String, value: Vec<u8> },
    Read { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (dense_key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Write { key, value }),
        dense_key_strategy().prop_map(|key| CacheOp::Read { key }),
        dense_key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

fn temp_cache() -> (tempfile::TempDir, Cache) {
    let dir = tempdir().unwrap();
    let cache = Cache::new(dir.path().join("c")).unwrap();
    (dir, cache)
}

proptest! {
    // For any key, hashing is deterministic and two distinct keys never
    // share a digest.
    #[test]
    fn prop_digest_deterministic(key in key_strategy()) {
        prop_assert_eq!(paths::key_digest(&key), paths::key_digest(&key));
    }

    #[test]
    fn prop_distinct_keys_distinct_digests(k1 in key_strategy(), k2 in key_strategy()) {
        prop_assume!(k1 != k2);
        prop_assert_ne!(paths::key_digest(&k1), paths::key_digest(&k2));
    }

    // For any key, however hostile, the resolved path stays inside the
    // namespace directory and carries a fixed-length filename.
    #[test]
    fn prop_resolved_paths_stay_inside_namespace(key in key_strategy()) {
        let ns = Path::new("/srv/cache");
        let path = paths::entry_path(ns, &key);
        prop_assert!(path.starts_with(ns), "path escaped the namespace");
        let name = path.file_name().unwrap().to_str().unwrap();
        prop_assert_eq!(name.len(), 46, "unexpected entry filename shape");
    }
}

// Each case below builds a real cache directory, so these run with fewer
// cases to stay fast.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // For any key-value pair, storing the pair and then reading it back
    // returns the exact bytes that were stored.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let (_dir, cache) = temp_cache();
        let ns = cache.root();

        ns.write(&key, &value).unwrap();
        prop_assert_eq!(ns.read(&key, None).unwrap(), Some(value), "round-trip value mismatch");
    }

    // For any key, storing V1 and then V2 makes a read return V2, with a
    // single entry on disk.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy(),
    ) {
        let (_dir, cache) = temp_cache();
        let ns = cache.root();

        ns.write(&key, &value1).unwrap();
        ns.write(&key, &value2).unwrap();

        prop_assert_eq!(ns.read(&key, None).unwrap(), Some(value2), "overwrite should win");
        prop_assert_eq!(ns.entry_count().unwrap(), 1, "overwrite must not add entries");
    }

    // For any stored key, deleting it makes a subsequent read miss.
    #[test]
    fn prop_delete_removes_entry(key in key_strategy(), value in value_strategy()) {
        let (_dir, cache) = temp_cache();
        let ns = cache.root();

        ns.write(&key, &value).unwrap();
        prop_assert!(ns.is_valid(&key, None).unwrap(), "key should exist before delete");

        ns.delete(&key).unwrap();
        prop_assert_eq!(ns.read(&key, None).unwrap(), None, "key should be gone after delete");
    }

    // For any sequence of serial writes, the entry count never exceeds the
    // limit and converges to min(distinct keys, limit).
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec(("[a-z]{1,8}", value_strategy()), 1..40)
    ) {
        let dir = tempdir().unwrap();
        let cache = Cache::with_capacity(dir.path().join("c"), TEST_MAX_ENTRIES).unwrap();
        let ns = cache.root();

        let mut seen = HashSet::new();
        for (key, value) in entries {
            ns.write(&key, &value).unwrap();
            seen.insert(key);
            let count = ns.entry_count().unwrap();
            prop_assert!(
                count <= TEST_MAX_ENTRIES,
                "entry count {} exceeds limit {}",
                count,
                TEST_MAX_ENTRIES
            );
        }
        prop_assert_eq!(
            ns.entry_count().unwrap(),
            seen.len().min(TEST_MAX_ENTRIES),
            "serial writes should converge to the limit"
        );
    }

    // For any operation sequence without expiration or eviction, reads
    // agree with an in-memory map driven by the same operations.
    #[test]
    fn prop_reads_match_model(ops in prop::collection::vec(cache_op_strategy(), 1..40)) {
        let (_dir, cache) = temp_cache();
        let ns = cache.root();
        let mut model: HashMap<String, Vec<u8>> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Write { key, value } => {
                    ns.write(&key, &value).unwrap();
                    model.insert(key, value);
                }
                CacheOp::Read { key } => {
                    prop_assert_eq!(
                        ns.read(&key, None).unwrap(),
                        model.get(&key).cloned(),
                        "read disagrees with the model"
                    );
                }
                CacheOp::Delete { key } => {
                    ns.delete(&key).unwrap();
                    model.remove(&key);
                }
            }
        }
        prop_assert_eq!(ns.entry_count().unwrap(), model.len(), "final count disagrees");
    }

    // For any operation sequence, the hit/miss/write counters reflect
    // exactly what happened.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..40)) {
        let (_dir, cache) = temp_cache();
        let ns = cache.root();
        let mut present: HashSet<String> = HashSet::new();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;
        let mut expected_writes: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Write { key, value } => {
                    ns.write(&key, &value).unwrap();
                    present.insert(key);
                    expected_writes += 1;
                }
                CacheOp::Read { key } => {
                    ns.read(&key, None).unwrap();
                    if present.contains(&key) {
                        expected_hits += 1;
                    } else {
                        expected_misses += 1;
                    }
                }
                CacheOp::Delete { key } => {
                    ns.delete(&key).unwrap();
                    present.remove(&key);
                }
            }
        }

        let snap = cache.stats();
        prop_assert_eq!(snap.hits, expected_hits, "hits mismatch");
        prop_assert_eq!(snap.misses, expected_misses, "misses mismatch");
        prop_assert_eq!(snap.writes, expected_writes, "writes mismatch");
    }

    // For any set of stored keys, an ageless clear removes them all.
    #[test]
    fn prop_clear_empties_namespace(keys in prop::collection::hash_set("[a-z]{1,12}", 1..20)) {
        let (_dir, cache) = temp_cache();
        let ns = cache.root();

        for key in &keys {
            ns.write(key, b"x").unwrap();
        }
        prop_assert_eq!(ns.clear(None).unwrap(), keys.len(), "clear removed a different count");
        prop_assert_eq!(ns.entry_count().unwrap(), 0, "entries survived the clear");
    }
}

// Separate proptest block with fewer cases for time-sensitive expiry tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // For any entry, once its age passes the limit a checking read removes
    // it, and afterwards even an ageless read misses.
    #[test]
    fn prop_expiry_behavior(key in dense_key_strategy(), value in value_strategy()) {
        let (_dir, cache) = temp_cache();
        let ns = cache.root();
        let max_age = Some(Duration::from_secs(1));

        ns.write(&key, &value).unwrap();
        prop_assert_eq!(
            ns.read(&key, max_age).unwrap(),
            Some(value),
            "entry should be readable before its max age"
        );

        // Wait for the entry to pass its max age
        sleep(Duration::from_millis(1100));

        prop_assert!(!ns.evict_if_expired(&key, max_age).unwrap(), "entry should have expired");
        prop_assert_eq!(ns.read(&key, None).unwrap(), None, "expired entry should be gone");
    }
}
