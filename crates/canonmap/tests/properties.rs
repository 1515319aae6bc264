//! Property-based checks for spec.md §8's laws, run with `quickcheck` over
//! small generated record shapes (full `Arbitrary` coverage of every `Key`
//! variant, including recursion and the symbol/date/regex leaves, is
//! exercised more narrowly by the unit tests colocated with
//! `canonmap-fingerprint`/`canonmap-key`; this suite focuses on the two
//! laws that are awkward to state without many distinct generated inputs).

use canonmap::{Engine, Key, Options};
use quickcheck_macros::quickcheck;
use std::collections::BTreeMap;

fn record_from_fields(fields: &[(String, i64)]) -> Key {
    let map: BTreeMap<String, Key> = fields.iter().map(|(k, v)| (k.clone(), Key::Int(*v))).collect();
    Key::Record(map)
}

/// P3: permuting a record's field insertion order does not change its
/// fingerprint, because the canonical form always walks fields in
/// lexicographic order regardless of how the caller built the `BTreeMap`.
#[quickcheck]
fn record_field_order_is_irrelevant(mut fields: Vec<(String, i64)>) -> bool {
    // `dedup_by` only collapses *consecutive* duplicates; quickcheck readily
    // generates non-adjacent repeats of the same key, and `record_from_fields`
    // collects into a `BTreeMap` where the last value for a key wins. Sorting
    // first brings every duplicate key adjacent so dedup removes all of them,
    // leaving one (key, value) pair per key before either record is built.
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields.dedup_by(|a, b| a.0 == b.0);
    let forward = record_from_fields(&fields);
    let mut reversed_fields = fields.clone();
    reversed_fields.reverse();
    let reversed = record_from_fields(&reversed_fields);

    let mut engine: Engine<&'static str> = Engine::new(Options::default());
    let fp_forward = engine.get_fingerprint(&forward);
    let fp_reversed = engine.get_fingerprint(&reversed);
    fp_forward == fp_reversed
}

/// P1: two calls to `get_fingerprint` on the same key yield the same
/// string, whether or not the container hit the tiered cache on the
/// second call.
#[quickcheck]
fn fingerprint_is_pure_across_repeated_calls(fields: Vec<(String, i64)>) -> bool {
    let key = record_from_fields(&fields);
    let mut engine: Engine<&'static str> = Engine::new(Options::default());
    let a = engine.get_fingerprint(&key);
    let b = engine.get_fingerprint(&key);
    let c = engine.get_fingerprint(&key.clone());
    a == b && b == c
}

/// P2: structurally equal keys (same fields, same values, any insertion
/// order) always collide on `put`/`get`.
#[quickcheck]
fn structurally_equal_records_collide(mut fields: Vec<(String, i64)>) -> bool {
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields.dedup_by(|a, b| a.0 == b.0);
    if fields.is_empty() {
        return true;
    }
    let mut engine: Engine<i32> = Engine::new(Options::default());
    let k1 = record_from_fields(&fields);
    let mut shuffled = fields.clone();
    shuffled.rotate_left(1);
    let k2 = record_from_fields(&shuffled);

    engine.put(k1, 42);
    engine.get(k2) == Some(42)
}
