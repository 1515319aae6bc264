use canonmap_key::Key;
use indexmap::IndexMap;

/// Two aligned mappings keyed by fingerprint: F→V (dense, authoritative
/// size) and F→K₀ (original key, for iteration). Both are `IndexMap`s so
/// that iteration order follows first-insertion order of each fingerprint
/// (spec.md P12), not hash order.
#[derive(Default)]
pub(crate) struct PrimaryStore<V> {
    values: IndexMap<String, V>,
    original_keys: IndexMap<String, Key>,
}

impl<V> PrimaryStore<V> {
    pub(crate) fn new() -> Self {
        PrimaryStore {
            values: IndexMap::new(),
            original_keys: IndexMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Writes `F→v`, and `F→k₀` only if this fingerprint has never been seen
    /// before — first-observed-K₀-wins per spec.md §3/§9's resolved open
    /// question (DESIGN.md).
    pub(crate) fn put(&mut self, fingerprint: String, key: Key, value: V) {
        self.original_keys.entry(fingerprint.clone()).or_insert(key);
        self.values.insert(fingerprint, value);
    }

    pub(crate) fn get(&self, fingerprint: &str) -> Option<&V> {
        self.values.get(fingerprint)
    }

    pub(crate) fn contains(&self, fingerprint: &str) -> bool {
        self.values.contains_key(fingerprint)
    }

    /// Removes both maps for `fingerprint`, returning the value if present.
    pub(crate) fn remove(&mut self, fingerprint: &str) -> Option<V> {
        self.original_keys.shift_remove(fingerprint);
        self.values.shift_remove(fingerprint)
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
        self.original_keys.clear();
    }

    /// Iterates `(k₀, v)` pairs in first-insertion order. A fingerprint
    /// present in `values` but missing from `original_keys` is a consistency
    /// fault and is skipped; the caller is expected to count it.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &V)> {
        self.values.iter().filter_map(move |(fp, v)| self.original_keys.get(fp).map(|k| (k, v)))
    }

    /// Count of entries in `values` with no matching `original_keys` entry —
    /// the alignment fault `compact()` repairs (spec.md §4.5).
    pub(crate) fn orphaned_value_count(&self) -> usize {
        self.values.keys().filter(|fp| !self.original_keys.contains_key(fp.as_str())).count()
    }

    /// Removes any F present in F→V but absent in F→K₀ — spec.md §4.5
    /// `compact()`'s consistency repair. Returns how many were removed.
    pub(crate) fn compact(&mut self) -> usize {
        let orphaned: Vec<String> = self
            .values
            .keys()
            .filter(|fp| !self.original_keys.contains_key(fp.as_str()))
            .cloned()
            .collect();
        for fp in &orphaned {
            self.values.shift_remove(fp);
        }
        orphaned.len()
    }

    pub(crate) fn export(&self) -> Vec<(Key, V)>
    where
        V: Clone,
    {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_observed_key_wins_on_overwrite() {
        let mut store = PrimaryStore::new();
        store.put("fp1".to_string(), Key::str("first"), "v1");
        store.put("fp1".to_string(), Key::str("second"), "v2");
        assert_eq!(store.len(), 1);
        let (k, v) = store.iter().next().unwrap();
        assert_eq!(*k, Key::str("first"));
        assert_eq!(*v, "v2");
    }

    #[test]
    fn iteration_follows_first_insertion_order() {
        let mut store = PrimaryStore::new();
        store.put("b".to_string(), Key::str("b"), 2);
        store.put("a".to_string(), Key::str("a"), 1);
        let order: Vec<i32> = store.iter().map(|(_, v)| *v).collect();
        assert_eq!(order, vec![2, 1]);
    }

    #[test]
    fn compact_removes_orphaned_values() {
        let mut store = PrimaryStore::new();
        store.put("fp1".to_string(), Key::str("k"), "v");
        store.original_keys.shift_remove("fp1"); // simulate an alignment fault
        assert_eq!(store.orphaned_value_count(), 1);
        assert_eq!(store.compact(), 1);
        assert_eq!(store.len(), 0);
    }
}
