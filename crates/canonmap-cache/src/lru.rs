use indexmap::IndexMap;

/// A single LRU level: `IndexMap` preserves insertion order, so the front of
/// the map is always the least-recently-used entry and the back is always
/// the most-recently-used one. "Touching" an entry moves it to the back by
/// removing and reinserting it (`shift_remove` + `insert`).
pub(crate) struct LruLevel<V> {
    capacity: usize,
    entries: IndexMap<String, V>,
}

impl<V: Clone> LruLevel<V> {
    pub(crate) fn new(capacity: usize) -> Self {
        LruLevel {
            capacity,
            entries: IndexMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn peek(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Reads a value and marks it most-recently-used.
    pub(crate) fn touch_get(&mut self, key: &str) -> Option<V> {
        let value = self.entries.shift_remove(key)?;
        self.entries.insert(key.to_string(), value.clone());
        Some(value)
    }

    /// Inserts (or overwrites) a value as most-recently-used, evicting the
    /// LRU tail if the level is at capacity. Returns the evicted key, if any.
    pub(crate) fn insert(&mut self, key: String, value: V) -> Option<String> {
        self.entries.shift_remove(&key);
        self.entries.insert(key, value);

        if self.entries.len() > self.capacity {
            // shift_remove_index(0) evicts the oldest (least-recently-used)
            // entry, which sits at the front of insertion order.
            self.entries
                .shift_remove_index(0)
                .map(|(evicted_key, _)| evicted_key)
        } else {
            None
        }
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.shift_remove(key)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn evicts_least_recently_used_on_overflow() {
        let mut lvl = LruLevel::new(2);
        assert_eq!(lvl.insert("a".into(), 1), None);
        assert_eq!(lvl.insert("b".into(), 2), None);
        // touch "a" so "b" becomes the LRU tail.
        assert_eq!(lvl.touch_get("a"), Some(1));
        assert_eq!(lvl.insert("c".into(), 3), Some("b".to_string()));
        assert_eq!(lvl.peek("a"), Some(&1));
        assert_eq!(lvl.peek("b"), None);
        assert_eq!(lvl.peek("c"), Some(&3));
    }
}
