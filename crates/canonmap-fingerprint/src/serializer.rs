use crate::strategies::{self, Strategy};
use canonmap_cache::{CacheOptions, TieredCache};
use canonmap_key::{Key, OpaqueId};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy)]
pub struct SerializerOptions {
    pub enable_adaptive_serialization: bool,
    pub enable_cache: bool,
    pub cache: CacheOptions,
    pub max_depth: usize,
    /// Reverses the default opaque-symbol collapse: each `Key::OpaqueSym`
    /// then fingerprints to a canonical form that includes its raw id,
    /// making distinct opaque symbols compare unequal. Off by default per
    /// spec.md §4.1/§9.
    pub distinct_opaque_symbols: bool,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        SerializerOptions {
            enable_adaptive_serialization: true,
            enable_cache: true,
            cache: CacheOptions::default(),
            max_depth: 50,
            distinct_opaque_symbols: false,
        }
    }
}

/// The Adaptive Serializer: dispatches each `Key` to the highest-priority
/// applicable strategy, bounding recursion depth and consulting the tiered
/// fingerprint cache for container values.
pub struct Serializer {
    opts: SerializerOptions,
    strategies: Vec<Box<dyn Strategy>>,
    cache: Option<TieredCache<String>>,
}

impl Serializer {
    pub fn new(opts: SerializerOptions) -> Self {
        let cache = opts.enable_cache.then(|| TieredCache::new(opts.cache));
        Serializer {
            opts,
            strategies: strategies::table(),
            cache,
        }
    }

    /// Total, deterministic fingerprint of `key`. Never panics.
    pub fn fingerprint(&mut self, key: &Key) -> String {
        self.dispatch(key, 0)
    }

    pub fn cache_stats(&self) -> Option<canonmap_cache::CacheReport> {
        self.cache.as_ref().map(|c| c.stats())
    }

    pub fn clear_cache(&mut self) {
        if let Some(cache) = &mut self.cache {
            cache.clear();
        }
    }

    pub(crate) fn opaque_symbol_canonical_form(&self, id: OpaqueId) -> String {
        if self.opts.distinct_opaque_symbols {
            format!("Symbol(#{})", id.raw())
        } else {
            "Symbol()".to_string()
        }
    }

    /// Recursive dispatch entry point used both by `fingerprint` and by
    /// strategies that need to fingerprint a child value.
    pub(crate) fn dispatch(&mut self, key: &Key, depth: usize) -> String {
        if let Key::Circular(id) = key {
            return format!("[Circular:{id}]");
        }
        if depth > self.opts.max_depth {
            return "[MaxDepthExceeded]".to_string();
        }
        if !self.opts.enable_adaptive_serialization {
            return minimal_canonical_form(key);
        }

        if key.is_container() {
            // Taken out for the duration of the lookup/compute/store so that
            // `self.emit` (which needs `&mut self` to recurse) isn't fighting
            // an outstanding `&mut self.cache` borrow — the same technique
            // `emit` itself uses for the strategy table below.
            match self.cache.take() {
                Some(mut cache) => {
                    let cache_key = stable_id(key);
                    let result = if let Some(hit) = cache.get(&cache_key) {
                        hit
                    } else {
                        cache.record_miss();
                        let computed = self.emit(key, depth);
                        cache.put(cache_key, computed.clone());
                        computed
                    };
                    self.cache = Some(cache);
                    result
                }
                None => self.emit(key, depth),
            }
        } else {
            // Primitives bypass the cache: computing their canonical form is
            // trivially cheap and caching them would only add pollution.
            self.emit(key, depth)
        }
    }

    fn emit(&mut self, key: &Key, depth: usize) -> String {
        // The table is stored on `self`, but strategies need `&mut self` to
        // recurse through `dispatch`. Taking it out for the duration of the
        // loop sidesteps that aliasing rather than cloning the table.
        let strategies = std::mem::take(&mut self.strategies);
        let mut rendered = None;
        for strategy in &strategies {
            if !strategy.applies(key) {
                continue;
            }
            match strategy.emit(self, key, depth) {
                Ok(s) => {
                    rendered = Some(s);
                    break;
                }
                Err(_) => continue,
            }
        }
        self.strategies = strategies;

        // Unreachable in practice: `FastHashFallbackStrategy` applies to
        // every key and never errors. Kept as the literal absolute fallback
        // spec.md describes, in case a future strategy narrows that net.
        rendered.unwrap_or_else(|| "[UnserializableObject]".to_string())
    }
}

/// Content-derived stable id for a container value, used as the fingerprint
/// cache's lookup key. Deliberately NOT based on any per-object/pointer
/// identity — spec.md §9 flags randomized object-identity cache keys as a
/// performance bug (structurally-equal-but-distinct inputs never hit), and
/// this closes it: two structurally identical containers always share a
/// cache key and therefore a cache slot.
fn stable_id(key: &Key) -> String {
    let mut hasher = fxhash::FxHasher::default();
    key.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// The reduced canonical form used when `enable_adaptive_serialization` is
/// off: every key's `Debug` representation, which is still deterministic and
/// total but skips strategy dispatch, cycle bookkeeping, and the cache.
fn minimal_canonical_form(key: &Key) -> String {
    format!("{key:?}")
}

#[cfg(test)]
mod test {
    use super::*;
    use canonmap_key::Key;

    fn ser() -> Serializer {
        Serializer::new(SerializerOptions::default())
    }

    #[test]
    fn primitive_forms() {
        let mut s = ser();
        assert_eq!(s.fingerprint(&Key::Null), "null");
        assert_eq!(s.fingerprint(&Key::Bool(true)), "true");
        assert_eq!(s.fingerprint(&Key::Int(42)), "42");
        assert_eq!(s.fingerprint(&Key::str("hi")), "\"hi\"");
    }

    #[test]
    fn record_field_order_is_irrelevant() {
        let mut s = ser();
        let a = Key::record([("id".into(), Key::Int(1)), ("name".into(), Key::str("A"))]);
        let b = Key::record([("name".into(), Key::str("A")), ("id".into(), Key::Int(1))]);
        assert_eq!(s.fingerprint(&a), s.fingerprint(&b));
    }

    #[test]
    fn date_collides_on_equal_epoch() {
        let mut s = ser();
        assert_eq!(
            s.fingerprint(&Key::Date(1705314600000)),
            s.fingerprint(&Key::Date(1705314600000))
        );
    }

    #[test]
    fn opaque_symbols_collapse_by_default() {
        let mut s = ser();
        let a = s.fingerprint(&Key::opaque_symbol());
        let b = s.fingerprint(&Key::opaque_symbol());
        assert_eq!(a, b);
        assert_eq!(a, "Symbol()");
    }

    #[test]
    fn distinct_opaque_symbols_opt_out() {
        let mut opts = SerializerOptions::default();
        opts.distinct_opaque_symbols = true;
        let mut s = Serializer::new(opts);
        let a = s.fingerprint(&Key::opaque_symbol());
        let b = s.fingerprint(&Key::opaque_symbol());
        assert_ne!(a, b);
    }

    #[test]
    fn interned_symbols_compare_by_registered_key() {
        let mut s = ser();
        let a = s.fingerprint(&Key::InternedSym("k".into()));
        let b = s.fingerprint(&Key::InternedSym("k".into()));
        let c = s.fingerprint(&Key::InternedSym("other".into()));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn circular_sentinel_renders_without_recursing() {
        let mut s = ser();
        let k = Key::record([("id".into(), Key::Int(1)), ("self".into(), Key::Circular(7))]);
        assert_eq!(s.fingerprint(&k), "{\"id\":1,\"self\":[Circular:7]}");
    }

    #[test]
    fn max_depth_exceeded_is_a_sentinel_not_a_panic() {
        let mut opts = SerializerOptions::default();
        opts.max_depth = 2;
        let mut s = Serializer::new(opts);
        let nested = Key::list([Key::list([Key::list([Key::Int(1)])])]);
        assert!(s.fingerprint(&nested).contains("[MaxDepthExceeded]"));
    }

    #[test]
    fn container_fingerprints_are_cached_and_content_addressed() {
        let mut s = ser();
        let a = Key::record([("id".into(), Key::Int(1))]);
        let b = Key::record([("id".into(), Key::Int(1))]); // distinct instance, equal content
        let fp_a = s.fingerprint(&a);
        assert_eq!(s.cache_stats().unwrap().misses, 1); // first container fingerprint misses both cache levels once
        let fp_b = s.fingerprint(&b);
        assert_eq!(fp_a, fp_b);
        assert_eq!(s.cache_stats().unwrap().l2_hits, 1);
    }

    #[test]
    fn invalid_regex_source_falls_through_to_hash_fallback() {
        let mut s = ser();
        let k = Key::Regex {
            source: "(unclosed".to_string(),
            flags: "".to_string(),
        };
        let fp = s.fingerprint(&k);
        assert!(fp.starts_with("[regexp#"), "got {fp}");
    }

    #[test]
    fn disabling_adaptive_serialization_uses_minimal_form() {
        let mut opts = SerializerOptions::default();
        opts.enable_adaptive_serialization = false;
        let mut s = Serializer::new(opts);
        assert_eq!(s.fingerprint(&Key::Int(3)), "Int(3)");
    }
}
