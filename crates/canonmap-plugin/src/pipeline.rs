use crate::error::PluginError;
use crate::lifecycle::PluginState;
use canonmap_key::Key;
use canonmap_recovery::ErrorKind;
use std::time::{Duration, Instant};

/// A point-in-time snapshot handed to `on_metrics` hooks. Populated by the
/// engine; this crate only defines its shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub puts: u64,
    pub gets: u64,
    pub removes: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

/// A subset of the hook set may be implemented; every method defaults to a
/// pass-through no-op, per spec.md §4.4 ("empty-default methods allow
/// plugins to provide only what they care about").
pub trait Plugin<V>: Send {
    fn name(&self) -> &str;

    /// Higher runs first. Ties are broken by registration order (`Pipeline`
    /// uses a stable sort).
    fn priority(&self) -> i32 {
        0
    }

    fn on_install(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
    fn on_enable(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
    fn on_disable(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
    fn on_uninstall(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    fn before_put(&mut self, key: Key, value: V) -> Result<(Key, V), PluginError> {
        Ok((key, value))
    }
    fn after_put(&mut self, _key: &Key, _value: &V) -> Result<(), PluginError> {
        Ok(())
    }
    fn before_get(&mut self, key: Key) -> Result<Key, PluginError> {
        Ok(key)
    }
    fn after_get(&mut self, value: Option<V>) -> Result<Option<V>, PluginError> {
        Ok(value)
    }
    fn before_remove(&mut self, key: Key) -> Result<Key, PluginError> {
        Ok(key)
    }
    fn after_remove(&mut self, value: Option<V>) -> Result<Option<V>, PluginError> {
        Ok(value)
    }
    /// Returning `Ok(false)` vetoes the clear.
    fn before_clear(&mut self) -> Result<bool, PluginError> {
        Ok(true)
    }
    fn after_clear(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    fn on_error(&mut self, _op_name: &str, _kind: ErrorKind) {}
    fn on_metrics(&mut self, _snapshot: &MetricsSnapshot) {}
}

struct PluginHandle<V> {
    plugin: Box<dyn Plugin<V>>,
    state: PluginState,
    registration_order: usize,
    fault_count: u32,
}

/// Priority-ordered collection of plugins, run around every core operation.
/// A plugin that faults is isolated: the fault is counted against it and,
/// once its `ErrorKind::Plugin` escalation threshold is crossed, it is
/// auto-disabled — the operation itself always proceeds with whatever
/// (key, value) the pipeline had threaded through so far.
pub struct Pipeline<V> {
    handles: Vec<PluginHandle<V>>,
    next_registration_order: usize,
    lifecycle_timeout: Duration,
}

impl<V: Clone> Default for Pipeline<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Pipeline<V> {
    pub fn new() -> Self {
        Pipeline {
            handles: Vec::new(),
            next_registration_order: 0,
            lifecycle_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_lifecycle_timeout(mut self, timeout: Duration) -> Self {
        self.lifecycle_timeout = timeout;
        self
    }

    /// Installs and immediately enables `plugin`. Returns its registered
    /// name for later `disable`/`uninstall` lookups.
    ///
    /// Re-registering a name already present in the pipeline replaces the
    /// prior instance: its `on_uninstall` hook runs first (via
    /// [`Self::uninstall`]), per spec.md §4.4's lifecycle — "Re-registering a
    /// plugin by name replaces the prior instance after running its
    /// `on_uninstall`."
    pub fn register(&mut self, mut plugin: Box<dyn Plugin<V>>) -> Result<String, PluginError> {
        self.run_lifecycle_hook(&mut *plugin, "on_install", Plugin::on_install)?;
        let name = plugin.name().to_string();
        if self.state_of(&name).is_some() {
            self.uninstall(&name)?;
        }
        let order = self.next_registration_order;
        self.next_registration_order += 1;
        self.handles.push(PluginHandle {
            plugin,
            state: PluginState::Installed,
            registration_order: order,
            fault_count: 0,
        });
        self.enable(&name)?;
        Ok(name)
    }

    pub fn enable(&mut self, name: &str) -> Result<(), PluginError> {
        let timeout = self.lifecycle_timeout;
        if let Some(handle) = self.find_mut(name) {
            if handle.state.can_enable() {
                Self::run_lifecycle_hook_on(timeout, &mut *handle.plugin, "on_enable", Plugin::on_enable)?;
                handle.state = PluginState::Enabled;
            }
        }
        Ok(())
    }

    pub fn disable(&mut self, name: &str) -> Result<(), PluginError> {
        let timeout = self.lifecycle_timeout;
        if let Some(handle) = self.find_mut(name) {
            if handle.state.can_disable() {
                Self::run_lifecycle_hook_on(timeout, &mut *handle.plugin, "on_disable", Plugin::on_disable)?;
                handle.state = PluginState::Disabled;
            }
        }
        Ok(())
    }

    pub fn uninstall(&mut self, name: &str) -> Result<(), PluginError> {
        let timeout = self.lifecycle_timeout;
        if let Some(handle) = self.find_mut(name) {
            Self::run_lifecycle_hook_on(timeout, &mut *handle.plugin, "on_uninstall", Plugin::on_uninstall)?;
            handle.state = PluginState::Uninstalled;
        }
        self.handles.retain(|h| h.state != PluginState::Uninstalled);
        Ok(())
    }

    pub fn state_of(&self, name: &str) -> Option<PluginState> {
        self.handles.iter().find(|h| h.plugin.name() == name).map(|h| h.state)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut PluginHandle<V>> {
        self.handles.iter_mut().find(|h| h.plugin.name() == name)
    }

    fn run_lifecycle_hook(
        &mut self,
        plugin: &mut dyn Plugin<V>,
        hook_name: &'static str,
        call: impl FnOnce(&mut dyn Plugin<V>) -> Result<(), PluginError>,
    ) -> Result<(), PluginError> {
        Self::run_lifecycle_hook_on(self.lifecycle_timeout, plugin, hook_name, call)
    }

    fn run_lifecycle_hook_on(
        timeout: Duration,
        plugin: &mut dyn Plugin<V>,
        hook_name: &'static str,
        call: impl FnOnce(&mut dyn Plugin<V>) -> Result<(), PluginError>,
    ) -> Result<(), PluginError> {
        let started = Instant::now();
        let result = call(plugin);
        if started.elapsed() > timeout {
            tracing::warn!(plugin = plugin.name(), hook_name, "plugin: lifecycle hook exceeded timeout");
            return Err(PluginError::LifecycleTimeout);
        }
        result
    }

    /// Ordered, enabled handles, highest priority first (stable among ties).
    fn active_in_priority_order(&mut self) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..self.handles.len())
            .filter(|&i| self.handles[i].state.is_active())
            .collect();
        idx.sort_by(|&a, &b| {
            self.handles[b]
                .plugin
                .priority()
                .cmp(&self.handles[a].plugin.priority())
                .then(self.handles[a].registration_order.cmp(&self.handles[b].registration_order))
        });
        idx
    }

    fn record_fault(&mut self, idx: usize, op_name: &str) {
        let threshold = ErrorKind::Plugin.default_policy().escalation_threshold;
        let handle = &mut self.handles[idx];
        handle.fault_count += 1;
        handle.plugin.on_error(op_name, ErrorKind::Plugin);
        tracing::warn!(
            plugin = handle.plugin.name(),
            op_name,
            fault_count = handle.fault_count,
            "plugin: hook faulted"
        );
        if handle.fault_count >= threshold {
            let _ = handle.plugin.on_disable();
            handle.state = PluginState::Disabled;
            tracing::warn!(plugin = handle.plugin.name(), "plugin: auto-disabled after repeated faults");
        }
    }

    pub fn run_before_put(&mut self, mut key: Key, mut value: V) -> (Key, V) {
        for idx in self.active_in_priority_order() {
            match self.handles[idx].plugin.before_put(key.clone(), value.clone()) {
                Ok((k, v)) => {
                    key = k;
                    value = v;
                }
                Err(_) => self.record_fault(idx, "before_put"),
            }
        }
        (key, value)
    }

    pub fn run_after_put(&mut self, key: &Key, value: &V) {
        for idx in self.active_in_priority_order() {
            if self.handles[idx].plugin.after_put(key, value).is_err() {
                self.record_fault(idx, "after_put");
            }
        }
    }

    pub fn run_before_get(&mut self, mut key: Key) -> Key {
        for idx in self.active_in_priority_order() {
            match self.handles[idx].plugin.before_get(key.clone()) {
                Ok(k) => key = k,
                Err(_) => self.record_fault(idx, "before_get"),
            }
        }
        key
    }

    pub fn run_after_get(&mut self, mut value: Option<V>) -> Option<V> {
        for idx in self.active_in_priority_order() {
            let passed = value.clone();
            match self.handles[idx].plugin.after_get(passed) {
                Ok(v) => value = v,
                Err(_) => self.record_fault(idx, "after_get"),
            }
        }
        value
    }

    pub fn run_before_remove(&mut self, mut key: Key) -> Key {
        for idx in self.active_in_priority_order() {
            match self.handles[idx].plugin.before_remove(key.clone()) {
                Ok(k) => key = k,
                Err(_) => self.record_fault(idx, "before_remove"),
            }
        }
        key
    }

    pub fn run_after_remove(&mut self, mut value: Option<V>) -> Option<V> {
        for idx in self.active_in_priority_order() {
            let passed = value.clone();
            match self.handles[idx].plugin.after_remove(passed) {
                Ok(v) => value = v,
                Err(_) => self.record_fault(idx, "after_remove"),
            }
        }
        value
    }

    /// Returns `false` if any enabled plugin vetoes the clear.
    pub fn run_before_clear(&mut self) -> bool {
        let mut proceed = true;
        for idx in self.active_in_priority_order() {
            match self.handles[idx].plugin.before_clear() {
                Ok(true) => {}
                Ok(false) => proceed = false,
                Err(_) => self.record_fault(idx, "before_clear"),
            }
        }
        proceed
    }

    pub fn run_after_clear(&mut self) {
        for idx in self.active_in_priority_order() {
            if self.handles[idx].plugin.after_clear().is_err() {
                self.record_fault(idx, "after_clear");
            }
        }
    }

    pub fn run_on_metrics(&mut self, snapshot: &MetricsSnapshot) {
        for idx in self.active_in_priority_order() {
            self.handles[idx].plugin.on_metrics(snapshot);
        }
    }
}
