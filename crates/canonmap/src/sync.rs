//! `SyncEngine`: a `Mutex`-wrapped [`crate::Engine`] for the multi-threaded
//! use SPEC_FULL.md §5 permits but does not require ("An implementation MAY
//! wrap the whole engine in a single mutex for multi-threaded use"). The
//! core itself stays single-writer; this is purely an outer convenience so
//! an `Arc<SyncEngine<V>>` can be shared across threads (or handed to
//! `canonmap-async`) without every caller hand-rolling the lock.

use crate::{Diagnostics, Engine, Health, Key, Metrics, Options};
use parking_lot::Mutex;

pub struct SyncEngine<V>(Mutex<Engine<V>>);

impl<V: Clone> SyncEngine<V> {
    pub fn new(options: Options) -> Self {
        SyncEngine(Mutex::new(Engine::new(options)))
    }

    pub fn from_engine(engine: Engine<V>) -> Self {
        SyncEngine(Mutex::new(engine))
    }

    pub fn put(&self, key: Key, value: V) {
        self.0.lock().put(key, value);
    }

    pub fn get(&self, key: Key) -> Option<V> {
        self.0.lock().get(key)
    }

    pub fn has(&self, key: &Key) -> bool {
        self.0.lock().has(key)
    }

    pub fn remove(&self, key: Key) -> bool {
        self.0.lock().remove(key)
    }

    pub fn clear(&self) -> bool {
        self.0.lock().clear()
    }

    pub fn size(&self) -> usize {
        self.0.lock().size()
    }

    pub fn metrics(&self) -> Metrics {
        self.0.lock().metrics()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.0.lock().diagnostics()
    }

    pub fn health(&self) -> Health {
        self.0.lock().health()
    }

    pub fn export(&self) -> Vec<(Key, V)> {
        self.0.lock().export()
    }

    /// Runs `f` against the locked engine, for callers needing an operation
    /// this thin wrapper doesn't expose directly (e.g. `map_values`,
    /// `register_plugin`, `iter`).
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut Engine<V>) -> R) -> R {
        f(&mut self.0.lock())
    }
}
