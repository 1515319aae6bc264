//! `canonmap`: a content-addressed associative container. Maps arbitrarily
//! shaped [`canonmap_key::Key`] values to a user value `V`, with equality
//! defined by the deep canonical fingerprint [`canonmap_fingerprint`]
//! derives from the key rather than by identity or shallow equality.
//!
//! The engine façade ([`Engine`]) binds the fingerprint cache, the
//! adaptive serializer, the error-recovery controller, the plugin
//! pipeline, and the primary store into the public operations described
//! in SPEC_FULL.md §4.5.

mod engine;
mod error;
pub mod logging;
mod metrics;
mod options;
mod store;
pub mod sync;

pub use canonmap_key::Key;
pub use canonmap_plugin::{Plugin, PluginError};
pub use engine::Engine;
pub use error::EngineError;
pub use metrics::{Diagnostics, Health, Metrics};
pub use options::Options;

/// Constructs a new [`Engine`], optionally pre-populated with
/// `initial_entries`, per SPEC_FULL.md §6's `create(initial_entries?, options?)`.
/// If `options` describes a configuration the engine cannot honor (see
/// [`Options::validate`]), the factory returns the degraded fallback engine
/// instead of panicking or propagating a construction error — `health()`
/// on the returned engine reports `fallback_mode: true`.
pub fn create<V: Clone>(initial_entries: Vec<(Key, V)>, options: Options) -> Engine<V> {
    Engine::create(initial_entries, options)
}
