/// The one case that propagates out of the public API as a `Result::Err` —
/// spec.md §7's ABORT, reserved for the recovery controller's own failure
/// modes. Every other engine operation returns a plain value.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("plugin '{0}' lifecycle hook failed or timed out: {1}")]
    PluginLifecycle(String, #[source] canonmap_plugin::PluginError),
}
