/// A fault raised by a single hook invocation. Isolated to the plugin that
/// raised it — it never itself aborts the core operation underway (spec.md
/// "Isolation").
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("plugin hook failed: {0}")]
    HookFailed(String),
    #[error("lifecycle hook exceeded its timeout")]
    LifecycleTimeout,
}
