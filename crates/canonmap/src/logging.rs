//! An optional `tracing-subscriber` initializer for binaries and tests that
//! embed `canonmap` and want its `tracing::debug!`/`warn!` events (cache
//! evictions, fallback-latch transitions, plugin faults) on stderr. The
//! core itself never calls this — it only ever emits through the
//! ambient `tracing` dispatcher, matching the teacher's separation between
//! a library crate's instrumentation and a binary's subscriber setup.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a global `tracing` subscriber driven by the `RUST_LOG`
/// environment variable (`canonmap=debug`, `off`, ...), defaulting to
/// `info` when unset. Idempotent: subsequent calls are no-ops, so tests
/// across a crate can all call it unconditionally.
pub fn init_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .finish();
        // Only a best-effort install: a binary embedding canonmap alongside
        // its own subscriber may have already set the global default, and
        // that caller's choice should win.
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
