/// Construction-time configuration for an [`crate::Engine`]. Every field has
/// a default matching spec.md §6; the core never reads the environment, so
/// all configuration flows through this struct.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub enable_cache: bool,
    pub cache_max_size: usize,
    pub enable_adaptive_serialization: bool,
    pub enable_tiered_cache: bool,
    pub l1_cache_size: usize,
    pub l2_cache_size: usize,
    pub promote_threshold: u32,
    pub enable_auto_cleanup: bool,
    pub cleanup_interval_ms: u64,
    pub enable_error_recovery: bool,
    pub max_retries: u32,
    pub fallback_mode: bool,
    pub enable_plugins: bool,
    pub plugin_timeout_ms: u64,
    pub enable_diagnostics: bool,
    pub track_performance: bool,
    pub enable_async: bool,
    pub batch_size: usize,
    pub max_concurrency: usize,
    /// Gates the §4.1 opaque-symbol variant: when true, each opaque symbol
    /// fingerprints distinctly instead of collapsing to `Symbol()`.
    pub distinct_opaque_symbols: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            enable_cache: true,
            cache_max_size: 10_000,
            enable_adaptive_serialization: true,
            enable_tiered_cache: true,
            l1_cache_size: 1_000,
            l2_cache_size: 5_000,
            promote_threshold: 3,
            enable_auto_cleanup: true,
            cleanup_interval_ms: 300_000,
            enable_error_recovery: true,
            max_retries: 3,
            fallback_mode: true,
            enable_plugins: true,
            plugin_timeout_ms: 5_000,
            enable_diagnostics: true,
            track_performance: true,
            enable_async: true,
            batch_size: 100,
            max_concurrency: 10,
            distinct_opaque_symbols: false,
        }
    }
}

impl Options {
    /// Rejects configurations the engine cannot honor. `create()` falls
    /// back to [`crate::Engine::minimal`] rather than construct an engine
    /// with these — there is no runtime path that would recover from a
    /// zero-capacity cache tier or a zero-sized async batch later on, so
    /// it's caught here instead of surfacing as a confusing panic deep in
    /// `TieredCache`/`canonmap-async`.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.enable_tiered_cache && (self.l1_cache_size == 0 || self.l2_cache_size == 0) {
            return Err("tiered cache enabled with a zero-capacity level");
        }
        if self.enable_tiered_cache && self.promote_threshold == 0 {
            return Err("promote_threshold must be at least 1");
        }
        if !self.enable_tiered_cache && self.cache_max_size == 0 && self.enable_cache {
            return Err("cache_max_size must be nonzero when caching is enabled");
        }
        if self.enable_async && (self.batch_size == 0 || self.max_concurrency == 0) {
            return Err("async façade enabled with a zero batch_size or max_concurrency");
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Options::default().validate().is_ok());
    }

    #[test]
    fn zero_capacity_tier_is_rejected() {
        let mut opts = Options::default();
        opts.l1_cache_size = 0;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut opts = Options::default();
        opts.batch_size = 0;
        assert!(opts.validate().is_err());
    }
}
