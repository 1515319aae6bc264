use canonmap_cache::CacheReport;
use canonmap_recovery::RecoveryReport;

/// Operation counters, maintained only when `Options::track_performance` is
/// set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Metrics {
    pub puts: u64,
    pub gets: u64,
    pub removes: u64,
    pub clears: u64,
    pub hits: u64,
    pub misses: u64,
}

/// A structured snapshot combining cache stats, recovery-controller
/// counters, and plugin fault counts — spec.md §2's "diagnostic/metrics
/// reporters" made concrete for the engine's own introspection surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct Diagnostics {
    pub metrics: Metrics,
    pub cache: Option<CacheReport>,
    pub recovery: RecoveryReport,
    pub size: usize,
    pub orphaned_entries: usize,
}

/// `health()`'s minimal, mutation-free view — spec.md §6/§7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub healthy: bool,
    pub fallback_mode: bool,
    pub size: usize,
}
