//! Error-Recovery Controller: wraps a fallible unit of work with a
//! per-(operation, error-kind) retry/escalation/fallback policy, and a
//! process-wide (per-controller-instance — see SPEC_FULL.md §5) fallback
//! latch that, once tripped, forces every subsequent `execute` onto the
//! fallback path.

use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Serialization,
    Cache,
    Iteration,
    Plugin,
    Memory,
    Unknown,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub escalation_threshold: u32,
    pub fallback_enabled: bool,
}

impl ErrorKind {
    pub fn default_policy(self) -> RetryPolicy {
        match self {
            ErrorKind::Serialization => RetryPolicy {
                max_retries: 2,
                retry_delay_ms: 0,
                escalation_threshold: 5,
                fallback_enabled: true,
            },
            ErrorKind::Cache => RetryPolicy {
                max_retries: 3,
                retry_delay_ms: 10,
                escalation_threshold: 10,
                fallback_enabled: true,
            },
            ErrorKind::Iteration => RetryPolicy {
                max_retries: 1,
                retry_delay_ms: 0,
                escalation_threshold: 3,
                fallback_enabled: true,
            },
            ErrorKind::Plugin => RetryPolicy {
                max_retries: 0,
                retry_delay_ms: 0,
                escalation_threshold: 1,
                fallback_enabled: false,
            },
            ErrorKind::Memory => RetryPolicy {
                max_retries: 0,
                retry_delay_ms: 0,
                escalation_threshold: 1,
                fallback_enabled: true,
            },
            ErrorKind::Unknown => RetryPolicy {
                max_retries: 1,
                retry_delay_ms: 100,
                escalation_threshold: 5,
                fallback_enabled: true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Retry,
    Fallback,
    Skip,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RecoveryReport {
    pub in_fallback: bool,
    pub distinct_faulting_ops: usize,
    pub total_errors: u64,
}

/// Per-instance error-recovery controller. Not `Clone`: the fallback latch
/// and error counters are meant to be owned by exactly one `Engine`.
pub struct RecoveryController {
    policies: HashMap<ErrorKind, RetryPolicy>,
    counters: HashMap<(String, ErrorKind), u32>,
    fallback_latch: bool,
}

impl Default for RecoveryController {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoveryController {
    pub fn new() -> Self {
        RecoveryController {
            policies: HashMap::new(),
            counters: HashMap::new(),
            fallback_latch: false,
        }
    }

    pub fn with_policy(mut self, kind: ErrorKind, policy: RetryPolicy) -> Self {
        self.policies.insert(kind, policy);
        self
    }

    fn policy_for(&self, kind: ErrorKind) -> RetryPolicy {
        self.policies.get(&kind).copied().unwrap_or(kind.default_policy())
    }

    pub fn in_fallback(&self) -> bool {
        self.fallback_latch
    }

    /// Clears the fallback latch and zeroes all error history, per spec.
    pub fn leave_fallback(&mut self) {
        self.fallback_latch = false;
        self.counters.clear();
    }

    pub fn report(&self) -> RecoveryReport {
        RecoveryReport {
            in_fallback: self.fallback_latch,
            distinct_faulting_ops: self.counters.len(),
            total_errors: self.counters.values().map(|c| *c as u64).sum(),
        }
    }

    /// Runs `primary`; on error, consults the policy for `kind` to decide
    /// whether to retry (looping back into `primary`), fall back to
    /// `fallback`, or propagate. If the latch is already tripped, `primary`
    /// is never attempted.
    pub fn execute<T, E>(
        &mut self,
        op_name: &str,
        kind: ErrorKind,
        mut primary: impl FnMut() -> Result<T, E>,
        fallback: impl FnOnce() -> T,
    ) -> Result<T, E> {
        if self.fallback_latch {
            return Ok(fallback());
        }

        loop {
            match primary() {
                Ok(value) => return Ok(value),
                Err(err) => match self.record_error(op_name, kind) {
                    Decision::Retry => continue,
                    Decision::Fallback => return Ok(fallback()),
                    Decision::Skip => return Err(err),
                },
            }
        }
    }

    /// Records a fault against `(op_name, kind)` without an accompanying
    /// retry/fallback closure pair — for callers that already have a usable
    /// result (e.g. a sentinel fingerprint) and only need the occurrence
    /// counted toward that kind's escalation policy.
    pub fn note_fault(&mut self, op_name: &str, kind: ErrorKind) {
        self.record_error(op_name, kind);
    }

    fn record_error(&mut self, op_name: &str, kind: ErrorKind) -> Decision {
        let policy = self.policy_for(kind);
        let counter = self
            .counters
            .entry((op_name.to_string(), kind))
            .or_insert(0);
        *counter += 1;
        let count = *counter;

        if count >= policy.escalation_threshold && policy.fallback_enabled {
            self.fallback_latch = true;
            tracing::warn!(
                op_name,
                ?kind,
                count,
                "recovery: escalation threshold crossed, entering fallback mode"
            );
            Decision::Fallback
        } else if count < policy.max_retries {
            if policy.retry_delay_ms > 0 {
                std::thread::sleep(Duration::from_millis(policy.retry_delay_ms));
            }
            Decision::Retry
        } else if policy.fallback_enabled {
            Decision::Fallback
        } else {
            Decision::Skip
        }
    }
}
