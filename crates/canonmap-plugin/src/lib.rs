//! Plugin pipeline: an ordered set of hook-implementing plugins wrapped
//! around every core operation (spec.md §4.4), with per-hook fault
//! isolation and a four-state lifecycle.

mod error;
mod lifecycle;
mod pipeline;

pub use error::PluginError;
pub use lifecycle::PluginState;
pub use pipeline::{MetricsSnapshot, Pipeline, Plugin};
