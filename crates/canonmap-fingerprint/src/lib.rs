//! The adaptive serializer: turns a [`canonmap_key::Key`] into a stable,
//! content-derived fingerprint string via a prioritized strategy table
//! (spec.md §4.1).

mod error;
mod serializer;
mod strategies;

pub use error::StrategyError;
pub use serializer::{Serializer, SerializerOptions};
