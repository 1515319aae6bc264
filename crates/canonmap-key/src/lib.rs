//! Logical-key data model and the Type Classifier leaf component of
//! canonmap. No state, no I/O: given a `Key`, `classify` deterministically
//! decides which category it falls into.

mod classify;
mod key;
mod number;
mod opaque;

pub use classify::{classify, Category};
pub use key::Key;
pub use number::{BigIntValue, OrderedFloat};
pub use opaque::OpaqueId;
