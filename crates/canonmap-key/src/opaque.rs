use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OPAQUE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an opaque (unregistered) symbol key.
///
/// Every `OpaqueId` is assigned a fresh, process-unique number at
/// construction time, but `Eq`/`Ord`/`Hash` deliberately ignore it: per
/// spec, opaque symbols have no externally comparable identity and the
/// default behavior collapses all of them into one equivalence class. The
/// raw number is retained only so that the `distinct_opaque_symbols` escape
/// hatch in the adaptive serializer (see `canonmap-fingerprint`) has
/// something to key its non-default canonical form on.
#[derive(Debug, Clone, Copy)]
pub struct OpaqueId(u64);

impl OpaqueId {
    pub fn new() -> Self {
        OpaqueId(NEXT_OPAQUE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for OpaqueId {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for OpaqueId {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}
impl Eq for OpaqueId {}

impl PartialOrd for OpaqueId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for OpaqueId {
    fn cmp(&self, _other: &Self) -> std::cmp::Ordering {
        std::cmp::Ordering::Equal
    }
}

impl std::hash::Hash for OpaqueId {
    fn hash<H: std::hash::Hasher>(&self, _state: &mut H) {
        // Intentionally constant: all opaque ids must hash identically so
        // that `Key::OpaqueSym` values collapse in hash-based containers too.
    }
}

/// Serializes as a bare unit, never the raw id: the raw number is an
/// implementation artifact the default-collapse semantics say callers
/// should never observe or round-trip through. Deserializing always mints
/// a fresh process-local id, consistent with "no externally comparable
/// identity."
impl Serialize for OpaqueId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_unit_struct("OpaqueId")
    }
}

impl<'de> Deserialize<'de> for OpaqueId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_unit_struct("OpaqueId", OpaqueIdVisitor)?;
        Ok(OpaqueId::new())
    }
}

struct OpaqueIdVisitor;
impl<'de> serde::de::Visitor<'de> for OpaqueIdVisitor {
    type Value = ();
    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("an opaque symbol placeholder")
    }
    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(())
    }
}
