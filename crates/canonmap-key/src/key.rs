use crate::number::{BigIntValue, OrderedFloat};
use crate::opaque::OpaqueId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `Key` is the generic form of a logical key as understood by canonmap.
/// It's the tagged-sum realization of spec.md's dynamically-typed key union.
///
/// `Serialize`/`Deserialize` round-trip the *structure*, not the canonical
/// fingerprint form of §4.1 — this is for callers who want to log or
/// rehydrate an `Engine::export()` snapshot as JSON (SPEC_FULL.md §2), not a
/// stable wire format (spec.md §6 is explicit that the fingerprint itself
/// must never be treated as one).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    Null,
    /// Distinct from `Null`: the JS-style "absent" primitive.
    Undefined,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat),
    Str(String),
    BigInt(BigIntValue),
    /// A symbol with a globally-registered textual key.
    InternedSym(String),
    /// A symbol with no registered key; collapses under `OpaqueId`'s `Eq`.
    OpaqueSym(OpaqueId),
    /// Milliseconds since the Unix epoch.
    Date(i64),
    Regex {
        source: String,
        flags: String,
    },
    Err {
        kind: String,
        message: String,
    },
    Func {
        name: Option<String>,
        arity: usize,
    },
    List(Vec<Key>),
    Record(BTreeMap<String, Key>),
    /// A stand-in for a container that referenced one of its own ancestors.
    /// Built by `Key::from_graph` when the source graph contains a genuine
    /// reference cycle; ordinary callers constructing a `Key` tree by value
    /// never produce this variant themselves.
    Circular(u64),
}

impl Key {
    pub fn record<I: IntoIterator<Item = (String, Key)>>(fields: I) -> Key {
        Key::Record(fields.into_iter().collect())
    }

    pub fn list<I: IntoIterator<Item = Key>>(items: I) -> Key {
        Key::List(items.into_iter().collect())
    }

    pub fn opaque_symbol() -> Key {
        Key::OpaqueSym(OpaqueId::new())
    }

    pub fn str(s: impl Into<String>) -> Key {
        Key::Str(s.into())
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Key::List(_) | Key::Record(_))
    }
}

impl From<bool> for Key {
    fn from(v: bool) -> Self {
        Key::Bool(v)
    }
}
impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Int(v)
    }
}
impl From<f64> for Key {
    fn from(v: f64) -> Self {
        Key::Float(OrderedFloat(v))
    }
}
impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Str(v.to_string())
    }
}
impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Str(v)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn record_field_order_is_canonical_regardless_of_insertion() {
        let a = Key::record([
            ("id".to_string(), Key::Int(1)),
            ("name".to_string(), Key::str("A")),
        ]);
        let b = Key::record([
            ("name".to_string(), Key::str("A")),
            ("id".to_string(), Key::Int(1)),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn opaque_symbols_are_eq_but_carry_distinct_raw_ids() {
        let a = Key::opaque_symbol();
        let b = Key::opaque_symbol();
        assert_eq!(a, b);
        match (a, b) {
            (Key::OpaqueSym(ia), Key::OpaqueSym(ib)) => assert_ne!(ia.raw(), ib.raw()),
            _ => panic!("expected opaque symbols"),
        }
    }

    #[test]
    fn json_round_trip_preserves_structure() {
        let k = Key::record([
            ("id".to_string(), Key::Int(1)),
            ("tags".to_string(), Key::list([Key::str("a"), Key::str("b")])),
            ("when".to_string(), Key::Date(1705314600000)),
        ]);
        let json = serde_json::to_string(&k).expect("key should serialize");
        let back: Key = serde_json::from_str(&json).expect("key should deserialize");
        assert_eq!(k, back);
    }

    #[test]
    fn json_round_trip_mints_a_fresh_but_equal_opaque_symbol() {
        let k = Key::opaque_symbol();
        let json = serde_json::to_string(&k).unwrap();
        let back: Key = serde_json::from_str(&json).unwrap();
        assert_eq!(k, back); // equal by collapse, not by raw id
        match (k, back) {
            (Key::OpaqueSym(a), Key::OpaqueSym(b)) => assert_ne!(a.raw(), b.raw()),
            _ => panic!("expected opaque symbols"),
        }
    }
}
