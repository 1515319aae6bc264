use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;

/// A floating-point value with a total order, so that `Key` (and therefore
/// records keyed by field name) can be placed in a `BTreeMap` and compared
/// deterministically. NaN sorts after every other float and is equal only to
/// itself, mirroring the JSON document model's numeric ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedFloat(pub f64);

impl Display for OrderedFloat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or_else(|| {
            if self.0.is_nan() && other.0.is_nan() {
                Ordering::Equal
            } else if self.0.is_nan() {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        })
    }
}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // NaN and +/-0.0 each need a single canonical bit pattern so that
        // `Eq`-equal floats also hash equal.
        let bits = if self.0.is_nan() {
            f64::NAN.to_bits()
        } else if self.0 == 0.0 {
            0u64
        } else {
            self.0.to_bits()
        };
        bits.hash(state);
    }
}

/// An arbitrary-precision integer, retained as its canonical decimal digit
/// string. `canonmap` never performs arithmetic on keys, so a parsed
/// big-integer representation (`num-bigint`) would buy nothing beyond what a
/// normalized string already gives us for equality and fingerprinting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BigIntValue(String);

impl BigIntValue {
    /// Builds a value from a signed decimal digit string (e.g. `"-41"`),
    /// normalizing away redundant leading zeros and a bare `-0`.
    pub fn from_decimal(raw: &str) -> Self {
        let (sign, digits) = match raw.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", raw),
        };
        let trimmed = digits.trim_start_matches('0');
        let trimmed = if trimmed.is_empty() { "0" } else { trimmed };
        let value = if trimmed == "0" {
            "0".to_string()
        } else {
            format!("{sign}{trimmed}")
        };
        BigIntValue(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BigIntValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ordered_float_total_order() {
        let mut v = vec![
            OrderedFloat(1.0),
            OrderedFloat(f64::NAN),
            OrderedFloat(-1.0),
            OrderedFloat(0.0),
        ];
        v.sort();
        assert_eq!(v[0], OrderedFloat(-1.0));
        assert!(v[3].0.is_nan());
    }

    #[test]
    fn ordered_float_hash_matches_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(OrderedFloat(0.0));
        assert!(set.contains(&OrderedFloat(-0.0)));
        set.insert(OrderedFloat(f64::NAN));
        assert!(set.contains(&OrderedFloat(f64::NAN)));
    }

    #[test]
    fn big_int_normalizes() {
        assert_eq!(BigIntValue::from_decimal("007").as_str(), "7");
        assert_eq!(BigIntValue::from_decimal("-0").as_str(), "0");
        assert_eq!(BigIntValue::from_decimal("-0042").as_str(), "-42");
    }
}
