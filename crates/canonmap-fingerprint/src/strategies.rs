use crate::error::StrategyError;
use crate::serializer::Serializer;
use canonmap_key::{classify, Category, Key};

/// A `(priority, applies, emit)` rule, as described in spec.md §4.1. The
/// dispatcher iterates the table in descending priority order and uses the
/// first strategy whose `applies` returns true.
pub(crate) trait Strategy {
    fn priority(&self) -> i32;
    fn applies(&self, key: &Key) -> bool;
    fn emit(&self, ser: &mut Serializer, key: &Key, depth: usize) -> Result<String, StrategyError>;
}

pub(crate) struct PrimitiveStrategy;
impl Strategy for PrimitiveStrategy {
    fn priority(&self) -> i32 {
        100
    }
    fn applies(&self, key: &Key) -> bool {
        classify(key) == Category::Primitive
    }
    fn emit(&self, ser: &mut Serializer, key: &Key, _depth: usize) -> Result<String, StrategyError> {
        Ok(match key {
            Key::Null => "null".to_string(),
            Key::Undefined => "undefined".to_string(),
            Key::Bool(b) => b.to_string(),
            Key::Int(n) => n.to_string(),
            Key::Float(f) => f.to_string(),
            Key::Str(s) => format!("{s:?}"),
            Key::BigInt(n) => format!("{n}n"),
            Key::InternedSym(name) => format!("Symbol.for({name:?})"),
            Key::OpaqueSym(id) => ser.opaque_symbol_canonical_form(*id),
            _ => return Err(StrategyError::NotApplicable),
        })
    }
}

pub(crate) struct SmallRecordStrategy;
impl Strategy for SmallRecordStrategy {
    fn priority(&self) -> i32 {
        95
    }
    fn applies(&self, key: &Key) -> bool {
        classify(key) == Category::SimpleRecord
    }
    fn emit(&self, ser: &mut Serializer, key: &Key, depth: usize) -> Result<String, StrategyError> {
        emit_record(ser, key, depth)
    }
}

pub(crate) struct SmallListStrategy;
impl Strategy for SmallListStrategy {
    fn priority(&self) -> i32 {
        90
    }
    fn applies(&self, key: &Key) -> bool {
        classify(key) == Category::SimpleList
    }
    fn emit(&self, ser: &mut Serializer, key: &Key, depth: usize) -> Result<String, StrategyError> {
        emit_list(ser, key, depth)
    }
}

pub(crate) struct DateStrategy;
impl Strategy for DateStrategy {
    fn priority(&self) -> i32 {
        85
    }
    fn applies(&self, key: &Key) -> bool {
        matches!(key, Key::Date(_))
    }
    fn emit(&self, _ser: &mut Serializer, key: &Key, _depth: usize) -> Result<String, StrategyError> {
        match key {
            Key::Date(millis) => Ok(format!("[Date:{millis}]")),
            _ => Err(StrategyError::NotApplicable),
        }
    }
}

pub(crate) struct RegexStrategy;
impl Strategy for RegexStrategy {
    fn priority(&self) -> i32 {
        85
    }
    fn applies(&self, key: &Key) -> bool {
        matches!(key, Key::Regex { .. })
    }
    fn emit(&self, _ser: &mut Serializer, key: &Key, _depth: usize) -> Result<String, StrategyError> {
        match key {
            Key::Regex { source, flags } => {
                // A regex value with an unparseable source can still occur
                // (e.g. a key built from a foreign engine's syntax); rather
                // than panic on it, fall through to the hash fallback.
                regex::Regex::new(source).map_err(|_| StrategyError::InvalidRegex)?;
                Ok(format!("[RegExp:{source}{flags}]"))
            }
            _ => Err(StrategyError::NotApplicable),
        }
    }
}

pub(crate) struct ErrorStrategy;
impl Strategy for ErrorStrategy {
    fn priority(&self) -> i32 {
        85
    }
    fn applies(&self, key: &Key) -> bool {
        matches!(key, Key::Err { .. })
    }
    fn emit(&self, _ser: &mut Serializer, key: &Key, _depth: usize) -> Result<String, StrategyError> {
        match key {
            Key::Err { kind, message } => Ok(format!("[Error:{kind}:{message}]")),
            _ => Err(StrategyError::NotApplicable),
        }
    }
}

pub(crate) struct FunctionStrategy;
impl Strategy for FunctionStrategy {
    fn priority(&self) -> i32 {
        80
    }
    fn applies(&self, key: &Key) -> bool {
        matches!(key, Key::Func { .. })
    }
    fn emit(&self, _ser: &mut Serializer, key: &Key, _depth: usize) -> Result<String, StrategyError> {
        match key {
            Key::Func { name, arity } => {
                let name = name.as_deref().unwrap_or("anonymous");
                Ok(format!("[Function:{name}:{arity}]"))
            }
            _ => Err(StrategyError::NotApplicable),
        }
    }
}

pub(crate) struct ComplexStrategy;
impl Strategy for ComplexStrategy {
    fn priority(&self) -> i32 {
        75
    }
    fn applies(&self, key: &Key) -> bool {
        matches!(key, Key::Record(_) | Key::List(_))
    }
    fn emit(&self, ser: &mut Serializer, key: &Key, depth: usize) -> Result<String, StrategyError> {
        match key {
            Key::Record(_) => emit_record(ser, key, depth),
            Key::List(_) => emit_list(ser, key, depth),
            _ => Err(StrategyError::NotApplicable),
        }
    }
}

/// The wide safety net: every `Key` is representable this way, so this
/// strategy never itself fails. It exists as the absolute fallback the
/// dispatcher reaches only once every higher-priority strategy has.
pub(crate) struct FastHashFallbackStrategy;
impl Strategy for FastHashFallbackStrategy {
    fn priority(&self) -> i32 {
        10
    }
    fn applies(&self, _key: &Key) -> bool {
        true
    }
    fn emit(&self, _ser: &mut Serializer, key: &Key, _depth: usize) -> Result<String, StrategyError> {
        use std::hash::{Hash, Hasher};
        let mut hasher = fxhash::FxHasher::default();
        std::mem::discriminant(key).hash(&mut hasher);
        let type_tag = type_tag(key);
        let prefix = format!("{key:?}");
        let prefix: String = prefix.chars().take(32).collect();
        Ok(format!("[{type_tag}#{:x}:{prefix}]", hasher.finish()))
    }
}

fn type_tag(key: &Key) -> &'static str {
    match key {
        Key::Null => "null",
        Key::Undefined => "undefined",
        Key::Bool(_) => "bool",
        Key::Int(_) => "int",
        Key::Float(_) => "float",
        Key::Str(_) => "string",
        Key::BigInt(_) => "bigint",
        Key::InternedSym(_) | Key::OpaqueSym(_) => "symbol",
        Key::Date(_) => "date",
        Key::Regex { .. } => "regexp",
        Key::Err { .. } => "error",
        Key::Func { .. } => "function",
        Key::List(_) => "array",
        Key::Record(_) => "object",
        Key::Circular(_) => "circular",
    }
}

fn emit_record(ser: &mut Serializer, key: &Key, depth: usize) -> Result<String, StrategyError> {
    let Key::Record(fields) = key else {
        return Err(StrategyError::NotApplicable);
    };
    // `BTreeMap` iterates in lexicographic key order already, satisfying
    // spec.md P3 (key-order irrelevance) without an explicit sort step.
    let mut parts = Vec::with_capacity(fields.len());
    for (field, value) in fields {
        let value_fp = ser.dispatch(value, depth + 1);
        parts.push(format!("{field:?}:{value_fp}"));
    }
    Ok(format!("{{{}}}", parts.join(",")))
}

fn emit_list(ser: &mut Serializer, key: &Key, depth: usize) -> Result<String, StrategyError> {
    let Key::List(items) = key else {
        return Err(StrategyError::NotApplicable);
    };
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        parts.push(ser.dispatch(item, depth + 1));
    }
    Ok(format!("[{}]", parts.join(",")))
}

/// Builds the strategy table in descending priority order, as spec.md §4.1
/// describes. Ties are broken by declaration order (a stable arrangement;
/// no two built-in strategies currently share a priority and a domain, with
/// the deliberate exception of Date/RegExp/Error at 85, which never overlap
/// in `applies`).
pub(crate) fn table() -> Vec<Box<dyn Strategy>> {
    let mut strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(PrimitiveStrategy),
        Box::new(SmallRecordStrategy),
        Box::new(SmallListStrategy),
        Box::new(DateStrategy),
        Box::new(RegexStrategy),
        Box::new(ErrorStrategy),
        Box::new(FunctionStrategy),
        Box::new(ComplexStrategy),
        Box::new(FastHashFallbackStrategy),
    ];
    strategies.sort_by(|a, b| b.priority().cmp(&a.priority()));
    strategies
}
