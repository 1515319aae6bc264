use crate::key::Key;

/// The shape category a `Key` falls into, as decided by the pure, stateless
/// Type Classifier. `canonmap-fingerprint`'s strategy table dispatches on
/// this (plus the size guards it re-checks itself) rather than re-deriving
/// the classification from scratch at every priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Primitive,
    SimpleRecord,
    SimpleList,
    Date,
    Regex,
    Error,
    Function,
    Complex,
}

const SIMPLE_RECORD_MAX_FIELDS: usize = 5;
const SIMPLE_LIST_MAX_LEN: usize = 10;

/// Classifies a single `Key`, looking only one level deep into containers
/// (the strategy table re-classifies children itself while it recurses).
pub fn classify(key: &Key) -> Category {
    match key {
        Key::Null
        | Key::Undefined
        | Key::Bool(_)
        | Key::Int(_)
        | Key::Float(_)
        | Key::Str(_)
        | Key::BigInt(_)
        | Key::InternedSym(_)
        | Key::OpaqueSym(_) => Category::Primitive,
        Key::Date(_) => Category::Date,
        Key::Regex { .. } => Category::Regex,
        Key::Err { .. } => Category::Error,
        Key::Func { .. } => Category::Function,
        Key::Record(fields) => {
            if fields.len() <= SIMPLE_RECORD_MAX_FIELDS
                && fields
                    .values()
                    .all(|v| matches!(classify(v), Category::Primitive | Category::SimpleRecord))
            {
                Category::SimpleRecord
            } else {
                Category::Complex
            }
        }
        Key::List(items) => {
            if items.len() <= SIMPLE_LIST_MAX_LEN
                && items.iter().all(|v| classify(v) == Category::Primitive)
            {
                Category::SimpleList
            } else {
                Category::Complex
            }
        }
        // `Circular` is handled directly by the serializer before dispatch
        // ever reaches the strategy table; if it somehow leaks through,
        // treat it as the general complex case so no strategy panics on it.
        Key::Circular(_) => Category::Complex,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::key::Key;

    #[test]
    fn primitives_classify_as_primitive() {
        assert_eq!(classify(&Key::Null), Category::Primitive);
        assert_eq!(classify(&Key::Int(1)), Category::Primitive);
        assert_eq!(classify(&Key::str("x")), Category::Primitive);
    }

    #[test]
    fn small_record_of_primitives_is_simple() {
        let k = Key::record([("a".into(), Key::Int(1)), ("b".into(), Key::str("x"))]);
        assert_eq!(classify(&k), Category::SimpleRecord);
    }

    #[test]
    fn oversized_record_is_complex() {
        let k = Key::record((0..6).map(|i| (format!("f{i}"), Key::Int(i))));
        assert_eq!(classify(&k), Category::Complex);
    }

    #[test]
    fn record_with_nested_list_field_is_complex() {
        let k = Key::record([("items".into(), Key::list((0..20).map(Key::Int)))]);
        assert_eq!(classify(&k), Category::Complex);
    }

    #[test]
    fn small_primitive_list_is_simple() {
        let k = Key::list((0..5).map(Key::Int));
        assert_eq!(classify(&k), Category::SimpleList);
    }

    #[test]
    fn oversized_list_is_complex() {
        let k = Key::list((0..11).map(Key::Int));
        assert_eq!(classify(&k), Category::Complex);
    }

    #[test]
    fn list_of_records_is_complex() {
        let k = Key::list([Key::record([("a".into(), Key::Int(1))])]);
        assert_eq!(classify(&k), Category::Complex);
    }
}
