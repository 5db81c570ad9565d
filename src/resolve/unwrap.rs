//! Property unwrapping: peel one path element off the parent's result.
//!
//! Each step consumes the previous step's named value and produces a new
//! one, so arbitrarily deep custom-property/array chains are repeated
//! application of these three functions.

use crate::model::Value;
use crate::resolve::ResultValue;

/// Declared property of an entity: `Things(1)/name`.
///
/// A missing property is a null value, not an unresolved path. Anything
/// that is not an entity (a failed parent resolution in particular) passes
/// through unchanged.
pub(crate) fn property(result: ResultValue, name: &str) -> ResultValue {
    match result {
        ResultValue::Entity(mut entity) => {
            let value = entity.properties.remove(name).unwrap_or(Value::Null);
            ResultValue::Named { name: name.to_string(), value }
        }
        other => other,
    }
}

/// Key lookup inside a nested custom-property object:
/// `Things(1)/properties/a`.
pub(crate) fn custom(result: ResultValue, name: &str) -> ResultValue {
    if let ResultValue::Named { value: Value::Map(mut map), .. } = result {
        if let Some(value) = map.remove(name) {
            return ResultValue::Named { name: name.to_string(), value };
        }
    }
    ResultValue::Absent
}

/// Index into a custom-property array: `Things(1)/properties/a[1]`.
pub(crate) fn array(result: ResultValue, index: usize) -> ResultValue {
    if let ResultValue::Named { name, value: Value::List(items) } = result {
        if let Some(value) = items.into_iter().nth(index) {
            return ResultValue::Named { name: format!("{name}[{index}]"), value };
        }
    }
    ResultValue::Absent
}
