//! PropertyMap — the key-value store on every entity.

use std::collections::HashMap;
use super::Value;

/// A map of property names to values.
pub type PropertyMap = HashMap<String, Value>;

/// Rough wire-size estimate of a property bag, in bytes. Keys count with a
/// small per-entry overhead for quoting and separators.
pub fn estimated_size(properties: &PropertyMap) -> usize {
    properties
        .iter()
        .map(|(k, v)| k.len() + 3 + v.estimated_size())
        .sum()
}

/// Convert iterator of (key, value) pairs into a PropertyMap.
impl<K, V> From<Vec<(K, V)>> for Value
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: Vec<(K, V)>) -> Self {
        Value::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
