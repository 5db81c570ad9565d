//! Entity — a keyed bag of properties plus navigation slots.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{EntityCollection, PropertyMap, Value};

/// Opaque entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub i64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A materialized entity.
///
/// Each entity exclusively owns the values in its navigation slots; the
/// result of one resolution is always a tree, never a shared graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// Type tag, matching the collection the entity belongs to.
    pub entity_type: String,
    pub properties: PropertyMap,
    /// Navigation slots, keyed by navigation-property name. A slot is only
    /// present once something has been materialized into it.
    pub navigation: HashMap<String, NavEntry>,
}

/// The value held by a navigation slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NavValue {
    Entity(Box<Entity>),
    Collection(EntityCollection),
}

/// A navigation slot entry.
///
/// `export` marks a value the producer considers final: the expansion
/// resolver recurses into it instead of fetching the target again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavEntry {
    pub value: NavValue,
    pub export: bool,
}

impl Entity {
    pub fn new(id: EntityId, entity_type: impl Into<String>) -> Self {
        Self {
            id,
            entity_type: entity_type.into(),
            properties: PropertyMap::new(),
            navigation: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Store a final (export) value into a navigation slot.
    pub fn set_navigation(&mut self, name: impl Into<String>, value: NavValue) {
        self.navigation.insert(name.into(), NavEntry { value, export: true });
    }

    pub fn navigation(&self, name: &str) -> Option<&NavEntry> {
        self.navigation.get(name)
    }

    /// Rough wire-size estimate in bytes, used by the response payload budget.
    pub fn estimated_size(&self) -> usize {
        let props = super::property_map::estimated_size(&self.properties);
        let nav: usize = self
            .navigation
            .iter()
            .map(|(k, e)| {
                k.len()
                    + 3
                    + match &e.value {
                        NavValue::Entity(e) => e.estimated_size(),
                        NavValue::Collection(c) => c.estimated_size(),
                    }
            })
            .sum();
        8 + self.entity_type.len() + props + nav
    }
}

impl NavValue {
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            NavValue::Entity(e) => Some(e),
            NavValue::Collection(_) => None,
        }
    }

    pub fn as_collection(&self) -> Option<&EntityCollection> {
        match self {
            NavValue::Collection(c) => Some(c),
            NavValue::Entity(_) => None,
        }
    }
}
