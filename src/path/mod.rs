//! Resource path model — an ordered sequence of typed path elements.
//!
//! Paths are produced by an external parser and are read-only to the
//! engine. The engine only ever dispatches on the terminal element and
//! walks back to parents; it never rewrites a caller's path.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::EntityId;
use crate::{Error, Result};

// ============================================================================
// Navigation properties
// ============================================================================

/// One navigation relationship, as declared by the (external) type catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationProperty {
    /// Slot name on the source entity.
    pub name: String,
    /// Entity type of the navigation target.
    pub target_type: String,
    /// Declared multiplicity: true for to-many, false for to-one.
    pub is_collection: bool,
}

impl NavigationProperty {
    /// A to-one navigation.
    pub fn single(name: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self { name: name.into(), target_type: target_type.into(), is_collection: false }
    }

    /// A to-many navigation.
    pub fn collection(name: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self { name: name.into(), target_type: target_type.into(), is_collection: true }
    }
}

// ============================================================================
// Path elements
// ============================================================================

/// One node of a resource path. The parent of an element is the element
/// before it in the owning [`ResourcePath`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathElement {
    /// A whole entity collection, e.g. `Things`.
    Collection { entity_type: String },
    /// A single entity. `id` is `None` for a to-one navigation target whose
    /// identity is determined by the parent, e.g. `Datastreams(7)/Thing`.
    Entity { entity_type: String, id: Option<EntityId> },
    /// A declared scalar/object property of the parent entity.
    Property { name: String },
    /// A key inside a nested custom-property object.
    CustomProperty { name: String },
    /// An index into a custom-property array.
    ArrayIndex { index: usize },
}

// ============================================================================
// ResourcePath
// ============================================================================

/// An ordered, non-empty sequence of path elements, root to leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePath {
    elements: Vec<PathElement>,
}

impl ResourcePath {
    /// Build a path from elements. Rejects an empty sequence.
    pub fn new(elements: Vec<PathElement>) -> Result<Self> {
        if elements.is_empty() {
            return Err(Error::InvariantViolation("resource path must not be empty".into()));
        }
        Ok(Self { elements })
    }

    /// Path addressing a whole collection, e.g. `Things`.
    pub fn collection(entity_type: impl Into<String>) -> Self {
        Self { elements: vec![PathElement::Collection { entity_type: entity_type.into() }] }
    }

    /// Path addressing one entity by id, e.g. `Things(1)`.
    pub fn entity(entity_type: impl Into<String>, id: EntityId) -> Self {
        let entity_type = entity_type.into();
        Self {
            elements: vec![
                PathElement::Collection { entity_type: entity_type.clone() },
                PathElement::Entity { entity_type, id: Some(id) },
            ],
        }
    }

    /// Extend the path by one element.
    pub fn with_element(mut self, element: PathElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// The terminal element the dispatcher routes on.
    pub fn last(&self) -> &PathElement {
        // Non-empty by construction.
        &self.elements[self.elements.len() - 1]
    }

    /// The path minus its terminal element, or `None` at the root.
    pub fn parent(&self) -> Option<ResourcePath> {
        if self.elements.len() < 2 {
            return None;
        }
        Some(Self { elements: self.elements[..self.elements.len() - 1].to_vec() })
    }
}

impl fmt::Display for ResourcePath {
    /// Renders `Things(1)/Datastreams` / `Things(1)/properties/a[1]` style.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.elements.iter().enumerate() {
            match element {
                PathElement::Collection { entity_type } => {
                    if i > 0 { write!(f, "/")?; }
                    write!(f, "{entity_type}")?;
                }
                PathElement::Entity { entity_type, id } => {
                    let follows_collection =
                        matches!(self.elements.get(i.wrapping_sub(1)), Some(PathElement::Collection { .. }));
                    if !follows_collection {
                        if i > 0 { write!(f, "/")?; }
                        write!(f, "{entity_type}")?;
                    }
                    if let Some(id) = id {
                        write!(f, "({id})")?;
                    }
                }
                PathElement::Property { name } | PathElement::CustomProperty { name } => {
                    write!(f, "/{name}")?;
                }
                PathElement::ArrayIndex { index } => {
                    write!(f, "[{index}]")?;
                }
            }
        }
        Ok(())
    }
}
