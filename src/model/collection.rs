//! EntityCollection — an ordered page of entities plus continuation state.

use serde::{Deserialize, Serialize};

use super::Entity;

/// One page of a collection result.
///
/// Mutated only while the collection assembler is building it; treated as
/// immutable once returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCollection {
    pub entities: Vec<Entity>,
    /// Total count of the underlying collection, when the request asked for
    /// it. Independent of how many entities this page holds.
    pub count: Option<i64>,
    /// Continuation token for the next page, when more rows exist.
    pub next_link: Option<String>,
}

impl EntityCollection {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities, count: None, next_link: None }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entity> {
        self.entities.iter_mut()
    }

    /// Rough wire-size estimate in bytes, used by the response payload budget.
    pub fn estimated_size(&self) -> usize {
        let links = self.next_link.as_ref().map_or(0, |l| l.len()) + 8;
        links + self.entities.iter().map(Entity::estimated_size).sum::<usize>()
    }
}

impl<'a> IntoIterator for &'a EntityCollection {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}
