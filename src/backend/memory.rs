//! In-memory query backend.
//!
//! This is the reference implementation of [`QueryBackend`].
//! It keeps entity rows in hashbrown tables protected by RwLock and
//! interprets plans directly against them.
//!
//! ## Limitations
//!
//! - **No filter evaluation**: filter expressions ride into the plan and
//!   show up in its query text, but rows are never filtered by them.
//! - **Insertion-order links**: related rows come back in the order the
//!   links were created, not by any ordering term.
//! - **No joins**: a collection hop chained behind a to-one hop
//!   (`Datastreams(1)/Thing/Datastreams`) is rejected at plan time.
//! - **Single process only**: no persistence, no isolation.
//!
//! Use this backend for:
//! - Testing the dispatcher, expansion resolver and collection assembler
//! - Embedding the engine in applications that don't need a real store

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hashbrown::HashMap;
use parking_lot::RwLock;

use super::{Materializer, QueryBackend, RowCursor};
use crate::model::{Entity, EntityId, PropertyMap};
use crate::path::{PathElement, ResourcePath};
use crate::query::Query;
use crate::{Error, Result};

/// (source type, source id, target type) → target ids, in link order.
type LinkKey = (String, i64, String);

// ============================================================================
// MemoryBackend
// ============================================================================

/// In-memory entity store.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    /// entity type → id-ordered rows
    tables: RwLock<HashMap<String, BTreeMap<i64, PropertyMap>>>,
    links: RwLock<HashMap<LinkKey, Vec<i64>>>,
    next_id: AtomicI64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                tables: RwLock::new(HashMap::new()),
                links: RwLock::new(HashMap::new()),
                next_id: AtomicI64::new(1),
            }),
        }
    }

    /// Insert a row, assigning the next id.
    pub fn insert(&self, entity_type: &str, properties: PropertyMap) -> EntityId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .tables
            .write()
            .entry(entity_type.to_string())
            .or_default()
            .insert(id, properties);
        EntityId(id)
    }

    /// Record a one-directional navigation link. Call twice for a
    /// relationship navigable from both ends.
    pub fn link(&self, source_type: &str, source: EntityId, target_type: &str, target: EntityId) {
        self.inner
            .links
            .write()
            .entry((source_type.to_string(), source.0, target_type.to_string()))
            .or_default()
            .push(target.0);
    }

    fn rows_for(&self, plan: &MemoryPlan) -> Vec<MemoryRow> {
        let tables = self.inner.tables.read();
        let table = tables.get(&plan.target_type);
        let mut rows = Vec::new();
        match &plan.select {
            Select::All => {
                if let Some(table) = table {
                    for (id, properties) in table {
                        rows.push(MemoryRow::new(*id, &plan.target_type, properties.clone()));
                    }
                }
            }
            Select::ById(id) => {
                if let Some(properties) = table.and_then(|t| t.get(id)) {
                    rows.push(MemoryRow::new(*id, &plan.target_type, properties.clone()));
                }
            }
            Select::Related { source_type, source_id } => {
                let links = self.inner.links.read();
                let key = (source_type.clone(), *source_id, plan.target_type.clone());
                if let (Some(table), Some(ids)) = (table, links.get(&key)) {
                    for id in ids {
                        if let Some(properties) = table.get(id) {
                            rows.push(MemoryRow::new(*id, &plan.target_type, properties.clone()));
                        }
                    }
                }
            }
        }
        rows
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Rows
// ============================================================================

/// One raw row handed to the materializer.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRow {
    pub id: i64,
    pub entity_type: String,
    pub properties: PropertyMap,
}

impl MemoryRow {
    fn new(id: i64, entity_type: &str, properties: PropertyMap) -> Self {
        Self { id, entity_type: entity_type.to_string(), properties }
    }
}

/// Cursor over a pre-collected row set, with one-row lookahead for
/// `has_next`.
pub struct VecCursor {
    rows: std::vec::IntoIter<MemoryRow>,
    peeked: Option<MemoryRow>,
}

#[async_trait]
impl RowCursor for VecCursor {
    type Row = MemoryRow;

    async fn fetch_next(&mut self) -> Result<Option<MemoryRow>> {
        if let Some(row) = self.peeked.take() {
            return Ok(Some(row));
        }
        Ok(self.rows.next())
    }

    async fn has_next(&mut self) -> Result<bool> {
        if self.peeked.is_none() {
            self.peeked = self.rows.next();
        }
        Ok(self.peeked.is_some())
    }
}

// ============================================================================
// Plans
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Select {
    All,
    ById(i64),
    Related { source_type: String, source_id: i64 },
}

/// Resolved query for the memory backend.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryPlan {
    target_type: String,
    select: Select,
    skip: usize,
    filter: Option<String>,
}

impl fmt::Display for MemoryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT * FROM {}", self.target_type)?;
        match &self.select {
            Select::All => {}
            Select::ById(id) => write!(f, " WHERE id = {id}")?,
            Select::Related { source_type, source_id } => {
                write!(f, " WHERE {source_type}.id = {source_id}")?;
            }
        }
        if let Some(filter) = &self.filter {
            write!(f, " FILTER ({filter})")?;
        }
        if self.skip > 0 {
            write!(f, " OFFSET {}", self.skip)?;
        }
        Ok(())
    }
}

// ============================================================================
// QueryBackend impl
// ============================================================================

#[async_trait]
impl QueryBackend for MemoryBackend {
    type Plan = MemoryPlan;
    type Row = MemoryRow;
    type Cursor = VecCursor;

    fn plan(&self, path: &ResourcePath, query: &Query) -> Result<MemoryPlan> {
        let mut current: Option<(String, i64)> = None;
        let mut select = Select::All;
        let mut target_type = None;

        for (i, element) in path.elements().iter().enumerate() {
            match element {
                PathElement::Collection { entity_type } => {
                    select = match current.take() {
                        Some((source_type, source_id)) => Select::Related { source_type, source_id },
                        None if i == 0 => Select::All,
                        // A collection hop right after a to-one hop would
                        // need a join; this backend has none.
                        None => {
                            return Err(Error::PlanError(format!(
                                "cannot chain {entity_type} behind a to-one hop in {path}"
                            )));
                        }
                    };
                    target_type = Some(entity_type.clone());
                }
                PathElement::Entity { entity_type, id } => {
                    match id {
                        Some(id) => {
                            select = Select::ById(id.0);
                            current = Some((entity_type.clone(), id.0));
                        }
                        None => {
                            // To-one navigation; identity comes from the parent.
                            let Some((source_type, source_id)) = current.take() else {
                                return Err(Error::PlanError(format!(
                                    "entity element {entity_type} without id has no parent entity"
                                )));
                            };
                            select = Select::Related { source_type, source_id };
                        }
                    }
                    target_type = Some(entity_type.clone());
                }
                // Property tails are resolved by the engine, not the store.
                PathElement::Property { .. }
                | PathElement::CustomProperty { .. }
                | PathElement::ArrayIndex { .. } => break,
            }
        }

        let Some(target_type) = target_type else {
            return Err(Error::PlanError(format!("path {path} selects no entity set")));
        };

        Ok(MemoryPlan {
            target_type,
            select,
            skip: query.skip,
            filter: query.filter.as_ref().map(|f| f.0.clone()),
        })
    }

    async fn select(&self, plan: &MemoryPlan) -> Result<VecCursor> {
        let rows: Vec<MemoryRow> = self.rows_for(plan).into_iter().skip(plan.skip).collect();
        Ok(VecCursor { rows: rows.into_iter(), peeked: None })
    }

    async fn count(&self, plan: &MemoryPlan) -> Result<i64> {
        Ok(self.rows_for(plan).len() as i64)
    }
}

// ============================================================================
// Materializer
// ============================================================================

/// Materializer for [`MemoryRow`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryMaterializer;

impl Materializer<MemoryRow> for MemoryMaterializer {
    fn materialize(&self, entity_type: &str, row: MemoryRow) -> Result<Entity> {
        if row.entity_type != entity_type {
            return Err(Error::MalformedRow(format!(
                "expected a {entity_type} row, got {}",
                row.entity_type
            )));
        }
        Ok(Entity {
            id: EntityId(row.id),
            entity_type: row.entity_type,
            properties: row.properties,
            navigation: std::collections::HashMap::new(),
        })
    }
}
