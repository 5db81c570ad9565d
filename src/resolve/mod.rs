//! Resolution engine.
//!
//! Turns a parsed resource path plus a query into the materialized result
//! object to serialize: a single entity, a page of a collection, or a named
//! scalar/sub-property value.
//!
//! The dispatcher routes on the path's terminal element; collection pages
//! are assembled in [`assemble`], navigation expansion recurses in
//! [`expand`], and property tails are peeled off in [`unwrap`].

mod assemble;
mod expand;
mod unwrap;

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::backend::{LinkGenerator, Materializer, QueryBackend, RowCursor};
use crate::model::{Entity, EntityCollection, Value};
use crate::path::{PathElement, ResourcePath};
use crate::query::Query;
use crate::settings::Settings;
use crate::{Error, Result};

/// Boxed future used to break the recursion in the engine's async call
/// graph (resolve → expand → resolve).
pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ============================================================================
// ResultValue
// ============================================================================

/// The tagged outcome of a resolution.
///
/// `Absent` means "the path does not resolve" — a normal outcome, distinct
/// from a property whose value is null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResultValue {
    Entity(Entity),
    Collection(EntityCollection),
    /// A scalar or sub-property result, nested under `name` on the wire.
    Named { name: String, value: Value },
    Absent,
}

impl ResultValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, ResultValue::Absent)
    }

    /// The key under which a named result nests in the wire response.
    pub fn named_key(&self) -> Option<&str> {
        match self {
            ResultValue::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn try_entity(self) -> Result<Entity> {
        match self {
            ResultValue::Entity(e) => Ok(e),
            other => Err(Error::TypeError {
                expected: "Entity".into(),
                got: other.variant_name().into(),
            }),
        }
    }

    pub fn try_collection(self) -> Result<EntityCollection> {
        match self {
            ResultValue::Collection(c) => Ok(c),
            other => Err(Error::TypeError {
                expected: "Collection".into(),
                got: other.variant_name().into(),
            }),
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            ResultValue::Entity(_) => "Entity",
            ResultValue::Collection(_) => "Collection",
            ResultValue::Named { .. } => "Named",
            ResultValue::Absent => "Absent",
        }
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// The engine's entry point: a backend, a row materializer and a link
/// generator, wired together under one `resolve` call.
///
/// One logical resolution per inbound request; a `Resolver` holds no
/// request state and is safe to share across requests.
pub struct Resolver<B, M, L>
where
    B: QueryBackend,
    M: Materializer<B::Row>,
    L: LinkGenerator,
{
    backend: B,
    materializer: M,
    links: L,
    settings: Settings,
}

impl<B, M, L> Resolver<B, M, L>
where
    B: QueryBackend,
    M: Materializer<B::Row>,
    L: LinkGenerator,
{
    pub fn new(backend: B, materializer: M, links: L) -> Self {
        Self { backend, materializer, links, settings: Settings::default() }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Access the underlying backend (for seeding, advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Resolve a path + query into a result value.
    ///
    /// Missing data is reported as [`ResultValue::Absent`], never as an
    /// error. `query.top` is corrected downward when the payload budget cut
    /// a collection page short (see [`Settings::max_payload_bytes`]).
    pub async fn resolve(&self, path: &ResourcePath, query: &mut Query) -> Result<ResultValue> {
        self.resolve_boxed(path, query).await
    }

    /// Boxed dispatcher — the engine recurses through here for parent
    /// paths and synthetic expansion paths.
    pub(crate) fn resolve_boxed<'a>(
        &'a self,
        path: &'a ResourcePath,
        query: &'a mut Query,
    ) -> BoxFuture<'a, Result<ResultValue>> {
        Box::pin(async move {
            match path.last() {
                PathElement::Entity { .. } => self.resolve_entity(path, query).await,
                PathElement::Collection { .. } => self.resolve_collection(path, query).await,
                PathElement::Property { name } => {
                    let parent = self.parent_of(path)?;
                    let result = self.resolve_boxed(&parent, query).await?;
                    Ok(unwrap::property(result, name))
                }
                PathElement::CustomProperty { name } => {
                    let parent = self.parent_of(path)?;
                    let result = self.resolve_boxed(&parent, query).await?;
                    Ok(unwrap::custom(result, name))
                }
                PathElement::ArrayIndex { index } => {
                    let parent = self.parent_of(path)?;
                    let result = self.resolve_boxed(&parent, query).await?;
                    Ok(unwrap::array(result, *index))
                }
            }
        })
    }

    fn parent_of(&self, path: &ResourcePath) -> Result<ResourcePath> {
        path.parent().ok_or_else(|| {
            Error::InvariantViolation(format!("property element at the root of path {path}"))
        })
    }

    /// Single-entity fetch: zero rows is `Absent`, a second row is a bug in
    /// the plan builder.
    async fn resolve_entity(
        &self,
        path: &ResourcePath,
        query: &mut Query,
    ) -> Result<ResultValue> {
        let PathElement::Entity { entity_type, .. } = path.last() else {
            return Err(Error::InvariantViolation(format!(
                "entity dispatch on non-entity element of {path}"
            )));
        };

        let plan = self.backend.plan(path, query)?;
        let mut cursor = self.timed_select(&plan).await?;
        let Some(row) = cursor.fetch_next().await? else {
            return Ok(ResultValue::Absent);
        };
        if cursor.has_next().await? {
            return Err(Error::InvariantViolation(format!(
                "expected at most one row for {path}, got more"
            )));
        }
        drop(cursor);

        let mut entity = self.materializer.materialize(entity_type, row)?;
        self.expand_entity(&mut entity, query).await?;
        Ok(ResultValue::Entity(entity))
    }

    // ========================================================================
    // Query timing (pure telemetry, never gating)
    // ========================================================================

    pub(crate) async fn timed_select(&self, plan: &B::Plan) -> Result<B::Cursor> {
        if !self.settings.log_slow_queries {
            return self.backend.select(plan).await;
        }
        let start = Instant::now();
        let result = self.backend.select(plan).await;
        self.report_slow(start.elapsed(), plan);
        result
    }

    pub(crate) async fn timed_count(&self, plan: &B::Plan) -> Result<i64> {
        if !self.settings.log_slow_queries {
            return self.backend.count(plan).await;
        }
        let start = Instant::now();
        let result = self.backend.count(plan).await;
        self.report_slow(start.elapsed(), plan);
        result
    }

    fn report_slow(&self, elapsed: Duration, plan: &B::Plan) {
        if elapsed >= self.settings.slow_query_threshold() {
            tracing::info!(
                duration_ms = elapsed.as_millis() as u64,
                query = %plan,
                "slow query execution"
            );
        }
    }
}
