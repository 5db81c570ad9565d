//! # Query Execution Port
//!
//! This is THE contract between the resolution engine and any backing
//! store. The engine never constructs SQL or touches a driver — it hands a
//! path+query to [`QueryBackend::plan`] and consumes rows from the cursor
//! [`QueryBackend::select`] returns.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryBackend` | `memory` | In-memory tables for testing/embedding |
//!
//! Cursors are single-consumer and release their resources on drop, so an
//! aborted resolution (client disconnect, error mid-page) never leaks an
//! open stream or a pending count.

pub mod memory;

use std::fmt;

use async_trait::async_trait;

use crate::model::Entity;
use crate::path::ResourcePath;
use crate::query::Query;
use crate::settings::Settings;
use crate::Result;

pub use memory::{MemoryBackend, MemoryMaterializer, MemoryRow};

// ============================================================================
// Row cursor
// ============================================================================

/// A lazy, single-consumer sequence of rows.
#[async_trait]
pub trait RowCursor: Send {
    type Row: Send;

    /// Pull the next row, or `None` when the stream is exhausted.
    async fn fetch_next(&mut self) -> Result<Option<Self::Row>>;

    /// Whether at least one further row exists, without handing it out.
    /// The row stays buffered for the next `fetch_next` call.
    async fn has_next(&mut self) -> Result<bool>;
}

// ============================================================================
// QueryBackend trait
// ============================================================================

/// The universal store contract.
///
/// One plan is built per resolution call; `select` and `count` both execute
/// against a plan independently — a count never drives the row stream and
/// vice versa.
#[async_trait]
pub trait QueryBackend: Send + Sync + 'static {
    /// The backend's resolved query representation. `Display` renders the
    /// query text used in slow-operation telemetry.
    type Plan: fmt::Display + Send + Sync;

    /// One raw result row.
    type Row: Send + 'static;

    /// The cursor type `select` returns.
    type Cursor: RowCursor<Row = Self::Row>;

    /// Build a plan for a path + query. This is where filter, ordering and
    /// skip state get translated; the engine treats them as opaque.
    fn plan(&self, path: &ResourcePath, query: &Query) -> Result<Self::Plan>;

    /// Execute a select, returning a lazy row stream.
    async fn select(&self, plan: &Self::Plan) -> Result<Self::Cursor>;

    /// Execute a count of all rows the plan matches, ignoring paging.
    async fn count(&self, plan: &Self::Plan) -> Result<i64>;
}

// ============================================================================
// Row materializer
// ============================================================================

/// Converts one raw row into a typed [`Entity`]. Supplied per deployment;
/// deterministic and pure with respect to its inputs.
pub trait Materializer<R>: Send + Sync {
    /// Fails with [`crate::Error::MalformedRow`] when required fields are
    /// missing or the row does not belong to `entity_type`.
    fn materialize(&self, entity_type: &str, row: R) -> Result<Entity>;
}

// ============================================================================
// Continuation links
// ============================================================================

/// Produces the continuation token attached to a truncated collection.
pub trait LinkGenerator: Send + Sync {
    fn next_link(&self, path: &ResourcePath, query: &Query) -> String;
}

/// Default link generator: renders a skip-based URL for the next page.
#[derive(Debug, Clone)]
pub struct SkipLinkGenerator {
    base_url: String,
    settings: Settings,
}

impl SkipLinkGenerator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), settings: Settings::default() }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }
}

impl LinkGenerator for SkipLinkGenerator {
    fn next_link(&self, path: &ResourcePath, query: &Query) -> String {
        // The assembler has already corrected `top` when a page was cut
        // short, so skip + effective top is exactly the rows served.
        let top = query.top_or(&self.settings);
        let skip = query.skip + top;
        format!(
            "{}/{}?$top={}&$skip={}",
            self.base_url.trim_end_matches('/'),
            path,
            top,
            skip
        )
    }
}
