//! # navresolve-rs — Resource-Path Resolution Engine
//!
//! Resolves a parsed, hierarchical resource-path request — an entity, an
//! entity collection, a scalar property, or a nested custom-property field —
//! into a materialized result object suitable for serialization to a client.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `QueryBackend` is the contract between the engine and
//!    any backing store
//! 2. **Clean DTOs**: `Entity`, `EntityCollection`, `Value` cross all
//!    boundaries
//! 3. **The engine owns no queries**: plans are built by the backend from a
//!    path + query; filter and ordering state is opaque pass-through
//! 4. **Results are trees**: every resolution produces an exclusively owned
//!    result tree, so there is no sharing across requests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use navresolve_rs::{
//!     MemoryBackend, MemoryMaterializer, PropertyMap, Query, Resolver,
//!     ResourcePath, SkipLinkGenerator, Value,
//! };
//!
//! # async fn example() -> navresolve_rs::Result<()> {
//! let backend = MemoryBackend::new();
//! let mut props = PropertyMap::new();
//! props.insert("name".into(), Value::from("thermometer"));
//! let id = backend.insert("Things", props);
//!
//! let resolver = Resolver::new(
//!     backend,
//!     MemoryMaterializer,
//!     SkipLinkGenerator::new("http://localhost/v1"),
//! );
//!
//! let path = ResourcePath::entity("Things", id);
//! let mut query = Query::new();
//! let result = resolver.resolve(&path, &mut query).await?;
//! println!("{result:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## What resolves to what
//!
//! | Terminal path element | Result |
//! |-----------------------|--------|
//! | `Things(1)` | `ResultValue::Entity`, or `Absent` if id 1 does not exist |
//! | `Things` | `ResultValue::Collection` with paging state |
//! | `Things(1)/name` | `ResultValue::Named` |
//! | `Things(1)/properties/a[1]` | `ResultValue::Named`, or `Absent` |

// ============================================================================
// Modules
// ============================================================================

pub mod backend;
pub mod model;
pub mod path;
pub mod query;
pub mod resolve;
pub mod settings;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{Entity, EntityCollection, EntityId, NavEntry, NavValue, PropertyMap, Value};

// ============================================================================
// Re-exports: Path & Query
// ============================================================================

pub use path::{NavigationProperty, PathElement, ResourcePath};
pub use query::{Expand, FilterExpr, OrderBy, Query};

// ============================================================================
// Re-exports: Backend port
// ============================================================================

pub use backend::{
    LinkGenerator, Materializer, MemoryBackend, MemoryMaterializer, MemoryRow, QueryBackend,
    RowCursor, SkipLinkGenerator,
};

// ============================================================================
// Re-exports: Engine
// ============================================================================

pub use resolve::{Resolver, ResultValue};
pub use settings::Settings;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A structural contract was broken — a bug in query construction or in
    /// a caller, never bad client input.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The backend could not build a plan for a path + query.
    #[error("plan error: {0}")]
    PlanError(String),

    /// Store-level failure raised by a backend. Propagated unchanged; retry
    /// policy belongs to the store layer or the caller.
    #[error("storage error: {0}")]
    StorageError(String),

    /// A row was missing required fields during materialization.
    #[error("malformed row: {0}")]
    MalformedRow(String),

    #[error("type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },
}

pub type Result<T> = std::result::Result<T, Error>;
