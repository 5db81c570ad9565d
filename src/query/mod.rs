//! Request-scoped query description: expand tree, paging, count flag.
//!
//! Filter and ordering state is opaque to the engine — it rides along into
//! the backend's plan and is never interpreted here.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::path::NavigationProperty;
use crate::settings::Settings;

/// Opaque filter expression, passed through to the plan builder verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterExpr(pub String);

/// One ordering term, passed through to the plan builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub expr: String,
    pub descending: bool,
}

// ============================================================================
// Query
// ============================================================================

/// The client-specified query for one resolution.
///
/// `top` is the only field the engine ever writes: the collection assembler
/// corrects it downward when the payload budget truncates a page, so that
/// continuation links advertise the page size actually served.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub expand: Vec<Expand>,
    pub top: Option<usize>,
    pub skip: usize,
    /// Tri-state: `None` means "use the server default".
    pub count: Option<bool>,
    pub filter: Option<FilterExpr>,
    pub order: Vec<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    pub fn with_count(mut self, count: bool) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_expand(mut self, expand: Expand) -> Self {
        self.expand.push(expand);
        self
    }

    /// Effective page size: the client's top clamped to the server maximum,
    /// or the server default when the client gave none.
    pub fn top_or(&self, settings: &Settings) -> usize {
        self.top.map_or(settings.default_top, |t| t.min(settings.max_top))
    }

    /// Effective count flag.
    pub fn count_or(&self, settings: &Settings) -> bool {
        self.count.unwrap_or(settings.default_count)
    }
}

// ============================================================================
// Expand
// ============================================================================

/// One expand directive: a chain of navigation hops plus an optional query
/// applied at the final hop.
///
/// The hop list must be non-empty; the engine treats an empty list as an
/// invariant violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expand {
    pub path: SmallVec<[NavigationProperty; 2]>,
    pub query: Option<Box<Query>>,
}

impl Expand {
    /// Single-hop expand.
    pub fn new(nav: NavigationProperty) -> Self {
        let mut path = SmallVec::new();
        path.push(nav);
        Self { path, query: None }
    }

    /// Multi-hop expand: `a/b/c` resolves one hop per recursion level.
    pub fn hops(hops: impl IntoIterator<Item = NavigationProperty>) -> Self {
        Self { path: hops.into_iter().collect(), query: None }
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = Some(Box::new(query));
        self
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_top_clamped_to_server_max() {
        let settings = Settings { default_top: 100, max_top: 1000, ..Settings::default() };
        assert_eq!(Query::new().top_or(&settings), 100);
        assert_eq!(Query::new().with_top(5).top_or(&settings), 5);
        assert_eq!(Query::new().with_top(50_000).top_or(&settings), 1000);
    }

    #[test]
    fn test_count_defaulting() {
        let settings = Settings { default_count: true, ..Settings::default() };
        assert!(Query::new().count_or(&settings));
        assert!(!Query::new().with_count(false).count_or(&settings));
    }

    proptest! {
        /// The effective page size never exceeds the server maximum and
        /// never exceeds an explicit client top.
        #[test]
        fn prop_effective_top_bounds(
            top in proptest::option::of(0usize..10_000),
            max_top in 1usize..5_000,
            default_top in 0usize..5_000,
        ) {
            let settings = Settings { default_top, max_top, ..Settings::default() };
            let mut query = Query::new();
            query.top = top;
            let effective = query.top_or(&settings);
            match top {
                Some(t) => {
                    prop_assert!(effective <= max_top);
                    prop_assert!(effective <= t);
                }
                None => prop_assert_eq!(effective, default_top),
            }
        }
    }
}
