//! Collection assembly: lazy row consumption, truncation, continuation.

use crate::backend::{LinkGenerator, Materializer, QueryBackend, RowCursor};
use crate::model::EntityCollection;
use crate::path::{PathElement, ResourcePath};
use crate::query::Query;
use crate::resolve::{Resolver, ResultValue};
use crate::{Error, Result};

impl<B, M, L> Resolver<B, M, L>
where
    B: QueryBackend,
    M: Materializer<B::Row>,
    L: LinkGenerator,
{
    pub(crate) async fn resolve_collection(
        &self,
        path: &ResourcePath,
        query: &mut Query,
    ) -> Result<ResultValue> {
        let mut collection = self.fetch_collection(path, query).await?;
        for entity in collection.iter_mut() {
            self.expand_entity(entity, query).await?;
        }
        Ok(ResultValue::Collection(collection))
    }

    /// Drive the row stream for a collection request.
    ///
    /// Consumption stops at the first of: the effective top, the payload
    /// budget, or stream exhaustion. When the budget stopped the page short
    /// of the requested top and rows remain, the query's top is corrected
    /// down to the rows actually served so the continuation link advertises
    /// a consistent page size.
    pub(crate) async fn fetch_collection(
        &self,
        path: &ResourcePath,
        query: &mut Query,
    ) -> Result<EntityCollection> {
        let PathElement::Collection { entity_type } = path.last() else {
            return Err(Error::InvariantViolation(format!(
                "collection dispatch on non-collection element of {path}"
            )));
        };

        let plan = self.backend.plan(path, query)?;

        // The count query is independent of the row stream: it sees the
        // whole matching set even when the page below gets truncated.
        let count = if query.count_or(&self.settings) {
            Some(self.timed_count(&plan).await?)
        } else {
            None
        };

        let top = query.top_or(&self.settings);
        let mut remaining_budget = self.settings.max_payload_bytes;
        let mut cursor = self.timed_select(&plan).await?;
        let mut entities = Vec::new();

        while entities.len() < top {
            let Some(row) = cursor.fetch_next().await? else { break };
            let entity = self.materializer.materialize(entity_type, row)?;
            let size = entity.estimated_size();
            entities.push(entity);
            if size >= remaining_budget {
                break;
            }
            remaining_budget -= size;
        }

        // Probe for one more row without materializing it.
        let has_more = cursor.has_next().await?;
        drop(cursor);

        let served = entities.len();
        if has_more && served < top {
            query.top = Some(served);
        }

        let mut collection = EntityCollection::new(entities);
        collection.count = count;
        if has_more {
            collection.next_link = Some(self.links.next_link(path, query));
        }
        Ok(collection)
    }
}
