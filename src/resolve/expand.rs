//! Navigation expansion: the recursive core of the engine.
//!
//! Each expand directive fetches one navigation hop through the normal
//! dispatcher, against a synthetic path rooted at the entity being
//! expanded. Multi-hop expands resolve one hop per recursion level by
//! synthesizing a sub-query that carries the remaining hops.

use crate::backend::{LinkGenerator, Materializer, QueryBackend};
use crate::model::{Entity, NavEntry, NavValue};
use crate::path::{NavigationProperty, PathElement, ResourcePath};
use crate::query::{Expand, Query};
use crate::resolve::{BoxFuture, Resolver, ResultValue};
use crate::{Error, Result};

impl<B, M, L> Resolver<B, M, L>
where
    B: QueryBackend,
    M: Materializer<B::Row>,
    L: LinkGenerator,
{
    /// Attach every expand of `query` to `entity`, in order.
    pub(crate) fn expand_entity<'a>(
        &'a self,
        entity: &'a mut Entity,
        query: &'a Query,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            for expand in &query.expand {
                self.apply_expand(entity, expand, query).await?;
            }
            Ok(())
        })
    }

    async fn apply_expand(
        &self,
        entity: &mut Entity,
        expand: &Expand,
        outer: &Query,
    ) -> Result<()> {
        let Some(first) = expand.path.first() else {
            return Err(Error::InvariantViolation(
                "expand with an empty navigation path".into(),
            ));
        };

        let mut sub_query = self.sub_query_for(expand, outer);

        let slot_is_export = entity.navigation.get(&first.name).is_some_and(|e| e.export);
        if !slot_is_export {
            let child_path = child_path(entity, first);
            match self.resolve_boxed(&child_path, &mut sub_query).await? {
                ResultValue::Entity(child) => {
                    entity.navigation.insert(
                        first.name.clone(),
                        NavEntry { value: NavValue::Entity(Box::new(child)), export: true },
                    );
                }
                ResultValue::Collection(children) => {
                    entity.navigation.insert(
                        first.name.clone(),
                        NavEntry { value: NavValue::Collection(children), export: true },
                    );
                }
                ResultValue::Absent => {
                    // Nothing behind the navigation; the slot stays empty.
                    entity.navigation.remove(&first.name);
                }
                ResultValue::Named { .. } => {
                    return Err(Error::InvariantViolation(format!(
                        "expand of {} resolved to a named value",
                        first.name
                    )));
                }
            }
            return Ok(());
        }

        // The slot already holds a final value: recurse into it with the
        // computed sub-query instead of fetching the target again.
        if let Some(entry) = entity.navigation.get_mut(&first.name) {
            match &mut entry.value {
                NavValue::Collection(set) if first.is_collection => {
                    for member in set.iter_mut() {
                        self.expand_entity(member, &sub_query).await?;
                    }
                }
                NavValue::Entity(child) if !first.is_collection => {
                    self.expand_entity(child, &sub_query).await?;
                }
                NavValue::Collection(_) | NavValue::Entity(_) => {
                    return Err(Error::InvariantViolation(format!(
                        "navigation {} is declared {} but the embedded value has the opposite shape",
                        first.name,
                        if first.is_collection { "to-many" } else { "to-one" },
                    )));
                }
            }
        }
        Ok(())
    }

    /// The query to apply at the hop being fetched.
    fn sub_query_for(&self, expand: &Expand, outer: &Query) -> Query {
        if expand.path.len() == 1 {
            // Last hop of the expand path: its attached query applies here.
            expand.query.as_deref().cloned().unwrap_or_default()
        } else {
            // Intermediate hop: synthesize a query whose only job is to
            // carry the remaining hops one level deeper.
            let rest = Expand {
                path: expand.path.iter().skip(1).cloned().collect(),
                query: expand.query.clone(),
            };
            let mut query = Query::new().with_expand(rest);
            if outer.count.is_some() {
                query.count = Some(outer.count_or(&self.settings));
            }
            query
        }
    }
}

/// Synthetic path for one navigation hop: the entity's own collection and
/// id, extended by the hop target.
fn child_path(entity: &Entity, nav: &NavigationProperty) -> ResourcePath {
    let element = if nav.is_collection {
        PathElement::Collection { entity_type: nav.target_type.clone() }
    } else {
        PathElement::Entity { entity_type: nav.target_type.clone(), id: None }
    };
    ResourcePath::entity(entity.entity_type.clone(), entity.id).with_element(element)
}
