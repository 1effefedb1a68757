//! Graph Expander: bounded neighbourhood reads around seed entities.

use tracing::warn;

use crate::driver::{GraphStore, Seed, TraversalRecord, TraversalShape};
use crate::ids::ItemId;
use crate::nodes::EntityKind;

pub struct GraphExpander<'a, S> {
    store: &'a S,
    limit: usize,
}

impl<'a, S: GraphStore> GraphExpander<'a, S> {
    pub fn new(store: &'a S, limit: usize) -> Self {
        Self { store, limit }
    }

    /// One result set per seed, in seed order. A seed whose traversal fails
    /// contributes an empty set instead of failing the whole expansion.
    pub async fn expand(&self, seeds: &[Seed]) -> Vec<Vec<TraversalRecord>> {
        let mut results = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let shape = TraversalShape::rooted_at(seed.kind);
            match self.store.traverse(&shape, seed, self.limit).await {
                Ok(records) => results.push(records),
                Err(e) => {
                    warn!(kind = %seed.kind, error = %e, "traversal failed, seed dropped");
                    results.push(Vec::new());
                }
            }
        }
        results
    }

    pub async fn expand_ids(&self, kind: EntityKind, ids: &[ItemId]) -> Vec<Vec<TraversalRecord>> {
        let seeds: Vec<Seed> = ids.iter().map(|&id| Seed::by_id(kind, id)).collect();
        self.expand(&seeds).await
    }
}
