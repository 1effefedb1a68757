//! Exploratory search: neighbourhoods of named entities, and the option
//! lists a client offers for picking those names.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::driver::{GraphStore, Seed};
use crate::embedder::EmbedderClient;
use crate::nodes::EntityKind;
use crate::search::{GraphExpander, PresentationGraph, Recommender};

/// Records returned per seed by exploratory search.
pub const SEARCH_LIMIT: usize = 100;
/// Pipelines sampled when a search names nothing.
pub const SAMPLE_PIPELINES: usize = 5;
/// Default cap on names read per type for [`SearchOptions`].
pub const OPTIONS_LIMIT: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub task: Option<String>,
    pub dataset: Option<String>,
    pub model: Option<String>,
}

impl SearchRequest {
    /// Exact-name seeds for every filled field.
    pub fn seeds(&self) -> Vec<Seed> {
        [
            (EntityKind::Task, &self.task),
            (EntityKind::Dataset, &self.dataset),
            (EntityKind::Model, &self.model),
        ]
        .into_iter()
        .filter_map(|(kind, name)| {
            name.as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(|n| Seed::by_name(kind, n))
        })
        .collect()
    }
}

/// Sorted distinct names per selectable type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub tasks: Vec<String>,
    pub datasets: Vec<String>,
    pub models: Vec<String>,
}

impl<S: GraphStore, E: EmbedderClient> Recommender<S, E> {
    /// Neighbourhoods of the named entities, or of a few sampled pipelines
    /// when no name is given.
    pub async fn search(&self, req: &SearchRequest) -> PresentationGraph {
        let mut seeds = req.seeds();
        if seeds.is_empty() {
            match self
                .store()
                .nodes(EntityKind::Pipeline, Some(SAMPLE_PIPELINES))
                .await
            {
                Ok(pipelines) => {
                    seeds = pipelines
                        .iter()
                        .filter_map(|p| p.item_id())
                        .map(|id| Seed::by_id(EntityKind::Pipeline, id))
                        .collect();
                }
                Err(e) => {
                    warn!(error = %e, "pipeline sample failed");
                    return PresentationGraph::default();
                }
            }
        }
        let results = GraphExpander::new(self.store(), SEARCH_LIMIT)
            .expand(&seeds)
            .await;
        PresentationGraph::from_results(&results)
    }

    pub async fn options(&self, limit: usize) -> SearchOptions {
        SearchOptions {
            tasks: self.names(EntityKind::Task, limit).await,
            datasets: self.names(EntityKind::Dataset, limit).await,
            models: self.names(EntityKind::Model, limit).await,
        }
    }

    async fn names(&self, kind: EntityKind, limit: usize) -> Vec<String> {
        match self.store().nodes(kind, Some(limit)).await {
            Ok(nodes) => nodes
                .iter()
                .map(|n| n.name().to_string())
                .filter(|n| !n.is_empty())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            Err(e) => {
                warn!(kind = %kind, error = %e, "option read failed");
                Vec::new()
            }
        }
    }
}
