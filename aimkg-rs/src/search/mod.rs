//! Recommendation subsystem.
//!
//! A request names one entity type by the field it fills in. Serving it runs:
//! 1. **Rank** the type's indexed entities against the query text
//! 2. **Expand** each of the top N through its fixed-shape traversal
//! 3. **Serialize** the union into one presentation graph with explanations
//!
//! Everything here is read-only. A missing index is reported to the caller;
//! store or embedder failures during serving degrade to an empty result.

pub mod browse;
pub mod expand;
pub mod rank;
pub mod serialize;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::driver::GraphStore;
use crate::embedder::EmbedderClient;
use crate::errors::{AimkgError, Result};
use crate::index::IndexCatalog;
use crate::nodes::EntityKind;
use crate::taxonomy::Classifier;
use crate::types::AimkgConfig;

pub use browse::{SearchOptions, SearchRequest};
pub use expand::GraphExpander;
pub use rank::{QueryProfile, RankedEntity, Signals, SimilarityRanker};
pub use serialize::{Explanation, PresentationGraph, PresentedLink, PresentedNode};

/// Upper bound on recommendations per request.
pub const MAX_RECOMMENDATIONS: usize = 50;

/// A recommendation query. The first non-empty field among `task`, `dataset`,
/// `model`, `pipeline` selects the entity type and supplies the query text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendRequest {
    pub task: Option<String>,
    pub dataset: Option<String>,
    pub model: Option<String>,
    pub pipeline: Option<String>,
    pub num_recommendations: Option<usize>,
}

impl RecommendRequest {
    pub fn for_kind(kind: EntityKind, query: impl Into<String>) -> Self {
        let query = Some(query.into());
        let mut req = Self::default();
        match kind {
            EntityKind::Task => req.task = query,
            EntityKind::Dataset => req.dataset = query,
            EntityKind::Model => req.model = query,
            _ => req.pipeline = query,
        }
        req
    }

    pub fn with_count(mut self, n: usize) -> Self {
        self.num_recommendations = Some(n);
        self
    }

    pub fn target(&self) -> Result<(EntityKind, &str)> {
        [
            (EntityKind::Task, &self.task),
            (EntityKind::Dataset, &self.dataset),
            (EntityKind::Model, &self.model),
            (EntityKind::Pipeline, &self.pipeline),
        ]
        .into_iter()
        .find_map(|(kind, field)| {
            field
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(|q| (kind, q))
        })
        .ok_or_else(|| {
            AimkgError::Validation(
                "one of task, dataset, model or pipeline must be given".to_string(),
            )
        })
    }
}

/// The answer to a [`RecommendRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: EntityKind,
    #[serde(flatten)]
    pub graph: PresentationGraph,
    /// Properties of the ranked entities, best first.
    pub similar_items: Vec<BTreeMap<String, String>>,
}

impl Recommendation {
    fn empty(kind: EntityKind) -> Self {
        Self {
            kind,
            graph: PresentationGraph::default(),
            similar_items: Vec::new(),
        }
    }
}

/// Serves recommendations and exploratory search over one store.
pub struct Recommender<S, E> {
    store: S,
    embedder: E,
    catalog: IndexCatalog,
    ranker: SimilarityRanker,
    default_count: usize,
    traversal_limit: usize,
}

impl<S: GraphStore, E: EmbedderClient> Recommender<S, E> {
    pub fn new(store: S, embedder: E, catalog: IndexCatalog, config: &AimkgConfig) -> Self {
        Self {
            store,
            embedder,
            catalog,
            ranker: SimilarityRanker::new(Classifier::new(config.multimodal_rule)),
            default_count: config.num_results,
            traversal_limit: config.traversal_limit,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &IndexCatalog {
        &self.catalog
    }

    pub async fn recommend(&self, req: &RecommendRequest) -> Result<Recommendation> {
        let (kind, text) = req.target()?;
        let n = req
            .num_recommendations
            .unwrap_or(self.default_count)
            .clamp(1, MAX_RECOMMENDATIONS);

        let index = self.catalog.get(kind).await?;

        let embedding = match self.embedder.embed(text).await {
            Ok(e) => e,
            Err(e) => {
                warn!(kind = %kind, error = %e, "query embedding failed");
                return Ok(Recommendation::empty(kind));
            }
        };
        let nodes = match self.store.nodes(kind, None).await {
            Ok(nodes) => nodes,
            Err(e) if e.is_store_failure() => {
                warn!(kind = %kind, error = %e, "candidate read failed");
                return Ok(Recommendation::empty(kind));
            }
            Err(e) => return Err(e),
        };

        let query = self.ranker.profile(text, embedding);
        let ranked = self.ranker.rank(&query, &index, &nodes, n)?;

        let ids: Vec<_> = ranked.iter().filter_map(|r| r.node.item_id()).collect();
        let results = GraphExpander::new(&self.store, self.traversal_limit)
            .expand_ids(kind, &ids)
            .await;

        let explanations = std::iter::once(Explanation::query(&query, kind))
            .chain(
                ranked
                    .iter()
                    .enumerate()
                    .map(|(i, r)| Explanation::recommendation(i + 1, &query, r)),
            )
            .collect();
        let graph = PresentationGraph::from_results(&results).with_explanations(explanations);

        info!(
            kind = %kind,
            requested = n,
            ranked = ranked.len(),
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            "recommendation served"
        );
        Ok(Recommendation {
            kind,
            graph,
            similar_items: ranked.into_iter().map(|r| r.node.properties).collect(),
        })
    }
}
