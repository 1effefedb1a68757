//! Similarity Ranker.
//!
//! Scores every indexed entity of one type against a query by averaging the
//! signals defined for that type:
//!
//! | type            | signals                                 |
//! |-----------------|-----------------------------------------|
//! | Task            | embedding, token, modality, category    |
//! | Dataset, Model  | embedding, token                        |
//! | Pipeline        | embedding                               |
//!
//! Candidates are the index entries in index order joined with the live node
//! set; an entry missing on either side is skipped. Ordering is by combined
//! score, descending, with ties left in index order.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::driver::StoredNode;
use crate::embedder::Embedding;
use crate::errors::{AimkgError, Result};
use crate::index::EmbeddingIndex;
use crate::nodes::EntityKind;
use crate::taxonomy::{CategorySet, Classifier, ModalitySet};
use crate::utils::{cosine_similarity, jaccard, tokenize};

/// A query prepared for ranking: classified the same way stored entities were
/// at ingestion time, plus its embedding.
#[derive(Debug, Clone)]
pub struct QueryProfile {
    pub text: String,
    pub tokens: BTreeSet<String>,
    pub modality: ModalitySet,
    pub category: CategorySet,
    pub embedding: Embedding,
}

/// Per-signal similarities; `None` where the signal is not defined for the
/// entity type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Signals {
    pub embedding: f32,
    pub token: Option<f32>,
    pub modality: Option<f32>,
    pub category: Option<f32>,
}

impl Signals {
    /// Unweighted mean of the defined signals.
    pub fn combined(&self) -> f32 {
        let defined: Vec<f32> = std::iter::once(self.embedding)
            .chain(self.token)
            .chain(self.modality)
            .chain(self.category)
            .collect();
        defined.iter().sum::<f32>() / defined.len() as f32
    }
}

#[derive(Debug, Clone)]
pub struct RankedEntity {
    pub node: StoredNode,
    pub score: f32,
    pub signals: Signals,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityRanker {
    classifier: Classifier,
}

impl SimilarityRanker {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    pub fn profile(&self, text: &str, embedding: Embedding) -> QueryProfile {
        let tokens = tokenize(text);
        QueryProfile {
            text: text.to_string(),
            modality: self.classifier.modality(&tokens),
            category: self.classifier.category(&tokens),
            tokens: tokens.into_iter().collect(),
            embedding,
        }
    }

    /// Signals of one candidate against `query`.
    pub fn signals(
        &self,
        kind: EntityKind,
        query: &QueryProfile,
        vector: &[f32],
        node: &StoredNode,
    ) -> Signals {
        let embedding = cosine_similarity(&query.embedding, vector);
        if kind == EntityKind::Pipeline {
            return Signals {
                embedding,
                token: None,
                modality: None,
                category: None,
            };
        }
        let tokens: BTreeSet<String> = tokenize(node.name()).into_iter().collect();
        let token = Some(jaccard(&query.tokens, &tokens));
        if kind != EntityKind::Task {
            return Signals {
                embedding,
                token,
                modality: None,
                category: None,
            };
        }
        let modality = ModalitySet::parse_lenient(node.property("modality").unwrap_or_default());
        let category = CategorySet::parse_lenient(node.property("category").unwrap_or_default());
        Signals {
            embedding,
            token,
            modality: Some(jaccard(query.modality.as_set(), modality.as_set())),
            category: Some(jaccard(query.category.as_set(), category.as_set())),
        }
    }

    /// The top `n` candidates of `index` against `query`.
    pub fn rank(
        &self,
        query: &QueryProfile,
        index: &EmbeddingIndex,
        nodes: &[StoredNode],
        n: usize,
    ) -> Result<Vec<RankedEntity>> {
        let kind = index.kind();
        if query.embedding.len() != index.dim() {
            return Err(AimkgError::Index(format!(
                "query embedding has {} dimensions, {kind} index has {}",
                query.embedding.len(),
                index.dim()
            )));
        }

        let live: HashMap<_, &StoredNode> = nodes
            .iter()
            .filter_map(|node| node.item_id().map(|id| (id, node)))
            .collect();

        let mut skipped = 0usize;
        let mut scored: Vec<RankedEntity> = Vec::with_capacity(index.len());
        for (id, vector) in index.iter() {
            let Some(node) = live.get(&id) else {
                skipped += 1;
                continue;
            };
            let signals = self.signals(kind, query, vector, node);
            scored.push(RankedEntity {
                node: (*node).clone(),
                score: signals.combined(),
                signals,
            });
        }
        if skipped > 0 {
            debug!(kind = %kind, skipped, "index entries without a live node");
        }

        // Stable: equal scores keep index order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(n);
        Ok(scored)
    }
}
