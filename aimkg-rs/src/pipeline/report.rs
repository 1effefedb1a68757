//! Ingestion run report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::edges::RelationshipType;
use crate::nodes::EntityKind;

/// What assembly and loading did for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: String,
    /// Distinct nodes written to the interchange tables, per type.
    pub nodes: BTreeMap<EntityKind, usize>,
    /// Records with at least one optional field missing, per type.
    pub incomplete: BTreeMap<EntityKind, usize>,
    /// Distinct relationships resolved to generated IDs, per type.
    pub resolved: BTreeMap<RelationshipType, usize>,
    /// Relationship records dropped because an endpoint had no generated ID.
    pub missed: BTreeMap<RelationshipType, usize>,
    /// Nodes submitted to the graph store, per type.
    pub loaded_nodes: BTreeMap<EntityKind, usize>,
    /// Relationships submitted to the graph store, per type.
    pub loaded_relationships: BTreeMap<RelationshipType, usize>,
}

impl SourceReport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn total_missed(&self) -> usize {
        self.missed.values().sum()
    }

    pub fn total_resolved(&self) -> usize {
        self.resolved.values().sum()
    }

    /// Misses as a fraction of all relationship records seen.
    pub fn miss_rate(&self) -> f64 {
        let seen = self.total_missed() + self.total_resolved();
        if seen == 0 {
            return 0.0;
        }
        self.total_missed() as f64 / seen as f64
    }
}

/// Update counts of the two enrichment passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentCounts {
    pub task_taxonomy: usize,
    pub dataset_modality: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub sources: Vec<SourceReport>,
    pub enrichment: EnrichmentCounts,
    /// Entries per rebuilt embedding index.
    pub index_sizes: BTreeMap<EntityKind, usize>,
}

impl IngestReport {
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            sources: Vec::new(),
            enrichment: EnrichmentCounts::default(),
            index_sizes: BTreeMap::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn total_missed(&self) -> usize {
        self.sources.iter().map(SourceReport::total_missed).sum()
    }

    /// Emit the report as structured log events.
    pub fn log(&self) {
        for source in &self.sources {
            info!(
                run_id = %self.run_id,
                source = %source.source,
                nodes = ?source.nodes,
                incomplete = ?source.incomplete,
                resolved = source.total_resolved(),
                "source ingested"
            );
            if source.total_missed() > 0 {
                warn!(
                    run_id = %self.run_id,
                    source = %source.source,
                    missed = ?source.missed,
                    miss_rate = source.miss_rate(),
                    "relationship resolution misses"
                );
            }
        }
        let elapsed_ms = self
            .finished_at
            .map(|end| (end - self.started_at).num_milliseconds());
        info!(
            run_id = %self.run_id,
            sources = self.sources.len(),
            missed = self.total_missed(),
            task_taxonomy_updates = self.enrichment.task_taxonomy,
            dataset_modality_updates = self.enrichment.dataset_modality,
            index_sizes = ?self.index_sizes,
            elapsed_ms = ?elapsed_ms,
            "ingestion run finished"
        );
    }
}
