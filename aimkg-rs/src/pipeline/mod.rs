//! Ingestion pipeline.
//!
//! The batch stages in order:
//! 1. **Assemble**: per source, node tables then resolved relationship files
//! 2. **Load**: merge nodes and relationships into the graph store
//! 3. **Enrich**: task taxonomy pass, then dataset modality pass
//! 4. **Index**: rebuild the embedding index of every rankable entity type
//!
//! Every stage consumes the previous one's output, so they run strictly in
//! sequence. IDs are content-derived and writes are merges, so a failed run is
//! recovered by running it again from the start.

pub mod assemble;
pub mod enrich;
pub mod load;
pub mod report;

use tracing::info;

use crate::driver::GraphStore;
use crate::embedder::EmbedderClient;
use crate::errors::Result;
use crate::index::{IndexBuilder, IndexCatalog};
use crate::nodes::EntityKind;
use crate::source::{SourceDump, TaskTaxonomy};
use crate::taxonomy::Classifier;
use crate::types::AimkgConfig;

pub use assemble::GraphAssembler;
pub use enrich::{dataset_modality_pass, task_taxonomy_pass};
pub use load::GraphLoader;
pub use report::{EnrichmentCounts, IngestReport, SourceReport};

/// One batch ingestion run over a fixed set of source dumps.
pub struct Ingestion<'a, S, E> {
    store: &'a S,
    embedder: &'a E,
    config: &'a AimkgConfig,
    taxonomy: TaskTaxonomy,
    catalog: Option<&'a IndexCatalog>,
}

impl<'a, S: GraphStore, E: EmbedderClient> Ingestion<'a, S, E> {
    pub fn new(store: &'a S, embedder: &'a E, config: &'a AimkgConfig) -> Self {
        Self {
            store,
            embedder,
            config,
            taxonomy: TaskTaxonomy::default(),
            catalog: None,
        }
    }

    pub fn with_taxonomy(mut self, taxonomy: TaskTaxonomy) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    /// Evict each rebuilt index from `catalog` so readers sharing it pick up
    /// the new file immediately.
    pub fn with_catalog(mut self, catalog: &'a IndexCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub async fn run(&self, dumps: &[SourceDump]) -> Result<IngestReport> {
        let mut report = IngestReport::start();
        info!(run_id = %report.run_id, sources = dumps.len(), "ingestion run started");

        let classifier = Classifier::new(self.config.multimodal_rule);
        let assembler = GraphAssembler::new(classifier, &self.config.kg_data_dir);
        let loader = GraphLoader::new(self.store);

        for dump in dumps {
            let mut source = assembler.assemble(dump)?;
            loader.load(&assembler.layout(&dump.source), &mut source).await?;
            report.sources.push(source);
        }

        report.enrichment.task_taxonomy =
            task_taxonomy_pass(self.store, &classifier, &self.taxonomy).await?;
        report.enrichment.dataset_modality = dataset_modality_pass(self.store, &classifier).await?;

        let builder = IndexBuilder::new(self.store, self.embedder, &self.config.index_dir);
        for kind in EntityKind::RANKABLE {
            let index = builder.build(kind).await?;
            report.index_sizes.insert(kind, index.len());
            if let Some(catalog) = self.catalog {
                catalog.invalidate(kind).await;
            }
        }

        report.finish();
        report.log();
        Ok(report)
    }
}
