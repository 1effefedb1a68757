//! One batch ingestion run: every source dump in `SOURCE_DUMPS`, in order,
//! into the configured Neo4j database, then enrichment and index rebuild.
//! Prints the run report as JSON on stdout.

use aimkg_rs::driver::Neo4jStore;
use aimkg_rs::embedder::AnyEmbedder;
use aimkg_rs::pipeline::Ingestion;
use aimkg_rs::source::{SourceDump, TaskTaxonomy};
use aimkg_rs::AimkgConfig;
use tracing::{error, info};

use aimkg_server::{config::IngestConfig, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = AimkgConfig::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;
    let ingest = IngestConfig::from_env()?;

    let dumps = ingest
        .source_dumps
        .iter()
        .map(|path| SourceDump::load(path))
        .collect::<Result<Vec<_>, _>>()?;
    let taxonomy = match &ingest.task_taxonomy {
        Some(path) => TaskTaxonomy::load(path)?,
        None => {
            info!("no TASK_TAXONOMY given, task enrichment will be skipped");
            TaskTaxonomy::default()
        }
    };

    let store = Neo4jStore::connect(&config).await?;
    let embedder = AnyEmbedder::from_config(&config);
    let report = Ingestion::new(&store, &embedder, &config)
        .with_taxonomy(taxonomy)
        .run(&dumps)
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.total_missed() > 0 {
        info!(missed = report.total_missed(), "run finished with dropped relationships");
    }
    Ok(())
}
