//! Integration tests for ingestion: assembly, resolution, loading, enrichment
//! and index building against the in-process store.

mod common;

use aimkg_rs::driver::{GraphStore, MemoryStore};
use aimkg_rs::edges::RelationshipType;
use aimkg_rs::interchange::read_relationships;
use aimkg_rs::nodes::EntityKind;
use aimkg_rs::pipeline::GraphAssembler;
use aimkg_rs::source::SourceDump;
use aimkg_rs::taxonomy::Classifier;
use serde_json::json;
use tempfile::TempDir;

use common::{config, ingest};

// ---------------------------------------------------------------------------
// Cross-source merge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn same_dataset_from_two_sources_is_one_node() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new();
    ingest(&store, &config(&dir)).await;

    let datasets = store.nodes(EntityKind::Dataset, None).await.unwrap();
    assert_eq!(datasets.len(), 3);
    let imagenet: Vec<_> = datasets
        .iter()
        .filter(|d| d.name().eq_ignore_ascii_case("imagenet"))
        .collect();
    assert_eq!(imagenet.len(), 1);
    // First writer's attributes are kept.
    assert_eq!(imagenet[0].property("source"), Some("hub"));
    assert_eq!(imagenet[0].name(), "ImageNet");
}

// ---------------------------------------------------------------------------
// Pipeline fan-out
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_execution_per_distinct_dataset() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new();
    ingest(&store, &config(&dir)).await;

    // ViT: three distinct datasets (one listed twice). ResNet-50: none, so a
    // single execution against the sentinel.
    assert_eq!(store.node_count(EntityKind::Pipeline).await, 2);
    assert_eq!(store.node_count(EntityKind::Stage).await, 2);
    assert_eq!(store.node_count(EntityKind::Execution).await, 4);
    assert_eq!(store.node_count(EntityKind::Artifact).await, 4);
    assert_eq!(store.link_count(RelationshipType::UsesDataset).await, 3);
    assert_eq!(store.link_count(RelationshipType::UsesModel).await, 4);

    let executions = store.nodes(EntityKind::Execution, None).await.unwrap();
    assert!(executions
        .iter()
        .any(|e| e.property("dataset") == Some("none")));
}

#[tokio::test]
async fn frameworks_reports_and_metrics_are_linked() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new();
    ingest(&store, &config(&dir)).await;

    let frameworks = store.nodes(EntityKind::Framework, None).await.unwrap();
    assert_eq!(frameworks.len(), 1);
    assert_eq!(frameworks[0].name(), "pytorch");
    assert_eq!(store.link_count(RelationshipType::UsesFramework).await, 1);
    assert_eq!(store.link_count(RelationshipType::HasReport).await, 1);
    assert_eq!(store.link_count(RelationshipType::HasMetric).await, 1);
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unresolved_task_is_counted_not_raised() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let report = ingest(&store, &config(&dir)).await;

    let board = &report.sources[1];
    assert_eq!(board.source, "board");
    assert_eq!(board.missed.get(&RelationshipType::HasTask), Some(&1));
    assert_eq!(report.sources[0].total_missed(), 0);
    assert_eq!(report.total_missed(), 1);
    assert_eq!(store.link_count(RelationshipType::HasTask).await, 1);
}

#[tokio::test]
async fn incomplete_records_are_counted() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let report = ingest(&store, &config(&dir)).await;

    let hub = &report.sources[0];
    assert_eq!(hub.incomplete.get(&EntityKind::Task), Some(&1));
    assert_eq!(hub.incomplete.get(&EntityKind::Dataset), Some(&2));
    assert_eq!(hub.incomplete.get(&EntityKind::Model), None);
    let board = &report.sources[1];
    assert_eq!(board.incomplete.get(&EntityKind::Model), Some(&1));
}

#[tokio::test]
async fn run_fills_index_sizes_and_enrichment() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let report = ingest(&store, &config(&dir)).await;

    assert!(report.finished_at.is_some());
    assert_eq!(report.index_sizes.get(&EntityKind::Task), Some(&1));
    assert_eq!(report.index_sizes.get(&EntityKind::Dataset), Some(&3));
    assert_eq!(report.index_sizes.get(&EntityKind::Model), Some(&2));
    assert_eq!(report.index_sizes.get(&EntityKind::Pipeline), Some(&2));
    assert_eq!(report.enrichment.task_taxonomy, 0);
    assert_eq!(report.enrichment.dataset_modality, 3);

    let mnist = store
        .nodes(EntityKind::Dataset, None)
        .await
        .unwrap()
        .into_iter()
        .find(|d| d.name() == "MNIST")
        .unwrap();
    assert_eq!(mnist.property("modality"), Some("image"));
}

// ---------------------------------------------------------------------------
// Idempotency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rerun_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let cfg = config(&dir);
    let first = ingest(&store, &cfg).await;

    let mut nodes = Vec::new();
    for kind in EntityKind::ALL {
        nodes.push(store.node_count(kind).await);
    }
    let mut links = Vec::new();
    for rel in RelationshipType::ALL {
        links.push(store.link_count(rel).await);
    }

    let second = ingest(&store, &cfg).await;
    for (kind, before) in EntityKind::ALL.into_iter().zip(&nodes) {
        assert_eq!(store.node_count(kind).await, *before, "{kind}");
    }
    for (rel, before) in RelationshipType::ALL.into_iter().zip(&links) {
        assert_eq!(store.link_count(rel).await, *before, "{rel}");
    }
    assert_eq!(first.sources, second.sources);
    assert_eq!(first.index_sizes, second.index_sizes);
    assert_ne!(first.run_id, second.run_id);
}

// ---------------------------------------------------------------------------
// Assembly alone
// ---------------------------------------------------------------------------

#[test]
fn dangling_references_are_dropped_from_relationship_files() {
    let dir = TempDir::new().unwrap();
    let dump: SourceDump = serde_json::from_value(json!({
        "source": "papers",
        "models": [
            {
                "src_id": "bert",
                "name": "BERT",
                "datasets": ["squad"],
                "reports": ["missing-paper"]
            }
        ],
        "datasets": [{ "src_id": "squad", "name": "SQuAD" }],
        "metrics": [
            { "model": "bert", "dataset": "squad", "name": "f1", "value": "93.2" },
            { "model": "gpt", "dataset": "squad", "name": "f1", "value": "80.1" }
        ]
    }))
    .unwrap();

    let assembler = GraphAssembler::new(Classifier::default(), dir.path());
    let report = assembler.assemble(&dump).unwrap();
    assert_eq!(report.missed.get(&RelationshipType::HasReport), Some(&1));
    assert_eq!(report.missed.get(&RelationshipType::HasMetric), Some(&1));
    assert_eq!(report.resolved.get(&RelationshipType::HasMetric), Some(&1));
    assert_eq!(report.resolved.get(&RelationshipType::UsesDataset), Some(&1));
    assert_eq!(report.nodes.get(&EntityKind::Metric), Some(&2));

    let layout = assembler.layout("papers");
    let metric_links = read_relationships(&layout.relationships(RelationshipType::HasMetric)).unwrap();
    assert_eq!(metric_links.len(), 1);
    assert!(read_relationships(&layout.relationships(RelationshipType::HasReport))
        .unwrap()
        .is_empty());
}

#[test]
fn alias_source_ids_of_one_name_resolve() {
    let dir = TempDir::new().unwrap();
    let dump: SourceDump = serde_json::from_value(json!({
        "source": "mirror",
        "datasets": [
            { "src_id": "imagenet", "name": "ImageNet" },
            { "src_id": "ILSVRC/imagenet", "name": "ImageNet" }
        ],
        "models": [
            { "src_id": "vit-a", "name": "ViT", "datasets": ["ILSVRC/imagenet"] },
            { "src_id": "vit-b", "name": "ViT", "datasets": ["ILSVRC/imagenet"] }
        ],
        "metrics": [
            { "model": "vit-b", "dataset": "ILSVRC/imagenet", "name": "top-1", "value": "88.5" }
        ]
    }))
    .unwrap();

    let assembler = GraphAssembler::new(Classifier::default(), dir.path());
    let report = assembler.assemble(&dump).unwrap();
    // Both model records collapse onto one ViT artifact; the second record's
    // run key is what the metric names.
    assert_eq!(report.nodes.get(&EntityKind::Dataset), Some(&1));
    assert_eq!(report.nodes.get(&EntityKind::Artifact), Some(&1));
    assert_eq!(report.total_missed(), 0, "{:?}", report.missed);
    assert_eq!(report.resolved.get(&RelationshipType::UsesDataset), Some(&1));
    assert_eq!(report.resolved.get(&RelationshipType::HasMetric), Some(&1));
}

#[test]
fn assembling_twice_writes_identical_files() {
    let dir = TempDir::new().unwrap();
    let assembler = GraphAssembler::new(Classifier::default(), dir.path());
    let dump = common::hub_dump();

    assembler.assemble(&dump).unwrap();
    let layout = assembler.layout("hub");
    let first = std::fs::read(layout.node_table(EntityKind::Execution)).unwrap();
    let links = std::fs::read(layout.relationships(RelationshipType::UsesDataset)).unwrap();

    assembler.assemble(&dump).unwrap();
    assert_eq!(std::fs::read(layout.node_table(EntityKind::Execution)).unwrap(), first);
    assert_eq!(
        std::fs::read(layout.relationships(RelationshipType::UsesDataset)).unwrap(),
        links
    );
}
