//! Fixtures shared by the integration suites.

#![allow(dead_code)]

use aimkg_rs::driver::MemoryStore;
use aimkg_rs::embedder::HashEmbedder;
use aimkg_rs::pipeline::{Ingestion, IngestReport};
use aimkg_rs::source::SourceDump;
use aimkg_rs::types::EmbeddingBackend;
use aimkg_rs::AimkgConfig;
use serde_json::json;
use tempfile::TempDir;

pub const DIM: usize = 64;

pub fn config(dir: &TempDir) -> AimkgConfig {
    AimkgConfig {
        embedding_backend: EmbeddingBackend::Hash,
        embedding_dim: DIM,
        index_dir: dir.path().join("embeddings"),
        kg_data_dir: dir.path().join("kg-data"),
        ..AimkgConfig::default()
    }
}

/// A model hub: one task, three datasets, one model evaluated on all of them.
pub fn hub_dump() -> SourceDump {
    serde_json::from_value(json!({
        "source": "hub",
        "tasks": [
            { "src_id": "image-classification", "description": "Assign a label to an image" }
        ],
        "datasets": [
            {
                "src_id": "imagenet",
                "name": "ImageNet",
                "description": "Large visual database",
                "url": "https://image-net.org"
            },
            { "src_id": "cifar10", "name": "Cifar10", "description": "Tiny images" },
            { "src_id": "mnist", "name": "MNIST", "description": "Handwritten digits" }
        ],
        "models": [
            {
                "src_id": "google/vit",
                "name": "ViT",
                "description": "Vision transformer",
                "task": "image-classification",
                "datasets": ["imagenet", "cifar10", "mnist", "imagenet"],
                "tags": ["pytorch", "vision"],
                "reports": ["vit-paper"]
            }
        ],
        "metrics": [
            { "model": "google/vit", "dataset": "imagenet", "name": "top-1", "value": "88.5" }
        ],
        "reports": [
            {
                "src_id": "vit-paper",
                "title": "An Image is Worth 16x16 Words",
                "abstract": "Transformers, applied to image patches",
                "url": "https://arxiv.org/abs/2010.11929"
            }
        ]
    }))
    .unwrap()
}

/// A leaderboard naming the same dataset differently, and a model whose task
/// and datasets it never lists.
pub fn board_dump() -> SourceDump {
    serde_json::from_value(json!({
        "source": "board",
        "datasets": [
            { "src_id": "ImageNet-1k", "name": "imagenet", "description": "ILSVRC subset" }
        ],
        "models": [
            {
                "src_id": "resnet-50",
                "name": "ResNet-50",
                "task": "image-classification"
            }
        ]
    }))
    .unwrap()
}

pub async fn ingest(store: &MemoryStore, config: &AimkgConfig) -> IngestReport {
    let embedder = HashEmbedder::new(DIM);
    Ingestion::new(store, &embedder, config)
        .run(&[hub_dump(), board_dump()])
        .await
        .unwrap()
}
