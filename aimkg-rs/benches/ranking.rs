use std::collections::BTreeMap;

use aimkg_rs::driver::StoredNode;
use aimkg_rs::embedder::{EmbedderClient, HashEmbedder};
use aimkg_rs::ids::item_id;
use aimkg_rs::index::EmbeddingIndex;
use aimkg_rs::nodes::EntityKind;
use aimkg_rs::search::SimilarityRanker;
use aimkg_rs::utils::cosine_similarity;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const DIM: usize = 128;

fn corpus(kind: EntityKind, n: usize) -> (EmbeddingIndex, Vec<StoredNode>) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let embedder = HashEmbedder::new(DIM);
    let names: Vec<String> = (0..n).map(|i| format!("task variant {i} segmentation")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let vectors = runtime.block_on(embedder.embed_batch(&refs)).unwrap();
    let ids: Vec<_> = names.iter().map(|name| item_id(name)).collect();
    let nodes = names
        .iter()
        .zip(&ids)
        .enumerate()
        .map(|(i, (name, id))| StoredNode {
            id: format!("bench:{i}"),
            kind,
            properties: BTreeMap::from([
                ("itemID".to_string(), id.to_string()),
                ("name".to_string(), name.clone()),
                ("modality".to_string(), "image".to_string()),
                ("category".to_string(), "segmentation".to_string()),
            ]),
        })
        .collect();
    let index = EmbeddingIndex::new(kind, DIM, ids, vectors).unwrap();
    (index, nodes)
}

fn ranking_benchmarks(c: &mut Criterion) {
    let ranker = SimilarityRanker::default();
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let query_vec = runtime
        .block_on(HashEmbedder::new(DIM).embed("semantic segmentation"))
        .unwrap();

    let mut group = c.benchmark_group("rank_tasks");
    for n in [1_000usize, 10_000] {
        let (index, nodes) = corpus(EntityKind::Task, n);
        let query = ranker.profile("semantic segmentation", query_vec.clone());
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| ranker.rank(black_box(&query), &index, &nodes, 3).unwrap())
        });
    }
    group.finish();

    let a = vec![0.5_f32; DIM];
    let b = vec![0.25_f32; DIM];
    c.bench_function("cosine_similarity", |bench| {
        bench.iter(|| cosine_similarity(black_box(&a), black_box(&b)))
    });
}

criterion_group!(benches, ranking_benchmarks);
criterion_main!(benches);
