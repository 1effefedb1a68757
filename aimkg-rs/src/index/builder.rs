//! Embedding Index Builder.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::driver::GraphStore;
use crate::embedder::EmbedderClient;
use crate::errors::Result;
use crate::index::EmbeddingIndex;
use crate::nodes::EntityKind;

const DEFAULT_BATCH: usize = 64;

/// Encodes every node name of a type and writes the type's index file.
pub struct IndexBuilder<'a, S, E> {
    store: &'a S,
    embedder: &'a E,
    index_dir: PathBuf,
    batch_size: usize,
}

impl<'a, S: GraphStore, E: EmbedderClient> IndexBuilder<'a, S, E> {
    pub fn new(store: &'a S, embedder: &'a E, index_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            embedder,
            index_dir: index_dir.into(),
            batch_size: DEFAULT_BATCH,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Rebuild the index for `kind` from the live node set, in store order.
    pub async fn build(&self, kind: EntityKind) -> Result<EmbeddingIndex> {
        let nodes = self.store.nodes(kind, None).await?;
        let mut seen = HashSet::with_capacity(nodes.len());
        let mut ids = Vec::with_capacity(nodes.len());
        let mut names = Vec::with_capacity(nodes.len());
        let mut skipped = 0usize;
        for node in &nodes {
            match node.item_id() {
                Some(id) if seen.insert(id) => {
                    ids.push(id);
                    names.push(node.name());
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(kind = %kind, skipped, "nodes without a usable itemID left out of index");
        }

        let mut vectors = Vec::with_capacity(names.len());
        for chunk in names.chunks(self.batch_size) {
            vectors.extend(self.embedder.embed_batch(chunk).await?);
        }

        let index = EmbeddingIndex::new(kind, self.embedder.dim(), ids, vectors)?;
        let path = index.save(&self.index_dir).await?;
        info!(
            kind = %kind,
            entries = index.len(),
            dim = index.dim(),
            model = self.embedder.model(),
            path = %path.display(),
            "embedding index built"
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MemoryStore;
    use crate::embedder::HashEmbedder;
    use crate::errors::AimkgError;
    use crate::nodes::{DatasetNode, GraphNode};
    use crate::taxonomy::{CategorySet, ModalitySet};

    fn dataset(name: &str) -> crate::nodes::NodeRow {
        DatasetNode::new(
            name,
            "test",
            &name.to_lowercase(),
            ModalitySet::new(),
            CategorySet::default(),
            None,
            None,
        )
        .to_row()
    }

    #[tokio::test]
    async fn builds_one_entry_per_node_in_store_order() {
        let store = MemoryStore::new();
        let rows = vec![dataset("ImageNet"), dataset("COCO"), dataset("CIFAR-10")];
        store.write_nodes(EntityKind::Dataset, &rows).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let embedder = HashEmbedder::new(32);
        let index = IndexBuilder::new(&store, &embedder, dir.path())
            .with_batch_size(2)
            .build(EntityKind::Dataset)
            .await
            .unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.dim(), 32);
        let expected: Vec<_> = rows.iter().map(|r| r.item_id().unwrap()).collect();
        assert_eq!(index.ids(), expected.as_slice());

        let loaded = EmbeddingIndex::load(dir.path(), EntityKind::Dataset).await.unwrap();
        assert_eq!(loaded, index);
    }

    #[tokio::test]
    async fn empty_type_writes_empty_index() {
        let store = MemoryStore::new();
        let dir = tempfile::tempdir().unwrap();
        let embedder = HashEmbedder::new(8);
        let index = IndexBuilder::new(&store, &embedder, dir.path())
            .build(EntityKind::Pipeline)
            .await
            .unwrap();
        assert!(index.is_empty());
        assert!(EmbeddingIndex::load(dir.path(), EntityKind::Pipeline).await.is_ok());
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let dir = tempfile::tempdir().unwrap();
        let embedder = HashEmbedder::new(8);
        let err = IndexBuilder::new(&store, &embedder, dir.path())
            .build(EntityKind::Task)
            .await
            .unwrap_err();
        assert!(matches!(err, AimkgError::Store(_)));
    }
}
