//! Read side of the embedding indices: loaded files cached per entity type.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::errors::Result;
use crate::index::EmbeddingIndex;
use crate::nodes::EntityKind;

pub struct IndexCatalog {
    dir: PathBuf,
    cache: Cache<EntityKind, Arc<EmbeddingIndex>>,
}

impl IndexCatalog {
    /// Loaded indices are re-read after `ttl`, which bounds how long a rebuild
    /// by another process goes unnoticed.
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            cache: Cache::builder()
                .max_capacity(EntityKind::ALL.len() as u64)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The index for `kind`, loading it on first use.
    ///
    /// Fails with [`crate::AimkgError::IndexNotBuilt`] when no file exists;
    /// failures are not cached.
    pub async fn get(&self, kind: EntityKind) -> Result<Arc<EmbeddingIndex>> {
        if let Some(index) = self.cache.get(&kind).await {
            debug!(kind = %kind, "index cache hit");
            return Ok(index);
        }
        let index = Arc::new(EmbeddingIndex::load(&self.dir, kind).await?);
        self.cache.insert(kind, Arc::clone(&index)).await;
        Ok(index)
    }

    /// Drop the cached copy so the next [`get`](Self::get) re-reads the file.
    pub async fn invalidate(&self, kind: EntityKind) {
        self.cache.invalidate(&kind).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AimkgError;
    use crate::ids::item_id;

    fn index(n: usize) -> EmbeddingIndex {
        let ids = (0..n).map(|i| item_id(&format!("task:{i}"))).collect();
        EmbeddingIndex::new(EntityKind::Task, 2, ids, vec![vec![1.0, 0.0]; n]).unwrap()
    }

    #[tokio::test]
    async fn missing_index_is_not_ready_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = IndexCatalog::new(dir.path(), Duration::from_secs(60));
        let err = catalog.get(EntityKind::Task).await.unwrap_err();
        assert!(matches!(err, AimkgError::IndexNotBuilt(EntityKind::Task)));

        index(1).save(dir.path()).await.unwrap();
        assert_eq!(catalog.get(EntityKind::Task).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalidate_picks_up_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = IndexCatalog::new(dir.path(), Duration::from_secs(60));
        index(1).save(dir.path()).await.unwrap();
        assert_eq!(catalog.get(EntityKind::Task).await.unwrap().len(), 1);

        index(2).save(dir.path()).await.unwrap();
        assert_eq!(catalog.get(EntityKind::Task).await.unwrap().len(), 1);
        catalog.invalidate(EntityKind::Task).await;
        assert_eq!(catalog.get(EntityKind::Task).await.unwrap().len(), 2);
    }
}
