//! Per-entity-type embedding indices.
//!
//! An index is two parallel arrays, `ids[i]` ↔ `vectors[i]`, for one entity
//! type, stored as a bincode file `{index_dir}/{kind}_embeddings.bin` and
//! always replaced wholesale.

pub mod builder;
pub mod catalog;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::embedder::Embedding;
use crate::errors::{AimkgError, Result};
use crate::ids::ItemId;
use crate::nodes::EntityKind;

pub use builder::IndexBuilder;
pub use catalog::IndexCatalog;

/// Bumped whenever [`IndexFile`]'s layout changes.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    format_version: u32,
    kind: EntityKind,
    dim: usize,
    ids: Vec<ItemId>,
    vectors: Vec<Embedding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingIndex {
    kind: EntityKind,
    dim: usize,
    ids: Vec<ItemId>,
    vectors: Vec<Embedding>,
}

impl EmbeddingIndex {
    /// Build an index from parallel arrays. Every vector must be `dim` long.
    pub fn new(
        kind: EntityKind,
        dim: usize,
        ids: Vec<ItemId>,
        vectors: Vec<Embedding>,
    ) -> Result<Self> {
        if ids.len() != vectors.len() {
            return Err(AimkgError::Index(format!(
                "{kind} index has {} ids but {} vectors",
                ids.len(),
                vectors.len()
            )));
        }
        if let Some(pos) = vectors.iter().position(|v| v.len() != dim) {
            return Err(AimkgError::Index(format!(
                "{kind} index entry {pos} has {} dimensions, expected {dim}",
                vectors[pos].len()
            )));
        }
        Ok(Self {
            kind,
            dim,
            ids,
            vectors,
        })
    }

    pub fn path_for(dir: &Path, kind: EntityKind) -> PathBuf {
        dir.join(format!("{}_embeddings.bin", kind.key_prefix()))
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    /// Entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &[f32])> + '_ {
        self.ids
            .iter()
            .copied()
            .zip(self.vectors.iter().map(Vec::as_slice))
    }

    /// Write the index, replacing any previous file for the same type.
    ///
    /// The bytes go to a temporary sibling first, then are renamed into place.
    pub async fn save(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = Self::path_for(dir, self.kind);
        let file = IndexFile {
            format_version: FORMAT_VERSION,
            kind: self.kind,
            dim: self.dim,
            ids: self.ids.clone(),
            vectors: self.vectors.clone(),
        };
        let bytes = bincode::serialize(&file)
            .map_err(|e| AimkgError::Index(format!("cannot encode {} index: {e}", self.kind)))?;
        let tmp = path.with_extension("bin.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(path)
    }

    /// Read the index for `kind`. A missing file is [`AimkgError::IndexNotBuilt`].
    pub async fn load(dir: &Path, kind: EntityKind) -> Result<Self> {
        let path = Self::path_for(dir, kind);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AimkgError::IndexNotBuilt(kind));
            }
            Err(e) => return Err(e.into()),
        };
        let file: IndexFile = bincode::deserialize(&bytes).map_err(|e| {
            AimkgError::Index(format!("cannot decode {}: {e}", path.display()))
        })?;
        if file.format_version != FORMAT_VERSION {
            return Err(AimkgError::Index(format!(
                "{} has format version {}, expected {FORMAT_VERSION}",
                path.display(),
                file.format_version
            )));
        }
        if file.kind != kind {
            return Err(AimkgError::Index(format!(
                "{} holds a {} index",
                path.display(),
                file.kind
            )));
        }
        Self::new(file.kind, file.dim, file.ids, file.vectors)
    }
}
