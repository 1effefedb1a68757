//! Embedder client abstraction.
//!
//! Provides a trait for generating fixed-dimension vector embeddings from
//! text, with three implementations:
//!
//! - [`OpenAiEmbedder`]: any OpenAI-compatible `/embeddings` endpoint hosting
//!   the pretrained sentence model.
//! - [`HashEmbedder`]: deterministic, offline character-trigram hashing.
//! - [`CachedEmbedder`]: wraps another client and memoizes single-text
//!   encodings (query strings repeat a lot).
//!
//! [`AnyEmbedder`] picks one of the first two from configuration.

pub mod cached;
pub mod hashing;
pub mod openai;

use crate::errors::Result;
use crate::types::{AimkgConfig, EmbeddingBackend};

pub use cached::{CacheConfig, CachedEmbedder};
pub use hashing::HashEmbedder;
pub use openai::OpenAiEmbedder;

/// A vector embedding (f32 components).
pub type Embedding = Vec<f32>;

/// Trait for text-to-vector embedding clients.
#[allow(async_fn_in_trait)]
pub trait EmbedderClient: Send + Sync {
    /// Generate an embedding for a single text string.
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Generate embeddings for a batch of texts, one per input, in order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Returns the dimensionality of embeddings produced by this client.
    fn dim(&self) -> usize;

    /// Identifies the encoding; vectors from different models never mix.
    fn model(&self) -> &str;
}

/// Embedder selected by [`AimkgConfig::embedding_backend`].
pub enum AnyEmbedder {
    OpenAi(OpenAiEmbedder),
    Hash(HashEmbedder),
}

impl AnyEmbedder {
    pub fn from_config(config: &AimkgConfig) -> Self {
        match config.embedding_backend {
            EmbeddingBackend::OpenAi => AnyEmbedder::OpenAi(OpenAiEmbedder::new(
                config.embedding_api_base.clone(),
                config.embedding_api_key.clone(),
                config.embedding_model.clone(),
                config.embedding_dim,
            )),
            EmbeddingBackend::Hash => AnyEmbedder::Hash(HashEmbedder::new(config.embedding_dim)),
        }
    }
}

impl EmbedderClient for AnyEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        match self {
            AnyEmbedder::OpenAi(e) => e.embed(text).await,
            AnyEmbedder::Hash(e) => e.embed(text).await,
        }
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        match self {
            AnyEmbedder::OpenAi(e) => e.embed_batch(texts).await,
            AnyEmbedder::Hash(e) => e.embed_batch(texts).await,
        }
    }

    fn dim(&self) -> usize {
        match self {
            AnyEmbedder::OpenAi(e) => e.dim(),
            AnyEmbedder::Hash(e) => e.dim(),
        }
    }

    fn model(&self) -> &str {
        match self {
            AnyEmbedder::OpenAi(e) => e.model(),
            AnyEmbedder::Hash(e) => e.model(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_backend_from_config() {
        let config = AimkgConfig {
            embedding_backend: EmbeddingBackend::Hash,
            embedding_dim: 64,
            ..AimkgConfig::default()
        };
        let embedder = AnyEmbedder::from_config(&config);
        assert!(matches!(embedder, AnyEmbedder::Hash(_)));
        assert_eq!(embedder.dim(), 64);
        assert_eq!(embedder.embed("imagenet").await.unwrap().len(), 64);
    }

    #[test]
    fn openai_backend_keeps_configured_model() {
        let embedder = AnyEmbedder::from_config(&AimkgConfig::default());
        assert_eq!(embedder.model(), "all-mpnet-base-v2");
        assert_eq!(embedder.dim(), 768);
    }
}
