//! Memoizing wrapper for query encodings.
//!
//! Single-text encodings go through a `moka` cache keyed by
//! `md5(model + text)`; batch encodings (index builds) pass straight through.

use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::embedder::{Embedding, EmbedderClient};
use crate::errors::Result;

// ── Cache configuration ───────────────────────────────────────────────────────

/// Configuration for the in-process encoding cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries held in memory.
    pub max_capacity: u64,
    /// How long each entry lives before eviction.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Duration::from_secs(3_600), // 1 hour
        }
    }
}

// ── Wrapper ───────────────────────────────────────────────────────────────────

pub struct CachedEmbedder<E> {
    inner: E,
    cache: Cache<String, Embedding>,
}

impl<E: EmbedderClient> CachedEmbedder<E> {
    pub fn new(inner: E, cache_config: CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(cache_config.max_capacity)
            .time_to_live(cache_config.ttl)
            .build();
        Self { inner, cache }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Compute an MD5 cache key from model + text.
    fn cache_key(&self, text: &str) -> String {
        use md5::{Digest, Md5};
        let mut h = Md5::new();
        h.update(self.inner.model().as_bytes());
        h.update([0u8]);
        h.update(text.as_bytes());
        format!("{:x}", h.finalize())
    }
}

impl<E: EmbedderClient> EmbedderClient for CachedEmbedder<E> {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let key = self.cache_key(text);
        if let Some(hit) = self.cache.get(&key).await {
            debug!("embedding cache hit");
            return Ok(hit);
        }
        let embedding = self.inner.embed(text).await?;
        self.cache.insert(key, embedding.clone()).await;
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        self.inner.embed_batch(texts).await
    }

    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AimkgError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls; fails on the text "boom".
    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    impl EmbedderClient for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Embedding> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text == "boom" {
                return Err(AimkgError::Embedder("boom".into()));
            }
            Ok(vec![text.len() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
            let mut out = Vec::new();
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }

        fn dim(&self) -> usize {
            2
        }

        fn model(&self) -> &str {
            "counting"
        }
    }

    fn cached() -> CachedEmbedder<CountingEmbedder> {
        CachedEmbedder::new(
            CountingEmbedder {
                calls: AtomicUsize::new(0),
            },
            CacheConfig::default(),
        )
    }

    #[tokio::test]
    async fn repeated_query_hits_cache() {
        let e = cached();
        let a = e.embed("image net").await.unwrap();
        let b = e.embed("image net").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(e.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let e = cached();
        assert!(e.embed("boom").await.is_err());
        assert!(e.embed("boom").await.is_err());
        assert_eq!(e.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn batches_bypass_cache() {
        let e = cached();
        e.embed_batch(&["a", "b"]).await.unwrap();
        e.embed_batch(&["a", "b"]).await.unwrap();
        assert_eq!(e.inner().calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn key_depends_on_model_and_text() {
        let e = cached();
        assert_ne!(e.cache_key("a"), e.cache_key("b"));
        assert_eq!(e.cache_key("a").len(), 32);
    }
}
