//! Deterministic offline embedder.
//!
//! Hashes boundary-marked character trigrams of the token-joined text into a
//! fixed number of signed buckets (FNV-1a, sign from the top bit), then
//! L2-normalizes. Spacing and hyphenation do not change the vector, so
//! `"image net"` and `"ImageNet"` encode identically.

use crate::embedder::{Embedding, EmbedderClient};
use crate::errors::Result;
use crate::utils::{normalize_l2, tokenize};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |h, b| (h ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

pub struct HashEmbedder {
    dim: usize,
    model: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            model: format!("hash-trigram-{dim}"),
        }
    }

    fn encode(&self, text: &str) -> Embedding {
        let mut v = vec![0.0_f32; self.dim];
        if self.dim == 0 {
            return v;
        }
        let joined: String = tokenize(text).concat();
        if joined.is_empty() {
            return v;
        }
        let chars: Vec<char> = std::iter::once('^')
            .chain(joined.chars())
            .chain(std::iter::once('$'))
            .collect();
        let mut buf = String::with_capacity(12);
        for gram in chars.windows(3) {
            buf.clear();
            buf.extend(gram);
            let h = fnv1a(buf.as_bytes());
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            v[(h % self.dim as u64) as usize] += sign;
        }
        normalize_l2(&v)
    }
}

impl EmbedderClient for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(self.encode(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|t| self.encode(t)).collect())
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn model(&self) -> &str {
        &self.model
    }
}
