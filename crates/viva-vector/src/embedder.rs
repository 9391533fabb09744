//! Embedding generation.
//!
//! [`Embedder`] is the seam the retrieval pipeline depends on. The default
//! [`HashingEmbedder`] produces deterministic feature-hashed vectors with no
//! model download or network call, which keeps local runs and tests hermetic.
//! A learned-model implementation can be swapped in behind the same trait.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::errors::{Result, VectorError};
use crate::normalize::l2_normalize;

/// Produces embedding vectors for text.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Dimensionality of vectors this embedder produces.
    fn dimensions(&self) -> usize;

    /// Embed a piece of text into an L2-normalized vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Default vector dimensionality for the hashing embedder.
pub const DEFAULT_DIMENSIONS: usize = 256;

/// Deterministic feature-hashing embedder.
///
/// Each lowercased alphanumeric token is hashed with SHA-256; the hash picks
/// a bucket and a sign, and the accumulated vector is L2-normalized. Texts
/// sharing vocabulary land near each other, which is enough signal for
/// exemplar ranking without an inference runtime.
#[derive(Clone, Debug)]
pub struct HashingEmbedder {
    dims: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of the given dimensionality.
    #[must_use]
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }

    fn embed_sync(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0_f32; self.dims];
        let mut token_count = 0_usize;

        for token in tokenize(text) {
            token_count += 1;
            let digest = Sha256::digest(token.as_bytes());
            let hash = u64::from_le_bytes(
                digest[..8].try_into().map_err(|_| {
                    VectorError::Embedding("short digest".into())
                })?,
            );
            #[allow(clippy::cast_possible_truncation)]
            let bucket = (hash % self.dims as u64) as usize;
            let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }

        if token_count == 0 {
            return Err(VectorError::Embedding("no tokens in input".into()));
        }
        l2_normalize(&mut v);
        Ok(v)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_sync(text)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}
