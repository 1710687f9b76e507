//! Deterministic feature-hashing embedder.
//!
//! Hashes lowercase words and bigrams into a fixed-size vector and
//! L2-normalises it. No network access; texts sharing vocabulary score
//! higher, which is enough for offline runs and tests.

use async_trait::async_trait;

use super::Embedder;
use crate::error::EmbeddingError;

/// Default vector dimensionality.
const DEFAULT_DIMENSIONS: usize = 384;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a. Fixed across releases, so persisted vectors stay valid.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Feature-hashing embedder.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl HashEmbedder {
    /// Creates an embedder producing `dimensions`-length vectors.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Embeds one text synchronously.
    #[must_use]
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let normalized = text.to_lowercase();
        let words: Vec<&str> = normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let mut embedding = vec![0.0_f32; self.dimensions];
        for word in &words {
            embedding[self.bucket(word)] += 1.0;
        }
        for pair in words.windows(2) {
            embedding[self.bucket(&format!("{} {}", pair[0], pair[1]))] += 0.5;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }
        embedding
    }

    #[allow(clippy::cast_possible_truncation)]
    fn bucket(&self, feature: &str) -> usize {
        (fnv1a(feature.as_bytes()) % self.dimensions as u64) as usize
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash"
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
