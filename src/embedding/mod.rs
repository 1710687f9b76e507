//! Embedding backends.
//!
//! All semantic similarity in the crate (node retrieval, tool retrieval)
//! goes through the [`Embedder`] trait. Backends:
//!
//! - `openai`: remote embeddings via `async-openai` (default)
//! - `fastembed`: local ONNX embeddings (feature `fastembed-embeddings`)
//! - `hash`: deterministic feature hashing, offline and test use

mod hash;
mod openai;
#[cfg(feature = "fastembed-embeddings")]
mod fastembed;

pub use hash::HashEmbedder;
pub use openai::OpenAiEmbedder;
#[cfg(feature = "fastembed-embeddings")]
pub use self::fastembed::FastEmbedder;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::RagConfig;
use crate::error::EmbeddingError;

/// Trait for embedding backends.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier recorded alongside persisted vectors.
    fn model_name(&self) -> &str;

    /// Embeds a batch of texts, returning one vector per input in order.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError`] on backend failures or count mismatches.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embeds a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            actual: 0,
        })
    }
}

/// Creates an [`Embedder`] based on the configured backend name.
///
/// # Errors
///
/// Returns [`EmbeddingError::UnsupportedBackend`] for unknown names or for
/// `fastembed` when the feature is not compiled in.
pub fn create_embedder(config: &RagConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    match config.embedding_backend.as_str() {
        "openai" => Ok(Arc::new(OpenAiEmbedder::new(config))),
        "hash" => Ok(Arc::new(HashEmbedder::default())),
        #[cfg(feature = "fastembed-embeddings")]
        "fastembed" => Ok(Arc::new(FastEmbedder::new()?)),
        other => Err(EmbeddingError::UnsupportedBackend {
            name: other.to_string(),
        }),
    }
}

/// Embeds `texts` in batches of `batch_size`.
pub async fn embed_all(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size.max(1)) {
        let embedded = embedder.embed_batch(batch).await?;
        if embedded.len() != batch.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: batch.len(),
                actual: embedded.len(),
            });
        }
        vectors.extend(embedded);
    }
    Ok(vectors)
}

/// Cosine similarity of two vectors; 0.0 when either has zero norm.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
