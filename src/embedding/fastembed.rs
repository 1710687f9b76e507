//! Local embeddings via `fastembed` (ONNX runtime).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::Embedder;
use crate::error::EmbeddingError;

/// Local BGE-small embedder. Inference runs on the blocking pool.
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
}

impl FastEmbedder {
    /// Loads the model, downloading it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::Request`] if the model cannot be loaded.
    pub fn new() -> Result<Self, EmbeddingError> {
        let model = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::BGESmallENV15))
            .map_err(|e| EmbeddingError::Request {
                message: format!("fastembed model load failed: {e}"),
            })?;
        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    fn model_name(&self) -> &str {
        "BAAI/bge-small-en-v1.5"
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut guard = model.lock().map_err(|e| EmbeddingError::Request {
                message: format!("fastembed lock poisoned: {e}"),
            })?;
            guard
                .embed(texts, None)
                .map_err(|e| EmbeddingError::Request {
                    message: e.to_string(),
                })
        })
        .await
        .map_err(|e| EmbeddingError::Request {
            message: format!("embedding task failed: {e}"),
        })?
    }
}
