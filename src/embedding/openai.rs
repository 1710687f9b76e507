//! `OpenAI` embeddings via `async-openai`.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::CreateEmbeddingRequestArgs;
use async_trait::async_trait;
use tracing::debug;

use super::Embedder;
use crate::config::RagConfig;
use crate::error::EmbeddingError;

/// `OpenAI`-compatible embedding backend.
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbedder {
    /// Creates a new embedder from configuration.
    #[must_use]
    pub fn new(config: &RagConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);

        if let Some(ref base_url) = config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        Self {
            client: Client::with_config(openai_config),
            model: config.embed_model.clone(),
        }
    }
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("client", &"<async-openai::Client>")
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(texts.to_vec())
            .build()
            .map_err(|e| EmbeddingError::Request {
                message: e.to_string(),
            })?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| EmbeddingError::Request {
                message: e.to_string(),
            })?;

        debug!(
            model = %self.model,
            inputs = texts.len(),
            prompt_tokens = response.usage.prompt_tokens,
            "embedding batch complete"
        );

        let mut data = response.data;
        if data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: data.len(),
            });
        }
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}
