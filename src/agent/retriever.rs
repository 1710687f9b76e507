//! Object index over tools: retrieves the tools most relevant to a query.

use std::sync::Arc;

use tracing::debug;

use super::doc_tool::DocTool;
use crate::embedding::{Embedder, cosine_similarity, embed_all};
use crate::error::EmbeddingError;

/// Default number of tools retrieved per query.
pub const DEFAULT_TOOL_TOP_K: usize = 3;

/// Embeds every tool's name and description once and retrieves the `top_k`
/// most similar tools per query.
pub struct ToolRetriever {
    tools: Vec<Arc<DocTool>>,
    embeddings: Vec<Vec<f32>>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl std::fmt::Debug for ToolRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRetriever")
            .field("tools", &self.tools.len())
            .field("embed_model", &self.embedder.model_name())
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl ToolRetriever {
    /// Embeds `tools` into an in-memory index.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError`] if the backend fails.
    pub async fn build(
        tools: Vec<Arc<DocTool>>,
        embedder: Arc<dyn Embedder>,
        top_k: usize,
    ) -> Result<Self, EmbeddingError> {
        let texts: Vec<String> = tools.iter().map(|t| t.metadata().embedding_text()).collect();
        let embeddings = embed_all(embedder.as_ref(), &texts, texts.len().max(1)).await?;
        debug!(tools = tools.len(), top_k, "tool index built");
        Ok(Self {
            tools,
            embeddings,
            embedder,
            top_k,
        })
    }

    /// Number of indexed tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// The `min(top_k, len)` tools most similar to `query`, best first.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError`] if the query cannot be embedded.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Arc<DocTool>>, EmbeddingError> {
        let query_embedding = self.embedder.embed_query(query).await?;

        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(&query_embedding, e)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(self.top_k);

        let tools: Vec<Arc<DocTool>> = scored
            .into_iter()
            .map(|(i, _)| Arc::clone(&self.tools[i]))
            .collect();
        debug!(
            retrieved = ?tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            "tools retrieved"
        );
        Ok(tools)
    }
}
