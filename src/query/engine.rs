//! Query engines over a single document's indexes.

use std::sync::Arc;

use super::{ResponseMode, Synthesizer};
use crate::core::{Response, ScoredNode};
use crate::embedding::Embedder;
use crate::error::{AgentError, IndexError};
use crate::index::{MetadataFilters, SummaryIndex, VectorIndex};

/// Top-k vector retrieval followed by compact synthesis.
///
/// Cheap to construct; build one per query when filters vary.
#[derive(Clone)]
pub struct VectorQueryEngine {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    synthesizer: Synthesizer,
    similarity_top_k: usize,
    filters: Option<MetadataFilters>,
}

impl VectorQueryEngine {
    /// Creates an unfiltered engine.
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn Embedder>,
        synthesizer: Synthesizer,
        similarity_top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            synthesizer,
            similarity_top_k,
            filters: None,
        }
    }

    /// Restricts retrieval to nodes passing `filters`.
    #[must_use]
    pub fn with_filters(mut self, filters: Option<MetadataFilters>) -> Self {
        self.filters = filters;
        self
    }

    /// Retrieves the top-k nodes for `query`.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredNode>, IndexError> {
        self.index
            .retrieve(
                self.embedder.as_ref(),
                query,
                self.similarity_top_k,
                self.filters.as_ref(),
            )
            .await
    }

    /// Retrieves and synthesizes an answer.
    pub async fn query(&self, query: &str) -> Result<Response, AgentError> {
        let nodes = self.retrieve(query).await?;
        self.synthesizer
            .synthesize(query, nodes, ResponseMode::Compact)
            .await
    }
}

/// Tree summarization over every node of a document.
#[derive(Clone)]
pub struct SummaryQueryEngine {
    index: Arc<SummaryIndex>,
    synthesizer: Synthesizer,
}

impl SummaryQueryEngine {
    /// Creates the engine.
    pub const fn new(index: Arc<SummaryIndex>, synthesizer: Synthesizer) -> Self {
        Self { index, synthesizer }
    }

    /// Summarizes the document with respect to `query`.
    pub async fn query(&self, query: &str) -> Result<Response, AgentError> {
        self.synthesizer
            .synthesize(query, self.index.retrieve_all(), ResponseMode::TreeSummarize)
            .await
    }
}
