//! Builds the vector and summary tools for a document.

use std::sync::Arc;

use super::doc_tool::{DocTool, SummaryTool, VectorTool};
use super::tool::{ToolKind, ToolMetadata};
use crate::core::Document;
use crate::error::IndexError;
use crate::index::{IndexCache, SummaryIndex, VectorIndex};
use crate::query::{SummaryQueryEngine, Synthesizer};

/// Description of the vector tool for document `name`.
#[must_use]
pub fn vector_tool_description(name: &str) -> String {
    format!(
        "Useful for retrieving specific context from the {name} paper. \
         Use to answer questions over a given paper. \
         Useful if you have specific questions over the paper. \
         Always leave page_numbers empty UNLESS there is a specific page you want to search for."
    )
}

/// Description of the summary tool for document `name`.
#[must_use]
pub fn summary_tool_description(name: &str) -> String {
    format!("Useful for summarization questions related to {name}")
}

/// Wraps a document's cached indexes into tools.
#[derive(Debug, Clone)]
pub struct ToolFactory {
    cache: IndexCache,
    synthesizer: Synthesizer,
    similarity_top_k: usize,
}

impl ToolFactory {
    /// Creates a factory.
    pub const fn new(cache: IndexCache, synthesizer: Synthesizer, similarity_top_k: usize) -> Self {
        Self {
            cache,
            synthesizer,
            similarity_top_k,
        }
    }

    /// Loads (or builds) the document's indexes and returns
    /// `(vector_tool_{name}, summary_tool_{name})`.
    pub async fn doc_tools(
        &self,
        document: &Document,
        name: &str,
    ) -> Result<(Arc<DocTool>, Arc<DocTool>), IndexError> {
        let (vector, summary) = self.cache.load_document_indexes(document).await?;
        Ok(self.from_indexes(name, vector, summary))
    }

    /// Builds both tools from already-loaded indexes.
    #[must_use]
    pub fn from_indexes(
        &self,
        name: &str,
        vector: Arc<VectorIndex>,
        summary: Arc<SummaryIndex>,
    ) -> (Arc<DocTool>, Arc<DocTool>) {
        let vector_tool = DocTool::Vector(VectorTool::new(
            ToolMetadata {
                name: format!("vector_tool_{name}"),
                description: vector_tool_description(name),
                kind: ToolKind::Vector,
                document: name.to_string(),
            },
            vector,
            Arc::clone(self.cache.embedder()),
            self.synthesizer.clone(),
            self.similarity_top_k,
        ));

        let summary_tool = DocTool::Summary(SummaryTool::new(
            ToolMetadata {
                name: format!("summary_tool_{name}"),
                description: summary_tool_description(name),
                kind: ToolKind::Summary,
                document: name.to_string(),
            },
            SummaryQueryEngine::new(summary, self.synthesizer.clone()),
        ));

        (Arc::new(vector_tool), Arc::new(summary_tool))
    }
}
