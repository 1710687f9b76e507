//! Per-document tools: vector retrieval and summarization.

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::tool::{ToolDefinition, ToolKind, ToolMetadata, ToolOutput};
use crate::core::Response;
use crate::embedding::Embedder;
use crate::error::AgentError;
use crate::index::{MetadataFilters, VectorIndex};
use crate::query::{SummaryQueryEngine, Synthesizer, VectorQueryEngine};

/// Arguments of a vector tool call.
#[derive(Debug, Deserialize)]
struct VectorArgs {
    query: String,
    #[serde(default)]
    page_numbers: Option<Vec<String>>,
}

/// Arguments of a summary tool call.
#[derive(Debug, Deserialize)]
struct SummaryArgs {
    input: String,
}

/// Top-k retrieval over one document, optionally restricted to pages.
#[derive(Clone)]
pub struct VectorTool {
    metadata: ToolMetadata,
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    synthesizer: Synthesizer,
    similarity_top_k: usize,
}

impl VectorTool {
    /// Creates the tool.
    pub fn new(
        metadata: ToolMetadata,
        index: Arc<VectorIndex>,
        embedder: Arc<dyn Embedder>,
        synthesizer: Synthesizer,
        similarity_top_k: usize,
    ) -> Self {
        Self {
            metadata,
            index,
            embedder,
            synthesizer,
            similarity_top_k,
        }
    }

    /// Answers `query` from the top-k nodes, restricted to `page_numbers`
    /// when non-empty.
    pub async fn query(&self, query: &str, page_numbers: &[String]) -> Result<Response, AgentError> {
        VectorQueryEngine::new(
            Arc::clone(&self.index),
            Arc::clone(&self.embedder),
            self.synthesizer.clone(),
            self.similarity_top_k,
        )
        .with_filters(MetadataFilters::page_numbers(page_numbers))
        .query(query)
        .await
    }
}

/// Tree summarization over one document.
#[derive(Clone)]
pub struct SummaryTool {
    metadata: ToolMetadata,
    engine: SummaryQueryEngine,
}

impl SummaryTool {
    /// Creates the tool.
    pub const fn new(metadata: ToolMetadata, engine: SummaryQueryEngine) -> Self {
        Self { metadata, engine }
    }
}

/// A document tool, either kind.
#[derive(Clone)]
pub enum DocTool {
    /// Vector retrieval tool.
    Vector(VectorTool),
    /// Summary tool.
    Summary(SummaryTool),
}

impl std::fmt::Debug for DocTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DocTool").field(self.metadata()).finish()
    }
}

impl DocTool {
    /// Name, description and kind.
    #[must_use]
    pub const fn metadata(&self) -> &ToolMetadata {
        match self {
            Self::Vector(tool) => &tool.metadata,
            Self::Summary(tool) => &tool.metadata,
        }
    }

    /// Tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Tool kind.
    #[must_use]
    pub const fn kind(&self) -> ToolKind {
        self.metadata().kind
    }

    /// Function-calling definition.
    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        self.metadata().to_definition()
    }

    /// Runs the tool on a plain query string, as the router does.
    pub async fn query(&self, query: &str) -> Result<Response, AgentError> {
        match self {
            Self::Vector(tool) => tool.query(query, &[]).await,
            Self::Summary(tool) => tool.engine.query(query).await,
        }
    }

    /// Runs the tool on JSON-encoded function-call arguments.
    ///
    /// # Errors
    ///
    /// - [`AgentError::ToolArguments`] if the arguments are not JSON
    /// - [`AgentError::ToolExecution`] if the arguments miss required fields
    ///   or retrieval or synthesis fails
    pub async fn call(&self, arguments: &str) -> Result<ToolOutput, AgentError> {
        let raw_input: Value = parse_arguments(self.name(), arguments)?;

        let result = match self {
            Self::Vector(tool) => {
                let args: VectorArgs = from_value(self.name(), &raw_input)?;
                let pages = args.page_numbers.unwrap_or_default();
                debug!(tool = self.name(), query = %args.query, ?pages, "vector tool call");
                tool.query(&args.query, &pages).await
            }
            Self::Summary(tool) => {
                let args: SummaryArgs = from_value(self.name(), &raw_input)?;
                debug!(tool = self.name(), input = %args.input, "summary tool call");
                tool.engine.query(&args.input).await
            }
        };

        let response = result.map_err(|e| AgentError::ToolExecution {
            name: self.name().to_string(),
            message: e.to_string(),
        })?;

        Ok(ToolOutput {
            tool_name: self.name().to_string(),
            content: response.response,
            raw_input,
            source_nodes: response.source_nodes,
            is_error: false,
        })
    }
}

fn parse_arguments(name: &str, arguments: &str) -> Result<Value, AgentError> {
    let trimmed = arguments.trim();
    if trimmed.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(trimmed).map_err(|e| AgentError::ToolArguments {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Valid JSON with the wrong fields is a tool failure the model can correct.
fn from_value<T: DeserializeOwned>(name: &str, value: &Value) -> Result<T, AgentError> {
    T::deserialize(value).map_err(|e| AgentError::ToolExecution {
        name: name.to_string(),
        message: format!("invalid arguments: {e}"),
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::testing::{build_doc_tools, sample_nodes};

    #[tokio::test]
    async fn test_vector_call_with_pages() {
        let (vector, _) = build_doc_tools("metagpt", sample_nodes("metagpt")).await;
        let output = vector
            .call(r#"{"query": "evaluation datasets", "page_numbers": ["2"]}"#)
            .await
            .unwrap_or_else(|e| panic!("call failed: {e}"));

        assert!(!output.is_error);
        assert_eq!(output.tool_name, "vector_tool_metagpt");
        assert_eq!(output.raw_input["page_numbers"][0], "2");
        assert!(!output.source_nodes.is_empty());
        assert!(
            output
                .source_nodes
                .iter()
                .all(|n| n.node.page_label() == Some("2"))
        );
    }

    #[tokio::test]
    async fn test_vector_call_without_pages_uses_top_k() {
        let (vector, _) = build_doc_tools("metagpt", sample_nodes("metagpt")).await;
        let output = vector
            .call(r#"{"query": "agents", "page_numbers": null}"#)
            .await
            .unwrap_or_else(|e| panic!("call failed: {e}"));
        assert_eq!(output.source_nodes.len(), 2);
    }

    #[tokio::test]
    async fn test_summary_call_uses_all_nodes() {
        let nodes = sample_nodes("metagpt");
        let count = nodes.len();
        let (_, summary) = build_doc_tools("metagpt", nodes).await;
        let output = summary
            .call(r#"{"input": "summarize the paper"}"#)
            .await
            .unwrap_or_else(|e| panic!("call failed: {e}"));
        assert_eq!(output.source_nodes.len(), count);
        assert!(!output.content.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_arguments() {
        let (vector, _) = build_doc_tools("metagpt", sample_nodes("metagpt")).await;
        assert!(matches!(
            vector.call("{not json").await,
            Err(AgentError::ToolArguments { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_field_is_execution_failure() {
        let (vector, summary) = build_doc_tools("metagpt", sample_nodes("metagpt")).await;
        let err = summary.call(r#"{"query": "wrong field"}"#).await.err();
        assert!(
            matches!(&err, Some(AgentError::ToolExecution { message, .. }) if message.contains("missing field `input`"))
        );
        assert!(matches!(
            vector.call(r#"{"page_numbers": ["2"]}"#).await,
            Err(AgentError::ToolExecution { .. })
        ));
    }

    #[tokio::test]
    async fn test_page_filter_with_no_match_is_empty_response() {
        let (vector, _) = build_doc_tools("metagpt", sample_nodes("metagpt")).await;
        let output = vector
            .call(r#"{"query": "agents", "page_numbers": ["99"]}"#)
            .await
            .unwrap_or_else(|e| panic!("call failed: {e}"));
        assert!(output.source_nodes.is_empty());
        assert_eq!(output.content, crate::query::EMPTY_RESPONSE);
    }
}
