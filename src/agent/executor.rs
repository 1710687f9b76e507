//! Tool executor dispatching function calls to document tools.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::doc_tool::DocTool;
use super::tool::{ToolCall, ToolDefinition, ToolOutput};
use crate::error::AgentError;

/// Maximum raw byte length of tool argument JSON from the LLM.
const MAX_TOOL_ARGS_LEN: usize = 100_000;

/// Executes tool calls against the tools offered for one turn.
#[derive(Debug, Clone, Default)]
pub struct ToolExecutor {
    tools: Vec<Arc<DocTool>>,
}

impl ToolExecutor {
    /// Creates an executor over `tools`.
    #[must_use]
    pub const fn new(tools: Vec<Arc<DocTool>>) -> Self {
        Self { tools }
    }

    /// Offered tools.
    #[must_use]
    pub fn tools(&self) -> &[Arc<DocTool>] {
        &self.tools
    }

    /// Function-calling definitions of every offered tool.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Executes one call.
    ///
    /// Tool failures come back as an output with `is_error` set so the
    /// model can see them.
    ///
    /// # Errors
    ///
    /// - [`AgentError::UnknownTool`] if `call.name` was not offered
    /// - [`AgentError::ToolArguments`] if the arguments are not JSON or too large
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, AgentError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == call.name)
            .ok_or_else(|| AgentError::UnknownTool {
                name: call.name.clone(),
            })?;

        if call.arguments.len() > MAX_TOOL_ARGS_LEN {
            return Err(AgentError::ToolArguments {
                name: call.name.clone(),
                message: format!(
                    "tool arguments too large ({} bytes, max {MAX_TOOL_ARGS_LEN})",
                    call.arguments.len()
                ),
            });
        }

        match tool.call(&call.arguments).await {
            Ok(output) => {
                debug!(
                    tool = call.name,
                    call_id = call.id,
                    sources = output.source_nodes.len(),
                    "tool execution complete"
                );
                Ok(output)
            }
            Err(err @ (AgentError::ToolArguments { .. } | AgentError::UnknownTool { .. })) => {
                Err(err)
            }
            Err(err) => {
                warn!(tool = call.name, call_id = call.id, error = %err, "tool execution failed");
                let raw_input = serde_json::from_str(&call.arguments)
                    .unwrap_or_else(|_| Value::String(call.arguments.clone()));
                Ok(ToolOutput::error(&call.name, raw_input, err.to_string()))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::testing::{build_doc_tools, sample_nodes};

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    async fn executor() -> ToolExecutor {
        let (vector, summary) = build_doc_tools("metagpt", sample_nodes("metagpt")).await;
        ToolExecutor::new(vec![vector, summary])
    }

    #[tokio::test]
    async fn test_definitions() {
        let executor = executor().await;
        let names: Vec<String> = executor.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["vector_tool_metagpt", "summary_tool_metagpt"]);
    }

    #[tokio::test]
    async fn test_execute_dispatches_by_name() {
        let executor = executor().await;
        let output = executor
            .execute(&call("summary_tool_metagpt", r#"{"input": "overview"}"#))
            .await
            .unwrap_or_else(|e| panic!("execute failed: {e}"));
        assert_eq!(output.tool_name, "summary_tool_metagpt");
        assert!(!output.is_error);
    }

    #[tokio::test]
    async fn test_unknown_tool_propagates() {
        let executor = executor().await;
        let result = executor
            .execute(&call("vector_tool_swebench", r#"{"query": "q"}"#))
            .await;
        assert!(matches!(result, Err(AgentError::UnknownTool { name }) if name == "vector_tool_swebench"));
    }

    #[tokio::test]
    async fn test_unparseable_arguments_propagate() {
        let executor = executor().await;
        let result = executor
            .execute(&call("vector_tool_metagpt", r#"{"query": "roles""#))
            .await;
        assert!(matches!(result, Err(AgentError::ToolArguments { .. })));
    }

    #[tokio::test]
    async fn test_missing_field_becomes_error_output() {
        let executor = executor().await;
        let output = executor
            .execute(&call("vector_tool_metagpt", r#"{"page_numbers": ["1"]}"#))
            .await
            .unwrap_or_else(|e| panic!("execute failed: {e}"));
        assert!(output.is_error);
        assert!(output.content.contains("missing field `query`"));
        assert_eq!(output.raw_input["page_numbers"][0], "1");
    }

    #[tokio::test]
    async fn test_execution_failure_becomes_error_output() {
        // Index embedded at a different dimensionality than the query embedder
        let nodes = sample_nodes("metagpt");
        let index = crate::index::VectorIndex::build(
            "metagpt",
            nodes.clone(),
            &crate::embedding::HashEmbedder::new(8),
            16,
        )
        .await
        .unwrap_or_else(|e| panic!("build failed: {e}"));
        let (factory, _) = crate::agent::testing::factory_in(std::path::Path::new("unused"));
        let (vector, _) = factory.from_indexes(
            "metagpt",
            Arc::new(index),
            Arc::new(crate::index::SummaryIndex::build("metagpt", nodes)),
        );

        let output = ToolExecutor::new(vec![vector])
            .execute(&call("vector_tool_metagpt", r#"{"query": "datasets"}"#))
            .await
            .unwrap_or_else(|e| panic!("execute failed: {e}"));
        assert!(output.is_error);
        assert!(output.content.contains("dimension mismatch"));
        assert_eq!(output.raw_input["query"], "datasets");
    }

    #[tokio::test]
    async fn test_oversized_arguments_rejected() {
        let executor = executor().await;
        let huge = format!(r#"{{"query": "{}"}}"#, "x".repeat(MAX_TOOL_ARGS_LEN));
        let result = executor.execute(&call("vector_tool_metagpt", &huge)).await;
        assert!(matches!(result, Err(AgentError::ToolArguments { .. })));
    }
}
