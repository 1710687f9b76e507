//! Router query engine: one LLM selection, one tool execution.

use std::sync::Arc;

use tracing::info;

use super::doc_tool::DocTool;
use super::selector::{Selection, Selector};
use super::tool::ToolMetadata;
use crate::core::Response;
use crate::error::AgentError;

/// Answer produced by the router.
#[derive(Debug, Clone)]
pub struct RouterResponse {
    /// The selector's choice.
    pub selection: Selection,
    /// Name of the tool that answered.
    pub tool_name: String,
    /// The tool's answer and source nodes.
    pub response: Response,
}

/// Routes each query to exactly one of its tools.
///
/// Selection failures and tool failures propagate; there is no retry.
#[derive(Clone)]
pub struct RouterQueryEngine {
    selector: Arc<dyn Selector>,
    tools: Vec<Arc<DocTool>>,
}

impl std::fmt::Debug for RouterQueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterQueryEngine")
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

impl RouterQueryEngine {
    /// Creates a router over `tools`.
    pub fn new(selector: Arc<dyn Selector>, tools: Vec<Arc<DocTool>>) -> Self {
        Self { selector, tools }
    }

    /// Tools the router chooses between.
    #[must_use]
    pub fn tools(&self) -> &[Arc<DocTool>] {
        &self.tools
    }

    /// Selects a tool for `query` and runs it.
    ///
    /// # Errors
    ///
    /// - [`AgentError::ResponseParse`] / [`AgentError::Selection`] from the selector
    /// - any error raised by the selected tool
    pub async fn query(&self, query: &str) -> Result<RouterResponse, AgentError> {
        let choices: Vec<ToolMetadata> = self.tools.iter().map(|t| t.metadata().clone()).collect();
        let selection = self.selector.select(&choices, query).await?;

        let tool = self
            .tools
            .get(selection.index)
            .ok_or(AgentError::Selection {
                choice: selection.index + 1,
                num_choices: self.tools.len(),
            })?;

        info!(
            index = selection.index,
            tool = tool.name(),
            reason = %selection.reason,
            "Selecting query engine"
        );

        let response = tool.query(query).await?;
        Ok(RouterResponse {
            selection,
            tool_name: tool.name().to_string(),
            response,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::agent::testing::{FALLBACK_ANSWER, build_doc_tools, sample_nodes};
    use crate::agent::tool::ToolKind;

    /// Picks the first tool of the given kind.
    struct KindSelector(ToolKind);

    #[async_trait]
    impl Selector for KindSelector {
        async fn select(
            &self,
            choices: &[ToolMetadata],
            _query: &str,
        ) -> Result<Selection, AgentError> {
            let index = choices
                .iter()
                .position(|c| c.kind == self.0)
                .unwrap_or_else(|| unreachable!());
            Ok(Selection {
                index,
                reason: format!("{:?}", self.0),
            })
        }
    }

    /// Always answers with a fixed out-of-range index.
    struct OutOfRange;

    #[async_trait]
    impl Selector for OutOfRange {
        async fn select(&self, _: &[ToolMetadata], _: &str) -> Result<Selection, AgentError> {
            Ok(Selection {
                index: 7,
                reason: String::new(),
            })
        }
    }

    async fn router(selector: Arc<dyn Selector>) -> RouterQueryEngine {
        let (vector, summary) = build_doc_tools("metagpt", sample_nodes("metagpt")).await;
        RouterQueryEngine::new(selector, vec![summary, vector])
    }

    #[tokio::test]
    async fn test_routes_to_summary() {
        let router = router(Arc::new(KindSelector(ToolKind::Summary))).await;
        let result = router
            .query("What is the summary of the document?")
            .await
            .unwrap_or_else(|e| panic!("query failed: {e}"));

        assert_eq!(result.tool_name, "summary_tool_metagpt");
        assert_eq!(result.selection.index, 0);
        assert_eq!(result.response.response, FALLBACK_ANSWER);
        // Summary retrieval uses every node, unscored
        assert_eq!(result.response.source_nodes.len(), 5);
        assert!(result.response.source_nodes.iter().all(|n| n.score.is_none()));
    }

    #[tokio::test]
    async fn test_routes_to_vector() {
        let router = router(Arc::new(KindSelector(ToolKind::Vector))).await;
        let result = router
            .query("How do agents share information with other agents?")
            .await
            .unwrap_or_else(|e| panic!("query failed: {e}"));

        assert_eq!(result.tool_name, "vector_tool_metagpt");
        assert_eq!(result.selection.index, 1);
        assert_eq!(result.response.source_nodes.len(), 2);
        assert!(result.response.source_nodes.iter().all(|n| n.score.is_some()));
    }

    #[tokio::test]
    async fn test_invalid_selection_propagates() {
        let router = router(Arc::new(OutOfRange)).await;
        let result = router.query("anything").await;
        assert!(matches!(
            result,
            Err(AgentError::Selection {
                choice: 8,
                num_choices: 2
            })
        ));
    }
}
