//! Single function-calling turn: the model picks tools, they run, their
//! outputs are returned without a follow-up model call.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use super::doc_tool::DocTool;
use super::executor::ToolExecutor;
use super::message::{ChatMessage, ChatRequest};
use super::provider::LlmProvider;
use super::tool::ToolOutput;
use crate::config::RagConfig;
use crate::error::AgentError;

/// Model parameters for function-calling requests.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSettings {
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum completion tokens.
    pub max_tokens: u32,
}

impl RequestSettings {
    /// Agent model settings from `config`.
    #[must_use]
    pub fn from_config(config: &RagConfig) -> Self {
        Self {
            model: config.agent_model.clone(),
            temperature: config.agent_temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// A request over `messages` offering `executor`'s tools.
    pub(crate) fn request(&self, messages: Vec<ChatMessage>, executor: &ToolExecutor) -> ChatRequest {
        let mut request = ChatRequest::new(self.model.clone(), messages);
        request.temperature = Some(self.temperature);
        request.max_tokens = Some(self.max_tokens);
        request.tools = executor.definitions();
        request
    }
}

/// Asks the model to call one or more of `tools` for `query` and returns
/// their combined output.
///
/// Several calls are merged: names joined with `, `, contents with blank
/// lines, source nodes concatenated in call order.
///
/// # Errors
///
/// - [`AgentError::NoToolCall`] if the model answers without calling a tool
/// - [`AgentError::UnknownTool`] / [`AgentError::ToolArguments`] from the
///   executor
/// - provider errors
pub async fn predict_and_call(
    provider: &dyn LlmProvider,
    settings: &RequestSettings,
    tools: &[Arc<DocTool>],
    query: &str,
) -> Result<ToolOutput, AgentError> {
    let executor = ToolExecutor::new(tools.to_vec());
    let request = settings.request(vec![ChatMessage::user(query)], &executor);

    let response = provider.chat(&request).await?;
    if response.tool_calls.is_empty() {
        return Err(AgentError::NoToolCall);
    }

    let mut outputs = Vec::with_capacity(response.tool_calls.len());
    for call in &response.tool_calls {
        info!(
            tool = call.name,
            arguments = call.arguments,
            "=== Calling Function ==="
        );
        let output = executor.execute(call).await?;
        info!(tool = call.name, output = %output.content, "=== Function Output ===");
        outputs.push(output);
    }

    Ok(combine(outputs))
}

fn combine(mut outputs: Vec<ToolOutput>) -> ToolOutput {
    if outputs.len() == 1 {
        return outputs.remove(0);
    }

    let tool_name = outputs
        .iter()
        .map(|o| o.tool_name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let content = outputs
        .iter()
        .map(|o| o.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let is_error = outputs.iter().all(|o| o.is_error);
    let raw_input = Value::Array(outputs.iter().map(|o| o.raw_input.clone()).collect());
    let source_nodes = outputs.into_iter().flat_map(|o| o.source_nodes).collect();

    ToolOutput {
        tool_name,
        content,
        raw_input,
        source_nodes,
        is_error,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::testing::{
        ScriptedProvider, build_doc_tools, sample_nodes, test_config, text_response,
        tool_call_response,
    };

    async fn tools() -> Vec<Arc<DocTool>> {
        let (vector, summary) = build_doc_tools("metagpt", sample_nodes("metagpt")).await;
        vec![vector, summary]
    }

    fn settings() -> RequestSettings {
        RequestSettings::from_config(&test_config(std::path::Path::new("unused")))
    }

    #[tokio::test]
    async fn test_single_call_with_page_filter() {
        let provider = ScriptedProvider::new(vec![tool_call_response(&[(
            "call_0",
            "vector_tool_metagpt",
            r#"{"query": "MetaGPT comparisons with ChatDev", "page_numbers": ["2"]}"#,
        )])]);

        let output = predict_and_call(
            &provider,
            &settings(),
            &tools().await,
            "What are the MetaGPT comparisons with ChatDev described on page 2?",
        )
        .await
        .unwrap_or_else(|e| panic!("predict_and_call failed: {e}"));

        assert_eq!(output.tool_name, "vector_tool_metagpt");
        assert!(!output.source_nodes.is_empty());
        assert!(
            output
                .source_nodes
                .iter()
                .all(|n| n.node.metadata.get("page_label").map(String::as_str) == Some("2"))
        );
        // No follow-up call after the tools ran
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_request_offers_tools() {
        let provider = ScriptedProvider::new(vec![tool_call_response(&[(
            "call_0",
            "summary_tool_metagpt",
            r#"{"input": "overview"}"#,
        )])]);
        let settings = settings();
        predict_and_call(&provider, &settings, &tools().await, "Summarize")
            .await
            .unwrap_or_else(|e| panic!("predict_and_call failed: {e}"));

        let requests = provider.requests();
        assert_eq!(requests[0].tools.len(), 2);
        assert_eq!(requests[0].model, settings.model);
        assert_eq!(requests[0].temperature, Some(settings.temperature));
    }

    #[tokio::test]
    async fn test_no_tool_call() {
        let provider = ScriptedProvider::new(vec![text_response("I know this one.")]);
        let result = predict_and_call(&provider, &settings(), &tools().await, "q").await;
        assert!(matches!(result, Err(AgentError::NoToolCall)));
    }

    #[tokio::test]
    async fn test_multiple_calls_combined() {
        let provider = ScriptedProvider::new(vec![tool_call_response(&[
            ("call_0", "vector_tool_metagpt", r#"{"query": "datasets"}"#),
            ("call_1", "summary_tool_metagpt", r#"{"input": "overview"}"#),
        ])]);
        let output = predict_and_call(&provider, &settings(), &tools().await, "q")
            .await
            .unwrap_or_else(|e| panic!("predict_and_call failed: {e}"));

        assert_eq!(output.tool_name, "vector_tool_metagpt, summary_tool_metagpt");
        assert_eq!(output.source_nodes.len(), 2 + 5);
        assert_eq!(output.raw_input.as_array().map(Vec::len), Some(2));
        assert!(!output.is_error);
    }

    #[tokio::test]
    async fn test_unparseable_arguments_propagate() {
        let provider = ScriptedProvider::new(vec![tool_call_response(&[(
            "call_0",
            "vector_tool_metagpt",
            "{broken",
        )])]);
        let result = predict_and_call(&provider, &settings(), &tools().await, "q").await;
        assert!(matches!(result, Err(AgentError::ToolArguments { .. })));
    }
}
