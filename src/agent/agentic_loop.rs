//! Agentic tool-calling loop.
//!
//! Drives the LLM ↔ tool execution round-trip: sends a request to the model,
//! executes any tool calls in the response, appends results, and repeats
//! until the model produces a final text response or the iteration limit
//! is reached.

use tracing::{debug, info};

use super::executor::ToolExecutor;
use super::message::{ChatMessage, ChatRequest, ChatResponse, TokenUsage};
use super::provider::LlmProvider;
use super::tool::ToolOutput;
use crate::error::AgentError;

/// Result of a completed loop.
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    /// The final response (no tool calls).
    pub response: ChatResponse,
    /// Every tool output produced along the way, in call order.
    pub sources: Vec<ToolOutput>,
    /// Usage summed over every model call.
    pub usage: TokenUsage,
}

/// Runs an agentic loop: model → tool calls → tool results → model → …
///
/// `request.messages` is extended in place with the assistant tool-call
/// and tool-result messages; the final answer is not appended.
///
/// # Errors
///
/// - [`AgentError::ToolLoopExceeded`] if the model keeps requesting tools
///   beyond `max_iterations`
/// - [`AgentError::UnknownTool`] / [`AgentError::ToolArguments`] from the
///   executor
/// - provider errors
pub async fn agentic_loop(
    provider: &dyn LlmProvider,
    request: &mut ChatRequest,
    executor: &ToolExecutor,
    max_iterations: usize,
) -> Result<LoopOutcome, AgentError> {
    let mut sources = Vec::new();
    let mut usage = TokenUsage::default();

    for iteration in 0..max_iterations {
        let response = provider.chat(request).await?;
        usage.accumulate(response.usage);

        // If no tool calls, we have a final answer
        if response.tool_calls.is_empty() {
            debug!(iteration, "agentic loop completed with final text response");
            return Ok(LoopOutcome {
                response,
                sources,
                usage,
            });
        }

        debug!(
            iteration,
            tool_count = response.tool_calls.len(),
            "executing tool calls"
        );

        request
            .messages
            .push(ChatMessage::tool_calls(response.tool_calls.clone()));

        for call in &response.tool_calls {
            info!(
                tool = call.name,
                arguments = call.arguments,
                "=== Calling Function ==="
            );
            let output = executor.execute(call).await?;
            info!(
                tool = call.name,
                is_error = output.is_error,
                output = %output.content,
                "=== Function Output ==="
            );
            request
                .messages
                .push(ChatMessage::tool_result(&call.id, output.content.clone()));
            sources.push(output);
        }
    }

    Err(AgentError::ToolLoopExceeded { max_iterations })
}
