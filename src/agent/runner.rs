//! Function-calling agent with a chat session.
//!
//! Each [`AgentRunner::chat`] turn offers tools to the model (a fixed list,
//! or those retrieved for the query), runs the tool-calling loop until a
//! final answer, and appends the turn to the session history. A failed or
//! timed-out turn leaves the history untouched.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use super::agentic_loop::agentic_loop;
use super::doc_tool::DocTool;
use super::executor::ToolExecutor;
use super::message::{ChatMessage, TokenUsage};
use super::predict::RequestSettings;
use super::provider::LlmProvider;
use super::retriever::ToolRetriever;
use super::tool::ToolOutput;
use crate::config::RagConfig;
use crate::error::{AgentError, IndexError};

/// Where a turn's tools come from.
#[derive(Debug, Clone)]
pub enum ToolSource {
    /// The same tools every turn.
    Static(Vec<Arc<DocTool>>),
    /// The top-k tools retrieved for each user query.
    Retriever(Arc<ToolRetriever>),
}

impl ToolSource {
    async fn tools_for(&self, query: &str) -> Result<Vec<Arc<DocTool>>, AgentError> {
        match self {
            Self::Static(tools) => Ok(tools.clone()),
            Self::Retriever(retriever) => retriever
                .retrieve(query)
                .await
                .map_err(|e| AgentError::Index(IndexError::from(e))),
        }
    }
}

/// Final answer of one agent turn.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    /// Answer text.
    pub response: String,
    /// Outputs of every tool called during the turn.
    pub sources: Vec<ToolOutput>,
    /// Usage summed over the turn's model calls.
    pub usage: TokenUsage,
}

impl fmt::Display for AgentResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.response)
    }
}

/// Runs the function-calling agent.
pub struct AgentRunner {
    provider: Arc<dyn LlmProvider>,
    settings: RequestSettings,
    max_iterations: usize,
    turn_timeout: Duration,
    system_prompt: Option<String>,
    tools: ToolSource,
    history: Vec<ChatMessage>,
}

impl fmt::Debug for AgentRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRunner")
            .field("provider", &self.provider.name())
            .field("settings", &self.settings)
            .field("max_iterations", &self.max_iterations)
            .field("turn_timeout", &self.turn_timeout)
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl AgentRunner {
    /// Creates a runner with an empty session.
    pub fn new(provider: Arc<dyn LlmProvider>, config: &RagConfig, tools: ToolSource) -> Self {
        Self {
            provider,
            settings: RequestSettings::from_config(config),
            max_iterations: config.max_tool_iterations,
            turn_timeout: config.turn_timeout,
            system_prompt: None,
            tools,
            history: Vec::new(),
        }
    }

    /// Sets the system prompt sent ahead of the history every turn.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Session history (system prompt excluded).
    #[must_use]
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Clears the session history.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Answers `query` in the ongoing session.
    ///
    /// # Errors
    ///
    /// - [`AgentError::Timeout`] if the turn exceeds the configured limit
    /// - [`AgentError::ToolLoopExceeded`] if the model never stops calling tools
    /// - [`AgentError::UnknownTool`] / [`AgentError::ToolArguments`] for
    ///   unrecoverable tool calls
    /// - provider and retrieval errors
    pub async fn chat(&mut self, query: &str) -> Result<AgentResponse, AgentError> {
        let (response, turn) = self.timed_turn(&self.history, query).await?;
        self.history.extend(turn);
        debug!(history = self.history.len(), "agent turn recorded");
        Ok(response)
    }

    /// Answers `query` without reading or writing the session history.
    ///
    /// # Errors
    ///
    /// Same as [`Self::chat`].
    pub async fn query(&self, query: &str) -> Result<AgentResponse, AgentError> {
        self.timed_turn(&[], query)
            .await
            .map(|(response, _)| response)
    }

    async fn timed_turn(
        &self,
        history: &[ChatMessage],
        query: &str,
    ) -> Result<(AgentResponse, Vec<ChatMessage>), AgentError> {
        tokio::time::timeout(self.turn_timeout, self.turn(history, query))
            .await
            .map_err(|_| AgentError::Timeout {
                seconds: self.turn_timeout.as_secs(),
            })?
    }

    /// Runs one turn and returns the answer plus the messages it added.
    async fn turn(
        &self,
        history: &[ChatMessage],
        query: &str,
    ) -> Result<(AgentResponse, Vec<ChatMessage>), AgentError> {
        info!(query, "Added user message to memory");

        let tools = self.tools.tools_for(query).await?;
        let executor = ToolExecutor::new(tools);

        let mut messages = Vec::with_capacity(history.len() + 2);
        if let Some(prompt) = &self.system_prompt {
            messages.push(ChatMessage::system(prompt));
        }
        messages.extend_from_slice(history);
        let turn_start = messages.len();
        messages.push(ChatMessage::user(query));

        let mut request = self.settings.request(messages, &executor);
        let outcome =
            agentic_loop(self.provider.as_ref(), &mut request, &executor, self.max_iterations)
                .await?;

        let mut turn = request.messages.split_off(turn_start);
        turn.push(ChatMessage::assistant(&outcome.response.content));

        Ok((
            AgentResponse {
                response: outcome.response.content,
                sources: outcome.sources,
                usage: outcome.usage,
            },
            turn,
        ))
    }
}
