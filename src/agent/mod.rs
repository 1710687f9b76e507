//! Tools, routing and the function-calling agent.
//!
//! Every document gets two tools over its cached indexes: a vector tool
//! (top-k retrieval with optional page filters) and a summary tool (tree
//! summarization over all chunks). Three ways of using them:
//!
//! ```text
//! query → RouterQueryEngine   → selector picks one tool → tool answers
//! query → predict_and_call    → model calls tools once  → tool outputs
//! query → AgentRunner::chat   → model ↔ tools loop      → final answer
//!                ↑
//!          ToolSource::Retriever (top-k tools per query over many papers)
//! ```
//!
//! The LLM is reached through the [`LlmProvider`] trait, backed by
//! OpenAI-compatible APIs.

pub mod agentic_loop;
pub mod client;
pub mod doc_tool;
pub mod executor;
pub mod factory;
pub mod message;
pub mod predict;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod retriever;
pub mod router;
pub mod runner;
pub mod selector;
pub mod tool;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types
pub use agentic_loop::{LoopOutcome, agentic_loop};
pub use client::create_provider;
pub use doc_tool::{DocTool, SummaryTool, VectorTool};
pub use executor::ToolExecutor;
pub use factory::{ToolFactory, summary_tool_description, vector_tool_description};
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use predict::{RequestSettings, predict_and_call};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use retriever::{DEFAULT_TOOL_TOP_K, ToolRetriever};
pub use router::{RouterQueryEngine, RouterResponse};
pub use runner::{AgentResponse, AgentRunner, ToolSource};
pub use selector::{LlmSingleSelector, Selection, Selector, parse_selection};
pub use tool::{ToolCall, ToolDefinition, ToolKind, ToolMetadata, ToolOutput};
