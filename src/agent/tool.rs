//! Tool type definitions for function-calling.
//!
//! What the model sees of a tool (definition, call) and what the document
//! tools return.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::core::ScoredNode;

/// A tool definition that can be sent to an LLM for function-calling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match a tool offered to the executor).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: Value,
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (assigned by the provider).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON-encoded arguments for the tool.
    pub arguments: String,
}

/// What a document tool does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Top-k retrieval with optional page filters, compact synthesis.
    Vector,
    /// Tree summarization over every chunk of the document.
    Summary,
}

/// Name, description and capability of a document tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMetadata {
    /// Unique tool name, e.g. `vector_tool_metagpt`.
    pub name: String,
    /// Description shown to the router and the function-calling model.
    pub description: String,
    /// Capability.
    pub kind: ToolKind,
    /// Document the tool answers over.
    pub document: String,
}

impl ToolMetadata {
    /// JSON schema for the tool's arguments.
    #[must_use]
    pub fn parameters(&self) -> Value {
        match self.kind {
            ToolKind::Vector => json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "the string query to be embedded."
                    },
                    "page_numbers": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Filter by set of pages. Leave empty to perform a vector search over all pages. Otherwise, filter by the set of specified pages."
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
            ToolKind::Summary => json!({
                "type": "object",
                "properties": {
                    "input": {
                        "type": "string",
                        "description": "the question to summarize the document for."
                    }
                },
                "required": ["input"],
                "additionalProperties": false
            }),
        }
    }

    /// Function-calling definition sent to the model.
    #[must_use]
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters(),
        }
    }

    /// Text embedded by the tool retriever.
    #[must_use]
    pub fn embedding_text(&self) -> String {
        format!(
            "Tool name: {}\nTool description: {}",
            self.name, self.description
        )
    }
}

/// Output of one tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Name of the tool that produced this output.
    pub tool_name: String,
    /// Answer text, or the error message when `is_error` is set.
    pub content: String,
    /// Arguments the tool was called with.
    pub raw_input: Value,
    /// Nodes the answer was synthesized from.
    #[serde(default)]
    pub source_nodes: Vec<ScoredNode>,
    /// Whether the tool failed.
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    /// An error output carrying `message`.
    pub fn error(tool_name: impl Into<String>, raw_input: Value, message: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            content: message.into(),
            raw_input,
            source_nodes: Vec::new(),
            is_error: true,
        }
    }
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}
