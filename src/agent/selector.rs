//! LLM single-choice selection over tool descriptions.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::message::{ChatMessage, ChatRequest};
use super::prompt::render;
use super::provider::LlmProvider;
use super::tool::ToolMetadata;
use crate::error::AgentError;

/// A chosen tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// 0-based index into the choices offered.
    pub index: usize,
    /// The model's stated reason.
    pub reason: String,
}

/// Picks exactly one of several tools for a query.
#[async_trait]
pub trait Selector: Send + Sync {
    /// Selects one of `choices` for `query`.
    async fn select(&self, choices: &[ToolMetadata], query: &str) -> Result<Selection, AgentError>;
}

/// Selector that asks the LLM to answer with `{"choice": n, "reason": ...}`.
pub struct LlmSingleSelector {
    provider: Arc<dyn LlmProvider>,
    model: String,
    template: String,
}

impl std::fmt::Debug for LlmSingleSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSingleSelector")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl LlmSingleSelector {
    /// Creates a selector using `template` (see [`super::prompt::SELECTOR_PROMPT`]).
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            template: template.into(),
        }
    }

    fn prompt(&self, choices: &[ToolMetadata], query: &str) -> String {
        render(
            &self.template,
            &[
                ("num_choices", &choices.len().to_string()),
                ("choices", &format_choices(choices)),
                ("query", query),
            ],
        )
    }
}

#[async_trait]
impl Selector for LlmSingleSelector {
    async fn select(&self, choices: &[ToolMetadata], query: &str) -> Result<Selection, AgentError> {
        let mut request = ChatRequest::new(
            self.model.clone(),
            vec![ChatMessage::user(self.prompt(choices, query))],
        );
        request.json_mode = true;
        request.temperature = Some(0.0);

        let response = self.provider.chat(&request).await?;
        debug!(content = %response.content, "selector response");
        parse_selection(&response.content, choices.len())
    }
}

/// `(1) first description\n\n(2) second description`.
fn format_choices(choices: &[ToolMetadata]) -> String {
    let mut out = String::new();
    for (i, choice) in choices.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        let _ = write!(out, "({}) {}", i + 1, choice.description);
    }
    out
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChoiceValue {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawSelection {
    choice: ChoiceValue,
    #[serde(default)]
    reason: String,
}

/// Parses a selector answer holding a 1-based choice.
///
/// Accepts a bare object, a one-element array, or either wrapped in a
/// markdown code block.
///
/// # Errors
///
/// - [`AgentError::ResponseParse`] if no choice can be read
/// - [`AgentError::Selection`] if the choice is outside `1..=num_choices`
pub fn parse_selection(content: &str, num_choices: usize) -> Result<Selection, AgentError> {
    let trimmed = content.trim();

    // Handle markdown code blocks
    let json_str = if trimmed.starts_with("```") {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    };

    let raw = match serde_json::from_str::<RawSelection>(json_str) {
        Ok(raw) => raw,
        Err(object_err) => serde_json::from_str::<Vec<RawSelection>>(json_str)
            .ok()
            .and_then(|list| list.into_iter().next())
            .ok_or_else(|| {
                let preview: String = json_str.chars().take(200).collect();
                AgentError::ResponseParse {
                    message: format!(
                        "Failed to parse selector output: {object_err}. Preview: {preview:?}"
                    ),
                    content: content.to_string(),
                }
            })?,
    };

    let choice = match raw.choice {
        ChoiceValue::Number(n) => usize::try_from(n).ok(),
        ChoiceValue::Text(s) => s.trim().parse::<usize>().ok(),
    }
    .ok_or_else(|| AgentError::ResponseParse {
        message: "selector choice is not a positive integer".to_string(),
        content: content.to_string(),
    })?;

    if choice == 0 || choice > num_choices {
        return Err(AgentError::Selection {
            choice,
            num_choices,
        });
    }

    Ok(Selection {
        index: choice - 1,
        reason: raw.reason,
    })
}
