//! Prompt templates for synthesis, routing and the multi-document agent.
//!
//! Templates use `{name}` placeholders filled by [`render`]. Every template
//! can be overridden by a file in the prompt directory.

use std::path::{Path, PathBuf};

/// Question answering over retrieved context.
pub const QA_PROMPT: &str = "Context information is below.
---------------------
{context}
---------------------
Given the context information and not prior knowledge, answer the query.
Query: {query}
Answer: ";

/// Refining an existing answer with additional context.
pub const REFINE_PROMPT: &str = "The original query is as follows: {query}
We have provided an existing answer: {existing_answer}
We have the opportunity to refine the existing answer (only if needed) with some more context below.
------------
{context}
------------
Given the new context, refine the original answer to better answer the query. If the context isn't useful, return the original answer.
Refined Answer: ";

/// Summarizing a pack of chunks (tree summarize, every level).
pub const SUMMARY_PROMPT: &str = "Context information from multiple sources is below.
---------------------
{context}
---------------------
Given the information from multiple sources and not prior knowledge, answer the query.
Query: {query}
Answer: ";

/// Single-choice tool selection.
pub const SELECTOR_PROMPT: &str = r#"Some choices are given below. It is provided in a numbered list (1 to {num_choices}), where each item in the list corresponds to a summary.
---------------------
{choices}
---------------------
Using only the choices above and not prior knowledge, return the choice that is most relevant to the question: '{query}'

The output should be ONLY JSON formatted as a JSON instance.

Here is an example:
{"choice": 1, "reason": "<reason for the choice>"}
"#;

/// System prompt for the agent answering over many papers.
pub const MULTI_DOC_AGENT_PROMPT: &str = "You are an agent designed to answer queries over a set of given papers.
Please always use the tools provided to answer a question. Do not rely on prior knowledge.";

/// Default prompt directory under the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/agentic-rag/prompts";

const QA_FILENAME: &str = "qa.md";
const REFINE_FILENAME: &str = "refine.md";
const SUMMARY_FILENAME: &str = "summary.md";
const SELECTOR_FILENAME: &str = "selector.md";
const MULTI_DOC_AGENT_FILENAME: &str = "multi_doc_agent.md";

/// The full set of prompt templates.
///
/// Loaded from template files when available, falling back to compiled-in
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// QA template (`{context}`, `{query}`).
    pub qa: String,
    /// Refine template (`{query}`, `{existing_answer}`, `{context}`).
    pub refine: String,
    /// Summary template (`{context}`, `{query}`).
    pub summary: String,
    /// Selector template (`{num_choices}`, `{choices}`, `{query}`).
    pub selector: String,
    /// System prompt for the multi-document agent.
    pub multi_doc_agent: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::defaults()
    }
}

impl PromptSet {
    /// Loads prompts, falling back to compiled-in defaults.
    ///
    /// Resolution order for the directory:
    /// 1. Explicit `prompt_dir` argument
    /// 2. `AGENTIC_RAG_PROMPT_DIR` environment variable
    /// 3. `~/.config/agentic-rag/prompts/`
    ///
    /// Each file is loaded independently; a missing file uses its default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir
            .map(PathBuf::from)
            .or_else(|| std::env::var("AGENTIC_RAG_PROMPT_DIR").ok().map(PathBuf::from))
            .or_else(Self::default_dir);

        let load_file = |filename: &str, default: &str| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(&path).ok())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            qa: load_file(QA_FILENAME, QA_PROMPT),
            refine: load_file(REFINE_FILENAME, REFINE_PROMPT),
            summary: load_file(SUMMARY_FILENAME, SUMMARY_PROMPT),
            selector: load_file(SELECTOR_FILENAME, SELECTOR_PROMPT),
            multi_doc_agent: load_file(MULTI_DOC_AGENT_FILENAME, MULTI_DOC_AGENT_PROMPT),
        }
    }

    /// Compiled-in defaults, without touching the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            qa: QA_PROMPT.to_string(),
            refine: REFINE_PROMPT.to_string(),
            summary: SUMMARY_PROMPT.to_string(),
            selector: SELECTOR_PROMPT.to_string(),
            multi_doc_agent: MULTI_DOC_AGENT_PROMPT.to_string(),
        }
    }

    /// Writes the compiled-in defaults to `dir`.
    ///
    /// Creates the directory if needed. Existing files are **not**
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let templates = [
            (QA_FILENAME, QA_PROMPT),
            (REFINE_FILENAME, REFINE_PROMPT),
            (SUMMARY_FILENAME, SUMMARY_PROMPT),
            (SELECTOR_FILENAME, SELECTOR_PROMPT),
            (MULTI_DOC_AGENT_FILENAME, MULTI_DOC_AGENT_PROMPT),
        ];

        let mut written = Vec::new();
        for (filename, content) in &templates {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// The default prompt directory, if the home directory is known.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

/// Fills `{key}` placeholders in `template` in a single pass.
///
/// Unknown placeholders are kept verbatim and substituted values are never
/// re-scanned.
#[must_use]
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let hit = after.find('}').and_then(|end| {
            let key = &after[..end];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (end, *value))
        });
        match hit {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
