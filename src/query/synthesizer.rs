//! Response synthesis over retrieved nodes.
//!
//! Two modes:
//!
//! - **compact**: pack node texts into context-window sized chunks, answer
//!   with the QA prompt on the first pack, then refine the answer with each
//!   following pack.
//! - **tree summarize**: pack node texts; summarize each pack concurrently,
//!   then repack the summaries and repeat until a single pack remains, which
//!   produces the final answer.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::agent::message::{ChatMessage, ChatRequest};
use crate::agent::prompt::{PromptSet, render};
use crate::agent::provider::LlmProvider;
use crate::config::RagConfig;
use crate::core::{Response, ScoredNode};
use crate::error::AgentError;
use crate::ingest::{SentenceSplitter, estimate_tokens};

/// Answer returned when there is nothing to synthesize from.
pub const EMPTY_RESPONSE: &str = "Empty Response";

/// Smallest context budget a pack is given, whatever the configuration.
const MIN_PACK_TOKENS: usize = 256;

/// How retrieved nodes are turned into an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// QA on the first pack, refine with the rest.
    Compact,
    /// Concurrent hierarchical summarization.
    TreeSummarize,
}

/// LLM-backed response synthesizer.
#[derive(Clone)]
pub struct Synthesizer {
    provider: Arc<dyn LlmProvider>,
    prompts: Arc<PromptSet>,
    model: String,
    max_tokens: u32,
    context_window: usize,
    max_concurrency: usize,
}

impl std::fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synthesizer")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("context_window", &self.context_window)
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}

impl Synthesizer {
    /// Creates a synthesizer using the query model from `config`.
    pub fn new(provider: Arc<dyn LlmProvider>, prompts: Arc<PromptSet>, config: &RagConfig) -> Self {
        Self {
            provider,
            prompts,
            model: config.llm_model.clone(),
            max_tokens: config.max_tokens,
            context_window: config.context_window,
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    /// Synthesizes an answer to `query` from `nodes`.
    ///
    /// An empty node set yields [`EMPTY_RESPONSE`] without calling the model.
    pub async fn synthesize(
        &self,
        query: &str,
        nodes: Vec<ScoredNode>,
        mode: ResponseMode,
    ) -> Result<Response, AgentError> {
        if nodes.is_empty() {
            return Ok(Response::new(EMPTY_RESPONSE, nodes));
        }

        let texts: Vec<String> = nodes.iter().map(|n| n.node.text.clone()).collect();
        let answer = match mode {
            ResponseMode::Compact => self.compact(query, &texts).await?,
            ResponseMode::TreeSummarize => self.tree_summarize(query, texts).await?,
        };
        Ok(Response::new(answer, nodes))
    }

    async fn compact(&self, query: &str, texts: &[String]) -> Result<String, AgentError> {
        let packs = self.pack(texts, &self.prompts.refine);
        debug!(packs = packs.len(), "compact synthesis");

        let mut packs = packs.into_iter();
        let Some(first) = packs.next() else {
            return Ok(EMPTY_RESPONSE.to_string());
        };

        let mut answer = self
            .complete(render(&self.prompts.qa, &[("context", &first), ("query", query)]))
            .await?;

        for pack in packs {
            answer = self
                .complete(render(
                    &self.prompts.refine,
                    &[
                        ("query", query),
                        ("existing_answer", &answer),
                        ("context", &pack),
                    ],
                ))
                .await?;
        }
        Ok(answer)
    }

    async fn tree_summarize(&self, query: &str, texts: Vec<String>) -> Result<String, AgentError> {
        let mut packs = self.pack(&texts, &self.prompts.summary);
        let mut level = 0;

        while packs.len() > 1 {
            debug!(level, packs = packs.len(), "tree summarize fan-out");
            let summaries = self.fan_out(query, &packs).await?;

            let next = self.pack(&summaries, &self.prompts.summary);
            packs = if next.len() < packs.len() {
                next
            } else {
                summaries.chunks(2).map(|pair| pair.join("\n\n")).collect()
            };
            level += 1;
        }

        let Some(context) = packs.pop() else {
            return Ok(EMPTY_RESPONSE.to_string());
        };
        self.complete(render(
            &self.prompts.summary,
            &[("context", &context), ("query", query)],
        ))
        .await
    }

    /// Summarizes each pack concurrently, bounded by `max_concurrency`.
    /// Results keep pack order.
    async fn fan_out(&self, query: &str, packs: &[String]) -> Result<Vec<String>, AgentError> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(packs.len());

        for pack in packs {
            let sem = Arc::clone(&semaphore);
            let synth = self.clone();
            let prompt = render(&self.prompts.summary, &[("context", pack), ("query", query)]);

            handles.push(tokio::spawn(async move {
                let _permit = sem.acquire().await.map_err(|e| AgentError::Orchestration {
                    message: format!("Semaphore acquire failed: {e}"),
                })?;
                synth.complete(prompt).await
            }));
        }

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let summary = handle.await.map_err(|e| AgentError::Orchestration {
                message: format!("Task join failed: {e}"),
            })??;
            summaries.push(summary);
        }
        Ok(summaries)
    }

    async fn complete(&self, prompt: String) -> Result<String, AgentError> {
        let mut request = ChatRequest::new(self.model.clone(), vec![ChatMessage::user(prompt)]);
        request.max_tokens = Some(self.max_tokens);
        let response = self.provider.chat(&request).await?;
        Ok(response.content.trim().to_string())
    }

    /// Context budget for one pack rendered into `template`.
    fn pack_budget(&self, template: &str) -> usize {
        let reserved = estimate_tokens(template) + self.max_tokens as usize;
        self.context_window
            .saturating_sub(reserved)
            .max(MIN_PACK_TOKENS)
    }

    /// Greedily joins texts into packs that fit the template's budget.
    /// Texts larger than the budget are split first.
    fn pack(&self, texts: &[String], template: &str) -> Vec<String> {
        let budget = self.pack_budget(template);
        let splitter = SentenceSplitter::new(budget, 0);

        let mut packs = Vec::new();
        let mut current = String::new();
        let mut current_tokens = 0;

        let pieces = texts.iter().flat_map(|text| {
            if estimate_tokens(text) > budget {
                splitter.split_text(text)
            } else {
                vec![text.clone()]
            }
        });

        for piece in pieces {
            let tokens = estimate_tokens(&piece) + 1;
            if current_tokens + tokens > budget && !current.is_empty() {
                packs.push(std::mem::take(&mut current));
                current_tokens = 0;
            }
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(&piece);
            current_tokens += tokens;
        }
        if !current.is_empty() {
            packs.push(current);
        }
        packs
    }
}
