//! Shared mocks for agent tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::doc_tool::DocTool;
use super::factory::ToolFactory;
use super::message::{ChatRequest, ChatResponse, TokenUsage};
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::tool::ToolCall;
use crate::config::RagConfig;
use crate::core::{Node, PAGE_LABEL_KEY};
use crate::embedding::{Embedder, HashEmbedder};
use crate::error::AgentError;
use crate::index::{IndexCache, SummaryIndex, VectorIndex};
use crate::query::Synthesizer;

/// Text returned once the script is exhausted.
pub const FALLBACK_ANSWER: &str = "synthesized answer";

/// Replays scripted responses, then answers with [`FALLBACK_ANSWER`].
pub struct ScriptedProvider {
    script: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<ChatResponse>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Sleeps before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        Ok(next.unwrap_or_else(|| text_response(FALLBACK_ANSWER)))
    }
}

pub fn text_response(content: &str) -> ChatResponse {
    ChatResponse {
        content: content.to_string(),
        usage: TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        },
        tool_calls: Vec::new(),
        finish_reason: Some("stop".to_string()),
    }
}

pub fn tool_call_response(calls: &[(&str, &str, &str)]) -> ChatResponse {
    ChatResponse {
        content: String::new(),
        usage: TokenUsage {
            prompt_tokens: 20,
            completion_tokens: 5,
            total_tokens: 25,
        },
        tool_calls: calls
            .iter()
            .map(|(id, name, arguments)| ToolCall {
                id: (*id).to_string(),
                name: (*name).to_string(),
                arguments: (*arguments).to_string(),
            })
            .collect(),
        finish_reason: Some("tool_calls".to_string()),
    }
}

pub fn test_config(storage: &Path) -> RagConfig {
    RagConfig::builder()
        .api_key("test")
        .embedding_backend("hash")
        .storage_dir(storage)
        .build()
        .unwrap_or_else(|_| unreachable!())
}

/// Nodes over three pages of a fake paper.
pub fn sample_nodes(doc: &str) -> Vec<Node> {
    [
        ("1", "introduces a multi-agent framework where agents take roles"),
        ("1", "roles include product manager architect and engineer"),
        ("2", "the evaluation datasets are HumanEval and MBPP"),
        ("2", "evaluation also uses a SoftwareDev dataset of 70 tasks"),
        ("3", "results show higher pass rates than prior agents"),
    ]
    .iter()
    .enumerate()
    .map(|(i, (page, text))| {
        Node::new(format!("{doc}-p{page}-{i}"), format!("{doc}: {text}"))
            .with_metadata(PAGE_LABEL_KEY, *page)
    })
    .collect()
}

/// Factory whose synthesizer answers with [`FALLBACK_ANSWER`].
pub fn factory_in(storage: &Path) -> (ToolFactory, IndexCache) {
    let config = test_config(storage);
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());
    let cache = IndexCache::new(&config, embedder);
    let provider: Arc<dyn LlmProvider> = Arc::new(ScriptedProvider::new(Vec::new()));
    let synthesizer = Synthesizer::new(provider, Arc::new(PromptSet::defaults()), &config);
    let factory = ToolFactory::new(cache.clone(), synthesizer, config.similarity_top_k);
    (factory, cache)
}

/// Builds `(vector, summary)` tools over in-memory indexes.
pub async fn build_doc_tools(name: &str, nodes: Vec<Node>) -> (Arc<DocTool>, Arc<DocTool>) {
    let (factory, cache) = factory_in(Path::new("unused-storage"));
    let vector = VectorIndex::build(name, nodes.clone(), cache.embedder().as_ref(), 16)
        .await
        .unwrap_or_else(|_| unreachable!());
    let summary = SummaryIndex::build(name, nodes);
    factory.from_indexes(name, Arc::new(vector), Arc::new(summary))
}
