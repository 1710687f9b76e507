//! Configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.
//! A [`RagConfig`] is passed to every component constructor; there is no
//! process-wide model setting.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AgentError;

/// Default chat model for tools, router, and synthesis.
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini-2024-07-18";
/// Default embedding model.
pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-3-large";
/// Default storage root for persisted indexes.
pub const DEFAULT_STORAGE_DIR: &str = "./storage";
/// Default directory holding source PDFs.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default chunk size (approximate tokens).
const DEFAULT_CHUNK_SIZE: usize = 1024;
/// Default chunk overlap (approximate tokens).
const DEFAULT_CHUNK_OVERLAP: usize = 200;
/// Default nodes retrieved per vector query.
const DEFAULT_SIMILARITY_TOP_K: usize = 2;
/// Default tools retrieved per agent turn in the multi-document case.
const DEFAULT_TOOL_TOP_K: usize = 3;
/// Default maximum tool-calling loop iterations.
const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;
/// Default per-turn timeout in seconds.
const DEFAULT_TURN_TIMEOUT_SECS: u64 = 300;
/// Default completion max tokens.
const DEFAULT_MAX_TOKENS: u32 = 2048;
/// Default synthesis context window (approximate tokens per pack).
const DEFAULT_CONTEXT_WINDOW: usize = 16_384;
/// Default concurrent summarisation calls.
const DEFAULT_MAX_CONCURRENCY: usize = 8;
/// Default texts per embedding request.
const DEFAULT_EMBED_BATCH_SIZE: usize = 64;

/// Configuration for indexing, tools, and agents.
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model used by tools, the router selector, and synthesis.
    pub llm_model: String,
    /// Model driving the function-calling agent.
    pub agent_model: String,
    /// Sampling temperature for the agent model.
    pub agent_temperature: f32,
    /// Embedding backend (`openai`, `fastembed`, `hash`).
    pub embedding_backend: String,
    /// Embedding model identifier.
    pub embed_model: String,
    /// Root directory for persisted indexes.
    pub storage_dir: PathBuf,
    /// Directory holding source documents.
    pub data_dir: PathBuf,
    /// Chunk size in approximate tokens.
    pub chunk_size: usize,
    /// Chunk overlap in approximate tokens.
    pub chunk_overlap: usize,
    /// Nodes retrieved per vector query.
    pub similarity_top_k: usize,
    /// Tools retrieved per agent turn when a tool retriever is used.
    pub tool_top_k: usize,
    /// Maximum tool-calling loop iterations before aborting.
    pub max_tool_iterations: usize,
    /// Wall-clock limit for one agent turn.
    pub turn_timeout: Duration,
    /// Maximum completion tokens per LLM call.
    pub max_tokens: u32,
    /// Approximate tokens packed into one synthesis call.
    pub context_window: usize,
    /// Maximum concurrent summarisation calls.
    pub max_concurrency: usize,
    /// Texts per embedding request.
    pub embed_batch_size: usize,
    /// Directory containing prompt template files.
    ///
    /// When set, prompts are loaded from markdown files in this directory,
    /// falling back to compiled-in defaults for any missing files.
    pub prompt_dir: Option<PathBuf>,
}

impl RagConfig {
    /// Creates a new builder for `RagConfig`.
    #[must_use]
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

/// Builder for [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    llm_model: Option<String>,
    agent_model: Option<String>,
    agent_temperature: Option<f32>,
    embedding_backend: Option<String>,
    embed_model: Option<String>,
    storage_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    similarity_top_k: Option<usize>,
    tool_top_k: Option<usize>,
    max_tool_iterations: Option<usize>,
    turn_timeout: Option<Duration>,
    max_tokens: Option<u32>,
    context_window: Option<usize>,
    max_concurrency: Option<usize>,
    embed_batch_size: Option<usize>,
    prompt_dir: Option<PathBuf>,
    without_llm: bool,
}

impl RagConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(self) -> Self {
        self.from_lookup(|key| std::env::var(key).ok())
    }

    /// Populates unset fields from `lookup`, keyed by environment variable name.
    ///
    /// Values that fail to parse are ignored.
    #[must_use]
    pub fn from_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        self.provider = self.provider.or_else(|| lookup("AGENTIC_RAG_PROVIDER"));
        self.api_key = self
            .api_key
            .or_else(|| lookup("OPENAI_API_KEY"))
            .or_else(|| lookup("AGENTIC_RAG_API_KEY"));
        self.base_url = self
            .base_url
            .or_else(|| lookup("OPENAI_BASE_URL"))
            .or_else(|| lookup("AGENTIC_RAG_BASE_URL"));
        self.llm_model = self.llm_model.or_else(|| lookup("AGENTIC_RAG_LLM_MODEL"));
        self.agent_model = self
            .agent_model
            .or_else(|| lookup("AGENTIC_RAG_AGENT_MODEL"));
        self.agent_temperature = self.agent_temperature.or_else(|| {
            parsed::<f32>(&lookup, "AGENTIC_RAG_AGENT_TEMPERATURE").filter(|t| t.is_finite())
        });
        self.embedding_backend = self
            .embedding_backend
            .or_else(|| lookup("AGENTIC_RAG_EMBEDDING_BACKEND"));
        self.embed_model = self
            .embed_model
            .or_else(|| lookup("AGENTIC_RAG_EMBED_MODEL"));
        self.storage_dir = self
            .storage_dir
            .or_else(|| lookup("AGENTIC_RAG_STORAGE_DIR").map(PathBuf::from));
        self.data_dir = self
            .data_dir
            .or_else(|| lookup("AGENTIC_RAG_DATA_DIR").map(PathBuf::from));
        self.chunk_size = self
            .chunk_size
            .or_else(|| parsed(&lookup, "AGENTIC_RAG_CHUNK_SIZE"));
        self.chunk_overlap = self
            .chunk_overlap
            .or_else(|| parsed(&lookup, "AGENTIC_RAG_CHUNK_OVERLAP"));
        self.similarity_top_k = self
            .similarity_top_k
            .or_else(|| parsed(&lookup, "AGENTIC_RAG_SIMILARITY_TOP_K"));
        self.tool_top_k = self
            .tool_top_k
            .or_else(|| parsed(&lookup, "AGENTIC_RAG_TOOL_TOP_K"));
        self.max_tool_iterations = self
            .max_tool_iterations
            .or_else(|| parsed(&lookup, "AGENTIC_RAG_MAX_TOOL_ITERATIONS"));
        self.turn_timeout = self.turn_timeout.or_else(|| {
            parsed::<u64>(&lookup, "AGENTIC_RAG_TURN_TIMEOUT_SECS").map(Duration::from_secs)
        });
        self.max_tokens = self
            .max_tokens
            .or_else(|| parsed(&lookup, "AGENTIC_RAG_MAX_TOKENS"));
        self.context_window = self
            .context_window
            .or_else(|| parsed(&lookup, "AGENTIC_RAG_CONTEXT_WINDOW"));
        self.max_concurrency = self
            .max_concurrency
            .or_else(|| parsed(&lookup, "AGENTIC_RAG_MAX_CONCURRENCY"));
        self.embed_batch_size = self
            .embed_batch_size
            .or_else(|| parsed(&lookup, "AGENTIC_RAG_EMBED_BATCH_SIZE"));
        self.prompt_dir = self
            .prompt_dir
            .or_else(|| lookup("AGENTIC_RAG_PROMPT_DIR").map(PathBuf::from));
        self
    }

    /// Marks the configuration as never calling a chat model.
    ///
    /// The API key is then only required by the `openai` embedding backend.
    #[must_use]
    pub const fn without_llm(mut self) -> Self {
        self.without_llm = true;
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the tool/router/synthesis model.
    #[must_use]
    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.llm_model = Some(model.into());
        self
    }

    /// Sets the agent model.
    #[must_use]
    pub fn agent_model(mut self, model: impl Into<String>) -> Self {
        self.agent_model = Some(model.into());
        self
    }

    /// Sets the agent sampling temperature.
    #[must_use]
    pub const fn agent_temperature(mut self, temperature: f32) -> Self {
        self.agent_temperature = Some(temperature);
        self
    }

    /// Sets the embedding backend.
    #[must_use]
    pub fn embedding_backend(mut self, backend: impl Into<String>) -> Self {
        self.embedding_backend = Some(backend.into());
        self
    }

    /// Sets the embedding model.
    #[must_use]
    pub fn embed_model(mut self, model: impl Into<String>) -> Self {
        self.embed_model = Some(model.into());
        self
    }

    /// Sets the index storage root.
    #[must_use]
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Sets the documents directory.
    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Sets the chunk size.
    #[must_use]
    pub const fn chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = Some(n);
        self
    }

    /// Sets the chunk overlap.
    #[must_use]
    pub const fn chunk_overlap(mut self, n: usize) -> Self {
        self.chunk_overlap = Some(n);
        self
    }

    /// Sets the nodes retrieved per vector query.
    #[must_use]
    pub const fn similarity_top_k(mut self, n: usize) -> Self {
        self.similarity_top_k = Some(n);
        self
    }

    /// Sets the tools retrieved per agent turn.
    #[must_use]
    pub const fn tool_top_k(mut self, n: usize) -> Self {
        self.tool_top_k = Some(n);
        self
    }

    /// Sets the maximum tool-calling loop iterations.
    #[must_use]
    pub const fn max_tool_iterations(mut self, n: usize) -> Self {
        self.max_tool_iterations = Some(n);
        self
    }

    /// Sets the per-turn timeout.
    #[must_use]
    pub const fn turn_timeout(mut self, duration: Duration) -> Self {
        self.turn_timeout = Some(duration);
        self
    }

    /// Sets the completion max tokens.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Sets the synthesis context window.
    #[must_use]
    pub const fn context_window(mut self, n: usize) -> Self {
        self.context_window = Some(n);
        self
    }

    /// Sets the maximum summarisation concurrency.
    #[must_use]
    pub const fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = Some(n);
        self
    }

    /// Sets the embedding batch size.
    #[must_use]
    pub const fn embed_batch_size(mut self, n: usize) -> Self {
        self.embed_batch_size = Some(n);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`RagConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set and
    /// one is needed.
    pub fn build(self) -> Result<RagConfig, AgentError> {
        let embedding_backend = self
            .embedding_backend
            .unwrap_or_else(|| "openai".to_string());
        let api_key = match self.api_key {
            Some(key) => key,
            None if self.without_llm && embedding_backend != "openai" => String::new(),
            None => return Err(AgentError::ApiKeyMissing),
        };

        Ok(RagConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            llm_model: self
                .llm_model
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            agent_model: self
                .agent_model
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            agent_temperature: self.agent_temperature.unwrap_or(0.0),
            embedding_backend,
            embed_model: self
                .embed_model
                .unwrap_or_else(|| DEFAULT_EMBED_MODEL.to_string()),
            storage_dir: self
                .storage_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR)),
            data_dir: self
                .data_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            chunk_size: self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            chunk_overlap: self.chunk_overlap.unwrap_or(DEFAULT_CHUNK_OVERLAP),
            similarity_top_k: self.similarity_top_k.unwrap_or(DEFAULT_SIMILARITY_TOP_K),
            tool_top_k: self.tool_top_k.unwrap_or(DEFAULT_TOOL_TOP_K),
            max_tool_iterations: self
                .max_tool_iterations
                .unwrap_or(DEFAULT_MAX_TOOL_ITERATIONS),
            turn_timeout: self
                .turn_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TURN_TIMEOUT_SECS)),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            context_window: self.context_window.unwrap_or(DEFAULT_CONTEXT_WINDOW),
            max_concurrency: self.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY),
            embed_batch_size: self.embed_batch_size.unwrap_or(DEFAULT_EMBED_BATCH_SIZE),
            prompt_dir: self.prompt_dir,
        })
    }
}
