//! # agentic-rag
//!
//! Agentic retrieval-augmented generation over PDF papers.
//!
//! Each document is split into page-tagged nodes and indexed twice: a
//! vector index for top-k retrieval and a summary index for whole-document
//! summarization. Both are persisted under a storage root and reloaded on
//! later runs. The indexes become per-document tools, used through:
//!
//! - a **router** that lets the LLM pick one tool per query
//! - **predict-and-call**, a single function-calling turn
//! - an **agent** that loops between the LLM and the tools until it has an
//!   answer, optionally retrieving the relevant tools from many papers
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use agentic_rag::agent::{AgentRunner, PromptSet, ToolFactory, ToolSource, create_provider};
//! use agentic_rag::core::Document;
//! use agentic_rag::embedding::create_embedder;
//! use agentic_rag::index::IndexCache;
//! use agentic_rag::query::Synthesizer;
//! use agentic_rag::RagConfig;
//!
//! # async fn run() -> agentic_rag::Result<()> {
//! let config = RagConfig::from_env()?;
//! let provider = create_provider(&config)?;
//! let cache = IndexCache::new(&config, create_embedder(&config)?);
//! let synthesizer = Synthesizer::new(Arc::clone(&provider), Arc::new(PromptSet::default()), &config);
//! let factory = ToolFactory::new(cache, synthesizer, config.similarity_top_k);
//!
//! let document = Document::new("data/metagpt.pdf");
//! let (vector, summary) = factory.doc_tools(&document, document.name()).await?;
//!
//! let mut agent = AgentRunner::new(provider, &config, ToolSource::Static(vec![vector, summary]));
//! let answer = agent.chat("Tell me about the agent roles in MetaGPT").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod core;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ingest;
pub mod query;

// Re-export commonly used types
pub use crate::config::RagConfig;
pub use crate::core::{Document, Node, Response, ScoredNode};
pub use crate::error::{AgentError, EmbeddingError, Error, IndexError, IngestError, Result};
pub use crate::index::{IndexCache, MetadataFilters, SummaryIndex, VectorIndex};
