//! Error types for agentic-rag.
//!
//! Each layer owns a `thiserror` enum; [`Error`] aggregates them for the
//! CLI and library entry points.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Index cache or persistence failure.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Document loading failure.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Embedding backend failure.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// LLM, tool, or agent loop failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// CLI command failure.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Raw I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the index cache.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The requested index kind is not `vector` or `summary`.
    #[error("Invalid index type specified: {kind}")]
    InvalidKind {
        /// The rejected kind string.
        kind: String,
    },

    /// No persisted index exists and no nodes were supplied to build one.
    #[error("Nodes must be provided to create the {kind} index.")]
    MissingNodes {
        /// Kind of index that could not be built.
        kind: String,
    },

    /// The persisted directory holds a different index kind.
    #[error("index at {path} is a {found} index, expected {expected}")]
    KindMismatch {
        /// Persist directory.
        path: PathBuf,
        /// Requested kind.
        expected: String,
        /// Kind recorded on disk.
        found: String,
    },

    /// Persisted files are missing or inconsistent.
    #[error("corrupt index at {path}: {message}")]
    Corrupt {
        /// Persist directory.
        path: PathBuf,
        /// What was wrong.
        message: String,
    },

    /// Reading or writing the persist directory failed.
    #[error("index I/O error at {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization of index files failed.
    #[error("index serialization error at {path}: {source}")]
    Serde {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Embedding the nodes or the query failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The source document could not be loaded for a first build.
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Errors raised while reading and splitting documents.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file could not be opened or mapped.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Document path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The PDF could not be parsed.
    #[error("failed to parse PDF {path}: {message}")]
    PdfParse {
        /// Document path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// No text could be extracted from any page.
    #[error("no text content extracted from {path}")]
    Empty {
        /// Document path.
        path: PathBuf,
    },
}

/// Errors raised by embedding backends.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The backend name is not recognised (or not compiled in).
    #[error("unsupported embedding backend: {name}")]
    UnsupportedBackend {
        /// Requested backend.
        name: String,
    },

    /// The backend returned an error.
    #[error("embedding request failed: {message}")]
    Request {
        /// Backend message.
        message: String,
    },

    /// The backend returned a different number of vectors than inputs.
    #[error("embedding count mismatch: sent {expected} inputs, received {actual} vectors")]
    CountMismatch {
        /// Inputs sent.
        expected: usize,
        /// Vectors received.
        actual: usize,
    },

    /// A vector's dimensionality does not match the index.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Index dimensionality.
        expected: usize,
        /// Query dimensionality.
        actual: usize,
    },
}

/// Errors raised by the LLM provider, tools, router, and agent loop.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key configured.
    #[error("API key missing: set OPENAI_API_KEY or AGENTIC_RAG_API_KEY")]
    ApiKeyMissing,

    /// Provider name not recognised.
    #[error("unsupported LLM provider: {name}")]
    UnsupportedProvider {
        /// Requested provider.
        name: String,
    },

    /// The chat completion request failed.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Provider message.
        message: String,
        /// HTTP status, when known.
        status: Option<u16>,
    },

    /// The model's response could not be parsed.
    #[error("{message}")]
    ResponseParse {
        /// What went wrong.
        message: String,
        /// Raw model output.
        content: String,
    },

    /// The selector picked a choice that does not exist.
    #[error("invalid selection: choice {choice} out of range 1..={num_choices}")]
    Selection {
        /// 1-based choice returned by the model.
        choice: usize,
        /// Number of choices offered.
        num_choices: usize,
    },

    /// A tool failed while executing. Folded back into the conversation by
    /// the agent loop.
    #[error("tool '{name}' failed: {message}")]
    ToolExecution {
        /// Tool name.
        name: String,
        /// Failure message.
        message: String,
    },

    /// The model sent arguments that are not JSON, or too many of them.
    #[error("malformed arguments for tool '{name}': {message}")]
    ToolArguments {
        /// Tool name.
        name: String,
        /// Parse failure.
        message: String,
    },

    /// The model called a tool that was not offered.
    #[error("Tool with name {name} not found")]
    UnknownTool {
        /// Requested tool name.
        name: String,
    },

    /// The model requested no tool call where one was required.
    #[error("Expected at least one tool call, but got 0 tool calls.")]
    NoToolCall,

    /// The agent loop hit its iteration cap.
    #[error("tool-calling loop exceeded {max_iterations} iterations")]
    ToolLoopExceeded {
        /// Configured cap.
        max_iterations: usize,
    },

    /// The turn did not finish within the configured timeout.
    #[error("agent turn timed out after {seconds}s")]
    Timeout {
        /// Configured timeout in seconds.
        seconds: u64,
    },

    /// Fan-out task failure.
    #[error("orchestration error: {message}")]
    Orchestration {
        /// What went wrong.
        message: String,
    },

    /// Retrieval or index failure underneath a tool.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not run.
    #[error("{0}")]
    ExecutionFailed(String),

    /// A flag or argument was invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
