//! Nodes (document chunks) and query responses.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Metadata key holding the 1-based PDF page label.
pub const PAGE_LABEL_KEY: &str = "page_label";
/// Metadata key holding the source file name.
pub const FILE_NAME_KEY: &str = "file_name";
/// Metadata key holding the source file path.
pub const FILE_PATH_KEY: &str = "file_path";

/// A chunk of document text with positional metadata.
///
/// Nodes are produced once by the splitter and never mutated; indexes own
/// their copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Deterministic identifier (`{doc}-p{page}-{n}`).
    pub id: String,
    /// Chunk text.
    pub text: String,
    /// String metadata (`page_label`, `file_name`, `file_path`).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Node {
    /// Creates a node with empty metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The page label, if the node came from a paged document.
    #[must_use]
    pub fn page_label(&self) -> Option<&str> {
        self.metadata.get(PAGE_LABEL_KEY).map(String::as_str)
    }
}

/// A node returned by retrieval, with its similarity score when known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredNode {
    /// The retrieved node.
    pub node: Node,
    /// Cosine similarity to the query (absent for summary retrieval).
    pub score: Option<f32>,
}

/// A synthesized answer and the nodes it was built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    /// Answer text.
    pub response: String,
    /// Nodes used as context.
    pub source_nodes: Vec<ScoredNode>,
}

impl Response {
    /// Creates a response.
    pub fn new(response: impl Into<String>, source_nodes: Vec<ScoredNode>) -> Self {
        Self {
            response: response.into(),
            source_nodes,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.response)
    }
}
