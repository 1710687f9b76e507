//! Summary index: every node of a document, in order.

use std::path::Path;

use super::{IndexKind, IndexMeta, META_FILE, NODES_FILE, create_dir, read_json, read_meta, write_json};
use crate::core::{Node, ScoredNode};
use crate::error::IndexError;

/// Ordered list of a document's nodes. Retrieval returns all of them.
#[derive(Debug, Clone)]
pub struct SummaryIndex {
    document: String,
    nodes: Vec<Node>,
}

impl SummaryIndex {
    /// Builds the index. No embedding calls are made.
    #[must_use]
    pub fn build(document: &str, nodes: Vec<Node>) -> Self {
        Self {
            document: document.to_string(),
            nodes,
        }
    }

    /// Document name.
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    /// All nodes, in document order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All nodes as unscored retrieval results.
    #[must_use]
    pub fn retrieve_all(&self) -> Vec<ScoredNode> {
        self.nodes
            .iter()
            .map(|node| ScoredNode {
                node: node.clone(),
                score: None,
            })
            .collect()
    }

    /// Writes the index to `dir`, creating it if needed.
    pub fn persist(&self, dir: &Path) -> Result<(), IndexError> {
        create_dir(dir)?;
        write_json(&dir.join(NODES_FILE), &self.nodes)?;
        write_json(
            &dir.join(META_FILE),
            &IndexMeta {
                kind: IndexKind::Summary,
                document: self.document.clone(),
                node_count: self.nodes.len(),
                embed_model: None,
                dimensions: None,
            },
        )
    }

    /// Loads an index previously written by [`persist`](Self::persist).
    pub fn load(dir: &Path) -> Result<Self, IndexError> {
        let meta = read_meta(dir, IndexKind::Summary)?;
        let nodes = read_json(&dir.join(NODES_FILE))?;
        Ok(Self {
            document: meta.document,
            nodes,
        })
    }
}
