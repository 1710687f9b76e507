//! Per-document indexes and their on-disk cache.
//!
//! Each document gets two indexes, persisted under the storage root:
//!
//! ```text
//! {storage}/vector_index/{doc}/   nodes.json, embeddings.json, index_meta.json
//! {storage}/summary_index/{doc}/  nodes.json, index_meta.json
//! ```
//!
//! A directory that exists is loaded as-is. There is no staleness check.

mod cache;
mod filters;
mod summary;
mod vector;

pub use cache::{IndexCache, LoadedIndex};
pub use filters::{FilterCondition, FilterOperator, MetadataFilter, MetadataFilters};
pub use summary::SummaryIndex;
pub use vector::VectorIndex;

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::IndexError;

pub(crate) const NODES_FILE: &str = "nodes.json";
pub(crate) const EMBEDDINGS_FILE: &str = "embeddings.json";
pub(crate) const META_FILE: &str = "index_meta.json";

/// Kind of per-document index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Embedding index for top-k retrieval.
    Vector,
    /// Ordered list of all nodes for summarization.
    Summary,
}

impl IndexKind {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Summary => "summary",
        }
    }

    /// Directory under the storage root holding indexes of this kind.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Vector => "vector_index",
            Self::Summary => "summary_index",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKind {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vector" => Ok(Self::Vector),
            "summary" => Ok(Self::Summary),
            other => Err(IndexError::InvalidKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// Contents of `index_meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    /// Index kind.
    pub kind: IndexKind,
    /// Document name the index was built from.
    pub document: String,
    /// Number of nodes.
    pub node_count: usize,
    /// Embedding model, vector indexes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_model: Option<String>,
    /// Embedding dimensionality, vector indexes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, IndexError> {
    let bytes = fs::read(path).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| IndexError::Serde {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), IndexError> {
    let bytes = serde_json::to_vec(value).map_err(|source| IndexError::Serde {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, bytes).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads `index_meta.json` and checks the recorded kind.
pub(crate) fn read_meta(dir: &Path, expected: IndexKind) -> Result<IndexMeta, IndexError> {
    let path = dir.join(META_FILE);
    if !path.exists() {
        return Err(IndexError::Corrupt {
            path: dir.to_path_buf(),
            message: format!("missing {META_FILE}"),
        });
    }
    let meta: IndexMeta = read_json(&path)?;
    if meta.kind != expected {
        return Err(IndexError::KindMismatch {
            path: dir.to_path_buf(),
            expected: expected.to_string(),
            found: meta.kind.to_string(),
        });
    }
    Ok(meta)
}

pub(crate) fn create_dir(dir: &Path) -> Result<(), IndexError> {
    fs::create_dir_all(dir).map_err(|source| IndexError::Io {
        path: dir.to_path_buf(),
        source,
    })
}
