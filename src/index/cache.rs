//! Load-or-build cache of per-document indexes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use super::{IndexKind, SummaryIndex, VectorIndex};
use crate::config::RagConfig;
use crate::core::{Document, Node};
use crate::embedding::Embedder;
use crate::error::IndexError;
use crate::ingest::{SentenceSplitter, load_document_nodes};

/// An index returned by [`IndexCache::load_or_create`].
#[derive(Debug, Clone)]
pub enum LoadedIndex {
    /// Vector index.
    Vector(Arc<VectorIndex>),
    /// Summary index.
    Summary(Arc<SummaryIndex>),
}

impl LoadedIndex {
    /// Kind of the wrapped index.
    #[must_use]
    pub const fn kind(&self) -> IndexKind {
        match self {
            Self::Vector(_) => IndexKind::Vector,
            Self::Summary(_) => IndexKind::Summary,
        }
    }
}

/// Persists indexes under a storage root, keyed by document name.
///
/// An existing directory is always loaded, never rebuilt or checked for
/// staleness.
#[derive(Clone)]
pub struct IndexCache {
    storage_dir: PathBuf,
    embedder: Arc<dyn Embedder>,
    embed_batch_size: usize,
    splitter: SentenceSplitter,
}

impl std::fmt::Debug for IndexCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexCache")
            .field("storage_dir", &self.storage_dir)
            .field("embedder", &self.embedder.model_name())
            .field("embed_batch_size", &self.embed_batch_size)
            .finish_non_exhaustive()
    }
}

impl IndexCache {
    /// Creates a cache from configuration.
    pub fn new(config: &RagConfig, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            storage_dir: config.storage_dir.clone(),
            embedder,
            embed_batch_size: config.embed_batch_size,
            splitter: SentenceSplitter::new(config.chunk_size, config.chunk_overlap),
        }
    }

    /// Storage root.
    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Embedder used for builds and queries.
    #[must_use]
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Persist directory for an index.
    #[must_use]
    pub fn index_dir(&self, kind: IndexKind, name: &str) -> PathBuf {
        self.storage_dir.join(kind.dir_name()).join(name)
    }

    /// Loads the `kind` index for `name`, building it from `nodes` when no
    /// persisted directory exists.
    ///
    /// # Errors
    ///
    /// - [`IndexError::InvalidKind`] if `kind` is not `vector` or `summary`
    /// - [`IndexError::MissingNodes`] if nothing is persisted and `nodes` is `None`
    /// - [`IndexError::KindMismatch`] if the directory holds another kind
    pub async fn load_or_create(
        &self,
        kind: &str,
        name: &str,
        nodes: Option<&[Node]>,
    ) -> Result<LoadedIndex, IndexError> {
        match kind.parse::<IndexKind>()? {
            IndexKind::Vector => self.vector_index(name, nodes).await.map(LoadedIndex::Vector),
            IndexKind::Summary => self.summary_index(name, nodes).map(LoadedIndex::Summary),
        }
    }

    /// Typed form of [`load_or_create`](Self::load_or_create) for vector indexes.
    pub async fn vector_index(
        &self,
        name: &str,
        nodes: Option<&[Node]>,
    ) -> Result<Arc<VectorIndex>, IndexError> {
        let dir = self.index_dir(IndexKind::Vector, name);
        if dir.exists() {
            info!(document = name, path = %dir.display(), "loading vector index");
            return VectorIndex::load(&dir).map(Arc::new);
        }

        let nodes = nodes.ok_or_else(|| IndexError::MissingNodes {
            kind: IndexKind::Vector.to_string(),
        })?;
        info!(document = name, nodes = nodes.len(), "building vector index");
        let index = VectorIndex::build(
            name,
            nodes.to_vec(),
            self.embedder.as_ref(),
            self.embed_batch_size,
        )
        .await?;
        index.persist(&dir)?;
        Ok(Arc::new(index))
    }

    /// Typed form of [`load_or_create`](Self::load_or_create) for summary indexes.
    pub fn summary_index(
        &self,
        name: &str,
        nodes: Option<&[Node]>,
    ) -> Result<Arc<SummaryIndex>, IndexError> {
        let dir = self.index_dir(IndexKind::Summary, name);
        if dir.exists() {
            info!(document = name, path = %dir.display(), "loading summary index");
            return SummaryIndex::load(&dir).map(Arc::new);
        }

        let nodes = nodes.ok_or_else(|| IndexError::MissingNodes {
            kind: IndexKind::Summary.to_string(),
        })?;
        info!(document = name, nodes = nodes.len(), "building summary index");
        let index = SummaryIndex::build(name, nodes.to_vec());
        index.persist(&dir)?;
        Ok(Arc::new(index))
    }

    /// Loads (or builds) both indexes for a document.
    ///
    /// The PDF is read and split only when at least one index directory is
    /// missing.
    pub async fn load_document_indexes(
        &self,
        document: &Document,
    ) -> Result<(Arc<VectorIndex>, Arc<SummaryIndex>), IndexError> {
        let name = document.name();
        let needs_nodes = !self.index_dir(IndexKind::Vector, name).exists()
            || !self.index_dir(IndexKind::Summary, name).exists();

        let nodes = if needs_nodes {
            Some(load_document_nodes(document, &self.splitter)?)
        } else {
            None
        };

        let vector = self.vector_index(name, nodes.as_deref()).await?;
        let summary = self.summary_index(name, nodes.as_deref())?;
        Ok((vector, summary))
    }
}
