//! Vector index: nodes plus one embedding per node, cosine top-k retrieval.

use std::path::Path;

use rayon::prelude::*;
use tracing::debug;

use super::{
    EMBEDDINGS_FILE, IndexKind, IndexMeta, META_FILE, MetadataFilters, NODES_FILE, create_dir,
    read_json, read_meta, write_json,
};
use crate::core::{Node, ScoredNode};
use crate::embedding::{Embedder, cosine_similarity, embed_all};
use crate::error::{EmbeddingError, IndexError};

/// Immutable vector index over one document's nodes.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    document: String,
    embed_model: String,
    nodes: Vec<Node>,
    embeddings: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Embeds `nodes` in batches and builds the index.
    pub async fn build(
        document: &str,
        nodes: Vec<Node>,
        embedder: &dyn Embedder,
        batch_size: usize,
    ) -> Result<Self, IndexError> {
        let texts: Vec<String> = nodes.iter().map(|n| n.text.clone()).collect();
        let embeddings = embed_all(embedder, &texts, batch_size).await?;
        debug!(
            document,
            nodes = nodes.len(),
            model = embedder.model_name(),
            "vector index built"
        );
        Ok(Self {
            document: document.to_string(),
            embed_model: embedder.model_name().to_string(),
            nodes,
            embeddings,
        })
    }

    /// Document name.
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Embedding model recorded at build time.
    #[must_use]
    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }

    /// Indexed nodes, in build order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Embedding dimensionality, `None` for an empty index.
    #[must_use]
    pub fn dimensions(&self) -> Option<usize> {
        self.embeddings.first().map(Vec::len)
    }

    /// Writes the index to `dir`, creating it if needed.
    pub fn persist(&self, dir: &Path) -> Result<(), IndexError> {
        create_dir(dir)?;
        write_json(&dir.join(NODES_FILE), &self.nodes)?;
        write_json(&dir.join(EMBEDDINGS_FILE), &self.embeddings)?;
        write_json(
            &dir.join(META_FILE),
            &IndexMeta {
                kind: IndexKind::Vector,
                document: self.document.clone(),
                node_count: self.nodes.len(),
                embed_model: Some(self.embed_model.clone()),
                dimensions: self.dimensions(),
            },
        )
    }

    /// Loads an index previously written by [`persist`](Self::persist).
    pub fn load(dir: &Path) -> Result<Self, IndexError> {
        let meta = read_meta(dir, IndexKind::Vector)?;
        let nodes: Vec<Node> = read_json(&dir.join(NODES_FILE))?;
        let embeddings: Vec<Vec<f32>> = read_json(&dir.join(EMBEDDINGS_FILE))?;
        if nodes.len() != embeddings.len() {
            return Err(IndexError::Corrupt {
                path: dir.to_path_buf(),
                message: format!(
                    "{} nodes but {} embeddings",
                    nodes.len(),
                    embeddings.len()
                ),
            });
        }
        Ok(Self {
            document: meta.document,
            embed_model: meta.embed_model.unwrap_or_default(),
            nodes,
            embeddings,
        })
    }

    /// Returns the `top_k` nodes most similar to `query_embedding` among
    /// those passing `filters`, highest score first.
    pub fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filters: Option<&MetadataFilters>,
    ) -> Result<Vec<ScoredNode>, IndexError> {
        if let Some(expected) = self.dimensions()
            && expected != query_embedding.len()
        {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: query_embedding.len(),
            }
            .into());
        }

        let mut scored: Vec<(usize, f32)> = self
            .nodes
            .par_iter()
            .zip(self.embeddings.par_iter())
            .enumerate()
            .filter(|(_, (node, _))| filters.is_none_or(|f| f.matches(node)))
            .map(|(i, (_, embedding))| (i, cosine_similarity(query_embedding, embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredNode {
                node: self.nodes[i].clone(),
                score: Some(score),
            })
            .collect())
    }

    /// Embeds `query` and retrieves the `top_k` most similar nodes.
    pub async fn retrieve(
        &self,
        embedder: &dyn Embedder,
        query: &str,
        top_k: usize,
        filters: Option<&MetadataFilters>,
    ) -> Result<Vec<ScoredNode>, IndexError> {
        let query_embedding = embedder.embed_query(query).await?;
        let results = self.search(&query_embedding, top_k, filters)?;
        debug!(
            document = %self.document,
            top_k,
            filtered = filters.is_some(),
            hits = results.len(),
            "vector retrieval"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PAGE_LABEL_KEY;
    use crate::embedding::HashEmbedder;

    fn sample_nodes() -> Vec<Node> {
        vec![
            Node::new("d-p1-0", "MetaGPT assigns roles to agents like a software company")
                .with_metadata(PAGE_LABEL_KEY, "1"),
            Node::new("d-p2-0", "The evaluation dataset includes HumanEval and MBPP")
                .with_metadata(PAGE_LABEL_KEY, "2"),
            Node::new("d-p3-0", "Evaluation results show higher pass rates")
                .with_metadata(PAGE_LABEL_KEY, "3"),
        ]
    }

    async fn sample_index() -> VectorIndex {
        VectorIndex::build("d", sample_nodes(), &HashEmbedder::default(), 2)
            .await
            .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn test_retrieve_top_k() {
        let index = sample_index().await;
        let hits = index
            .retrieve(&HashEmbedder::default(), "evaluation dataset", 2, None)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].node.id, "d-p2-0");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_retrieve_with_page_filter() {
        let index = sample_index().await;
        let filters = MetadataFilters::page_numbers(&["1".to_string(), "3".to_string()]);
        let hits = index
            .retrieve(&HashEmbedder::default(), "evaluation dataset", 5, filters.as_ref())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.node.page_label() != Some("2")));
    }

    #[tokio::test]
    async fn test_persist_and_load() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        let index = sample_index().await;
        index.persist(dir.path()).unwrap_or_else(|_| unreachable!());

        let loaded = VectorIndex::load(dir.path()).unwrap_or_else(|_| unreachable!());
        assert_eq!(loaded.document(), "d");
        assert_eq!(loaded.embed_model(), "hash");
        assert_eq!(loaded.nodes(), index.nodes());
        assert_eq!(loaded.dimensions(), index.dimensions());
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let index = sample_index().await;
        let result = index.search(&[1.0, 0.0], 2, None);
        assert!(matches!(
            result,
            Err(IndexError::Embedding(EmbeddingError::DimensionMismatch { .. }))
        ));
    }

    #[tokio::test]
    async fn test_load_rejects_mismatched_counts() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        sample_index()
            .await
            .persist(dir.path())
            .unwrap_or_else(|_| unreachable!());
        write_json(&dir.path().join(EMBEDDINGS_FILE), &Vec::<Vec<f32>>::new())
            .unwrap_or_else(|_| unreachable!());
        assert!(matches!(
            VectorIndex::load(dir.path()),
            Err(IndexError::Corrupt { .. })
        ));
    }
}
