use std::fmt;
use std::sync::Arc;

use log::{debug, info};

use crate::chunking::TextChunk;
use crate::embeddings::{Embedding, EmbeddingProvider};
use crate::error::{IndexBuildError, SearchError};

struct IndexEntry {
    chunk: TextChunk,
    embedding: Embedding,
}

/// A chunk returned by a search together with its distance to the query
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub chunk: &'a TextChunk,
    pub distance: f32,
}

/// Immutable index over every chunk of the document, searched by exhaustive
/// cosine-distance scan. Safe to share between handlers behind an `Arc`.
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
    provider: Arc<dyn EmbeddingProvider>,
}

impl fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorIndex")
            .field("chunks", &self.entries.len())
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl VectorIndex {
    /// Embed every chunk and build the index.
    ///
    /// All embeddings must share one non-zero dimensionality; the provider is
    /// kept so queries are embedded the same way.
    pub async fn build(
        chunks: Vec<TextChunk>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, IndexBuildError> {
        if chunks.is_empty() {
            return Err(IndexBuildError::NoChunks);
        }

        info!("Generating embeddings for {} chunks...", chunks.len());
        let texts: Vec<&str> = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
        let embeddings = provider
            .embed_batch(&texts)
            .await
            .map_err(IndexBuildError::Embedding)?;

        if embeddings.len() != chunks.len() {
            return Err(IndexBuildError::CountMismatch {
                expected: chunks.len(),
                found: embeddings.len(),
            });
        }

        let dimensions = embeddings[0].dimensions();
        if dimensions == 0 {
            return Err(IndexBuildError::EmptyEmbedding);
        }
        for (chunk, embedding) in embeddings.iter().enumerate() {
            if embedding.dimensions() != dimensions {
                return Err(IndexBuildError::DimensionMismatch {
                    chunk,
                    expected: dimensions,
                    found: embedding.dimensions(),
                });
            }
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();

        Ok(VectorIndex {
            entries,
            dimensions,
            provider,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed `query` and return the `k` nearest chunks, most relevant first
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit<'_>>, SearchError> {
        let query_embedding = self
            .provider
            .embed(query)
            .await
            .map_err(SearchError::Embedding)?;
        self.search_by_vector(&query_embedding.values, k)
    }

    /// Return the `k` chunks closest to `vector` by cosine distance.
    ///
    /// Equal distances keep insertion order.
    pub fn search_by_vector(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<SearchHit<'_>>, SearchError> {
        if vector.len() != self.dimensions {
            return Err(SearchError::DimensionMismatch {
                expected: self.dimensions,
                found: vector.len(),
            });
        }

        let mut hits: Vec<SearchHit<'_>> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                chunk: &entry.chunk,
                distance: entry.embedding.cosine_distance(vector),
            })
            .collect();

        // stable sort keeps insertion order among ties
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);

        debug!(
            "Retrieved {} chunk(s): {:?}",
            hits.len(),
            hits.iter()
                .map(|hit| (hit.chunk.chunk_index, hit.distance))
                .collect::<Vec<_>>()
        );
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Provenance;
    use crate::error::ProviderError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Looks up fixed vectors by text; unknown text is an API error
    struct TableEmbedder(HashMap<String, Vec<f32>>);

    impl TableEmbedder {
        fn new(pairs: &[(&str, Vec<f32>)]) -> Arc<Self> {
            Arc::new(TableEmbedder(
                pairs
                    .iter()
                    .map(|(text, values)| (text.to_string(), values.clone()))
                    .collect(),
            ))
        }
    }

    #[async_trait]
    impl EmbeddingProvider for TableEmbedder {
        async fn embed(&self, text: &str) -> Result<Embedding, ProviderError> {
            self.0
                .get(text)
                .cloned()
                .map(Embedding::new)
                .ok_or_else(|| ProviderError::Api {
                    status: 503,
                    body: format!("no vector for {text}"),
                })
        }
    }

    fn chunk(text: &str, chunk_index: usize) -> TextChunk {
        TextChunk {
            text: text.to_string(),
            provenance: Provenance {
                source: "cv.pdf".to_string(),
                page: chunk_index + 1,
            },
            start_position: 0,
            chunk_index,
        }
    }

    fn texts(hits: &[SearchHit<'_>]) -> Vec<String> {
        hits.iter().map(|hit| hit.chunk.text.clone()).collect()
    }

    async fn sample_index() -> VectorIndex {
        let provider = TableEmbedder::new(&[
            ("education", vec![1.0, 0.0, 0.0]),
            ("skills", vec![0.0, 1.0, 0.0]),
            ("experience", vec![0.0, 0.7, 0.7]),
            ("hobbies", vec![0.0, 0.0, 1.0]),
            ("languages?", vec![0.1, 1.0, 0.0]),
        ]);
        let chunks = vec![
            chunk("education", 0),
            chunk("skills", 1),
            chunk("experience", 2),
            chunk("hobbies", 3),
        ];
        VectorIndex::build(chunks, provider).await.unwrap()
    }

    #[tokio::test]
    async fn test_search_orders_by_distance() {
        let index = sample_index().await;
        assert_eq!(index.len(), 4);
        assert_eq!(index.dimensions(), 3);

        let hits = index.search("languages?", 3).await.unwrap();
        assert_eq!(texts(&hits), vec!["skills", "experience", "education"]);
        assert!(hits[0].distance <= hits[1].distance);
        assert!(hits[1].distance <= hits[2].distance);
    }

    #[tokio::test]
    async fn test_search_is_deterministic() {
        let index = sample_index().await;
        let first = texts(&index.search("languages?", 2).await.unwrap());
        let second = texts(&index.search("languages?", 2).await.unwrap());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let provider = TableEmbedder::new(&[
            ("a", vec![1.0, 0.0]),
            ("b", vec![1.0, 0.0]),
            ("c", vec![2.0, 0.0]),
        ]);
        let chunks = vec![chunk("a", 0), chunk("b", 1), chunk("c", 2)];
        let index = VectorIndex::build(chunks, provider).await.unwrap();

        let hits = index.search_by_vector(&[1.0, 0.0], 3).unwrap();
        assert_eq!(texts(&hits), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_k_larger_than_index() {
        let index = sample_index().await;
        let hits = index.search_by_vector(&[1.0, 1.0, 1.0], 10).unwrap();

        assert_eq!(hits.len(), 4);
        let mut indexes: Vec<usize> = hits.iter().map(|hit| hit.chunk.chunk_index).collect();
        indexes.sort_unstable();
        assert_eq!(indexes, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_k_zero_returns_nothing() {
        let index = sample_index().await;
        assert!(index.search_by_vector(&[1.0, 0.0, 0.0], 0).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch() {
        let index = sample_index().await;
        let err = index.search_by_vector(&[1.0, 0.0], 1).unwrap_err();
        assert!(matches!(
            err,
            SearchError::DimensionMismatch {
                expected: 3,
                found: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_query_embedding_failure() {
        let index = sample_index().await;
        let err = index.search("unknown question", 3).await.unwrap_err();
        assert!(matches!(err, SearchError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_build_rejects_mixed_dimensions() {
        let provider = TableEmbedder::new(&[("a", vec![1.0, 0.0]), ("b", vec![1.0, 0.0, 0.0])]);
        let err = VectorIndex::build(vec![chunk("a", 0), chunk("b", 1)], provider)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IndexBuildError::DimensionMismatch {
                chunk: 1,
                expected: 2,
                found: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_build_propagates_provider_failure() {
        let provider = TableEmbedder::new(&[("a", vec![1.0])]);
        let err = VectorIndex::build(vec![chunk("a", 0), chunk("missing", 1)], provider)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexBuildError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_build_rejects_zero_length_vectors() {
        let provider = TableEmbedder::new(&[("a", vec![]), ("b", vec![])]);
        let err = VectorIndex::build(vec![chunk("a", 0), chunk("b", 1)], provider)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexBuildError::EmptyEmbedding));
        assert_eq!(err.to_string(), "embedding provider returned an empty vector");
    }

    #[tokio::test]
    async fn test_build_rejects_empty_input() {
        let provider = TableEmbedder::new(&[]);
        let err = VectorIndex::build(Vec::new(), provider).await.unwrap_err();
        assert!(matches!(err, IndexBuildError::NoChunks));
    }
}
