use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Representation of a vector embedding
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Embedding { values }
    }

    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    /// Cosine distance (`1 - cosine similarity`); a zero vector has similarity 0
    pub fn cosine_distance(&self, other: &[f32]) -> f32 {
        let dot: f32 = self.values.iter().zip(other).map(|(a, b)| a * b).sum();
        let norm_a: f32 = self.values.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = other.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 1.0;
        }
        1.0 - dot / (norm_a * norm_b)
    }
}

/// Maps text to a fixed-dimensional vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a text
    async fn embed(&self, text: &str) -> Result<Embedding, ProviderError>;

    /// Generate embeddings for multiple texts, in input order.
    ///
    /// Calls [`embed`](EmbeddingProvider::embed) sequentially unless the
    /// backend batches natively.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, ProviderError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_distance() {
        let a = Embedding::new(vec![1.0, 0.0]);
        assert!(a.cosine_distance(&[2.0, 0.0]).abs() < 1e-6);
        assert!((a.cosine_distance(&[0.0, 3.0]) - 1.0).abs() < 1e-6);
        assert!((a.cosine_distance(&[-1.0, 0.0]) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_distance_zero_vector() {
        let zero = Embedding::new(vec![0.0, 0.0]);
        assert_eq!(zero.cosine_distance(&[1.0, 1.0]), 1.0);
    }
}
