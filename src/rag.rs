use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

use crate::chunking::TextChunk;
use crate::composer::AnswerComposer;
use crate::error::QueryError;
use crate::index::VectorIndex;

/// Number of chunks handed to the composer
pub const DEFAULT_TOP_K: usize = 3;

/// A composed answer and the pages it was grounded on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<String>,
}

/// RAG (Retrieval-Augmented Generation) engine
pub struct RagEngine {
    index: Arc<VectorIndex>,
    composer: Arc<dyn AnswerComposer>,
    top_k: usize,
}

impl RagEngine {
    /// Create a new RAG engine
    pub fn new(index: Arc<VectorIndex>, composer: Arc<dyn AnswerComposer>) -> Self {
        RagEngine {
            index,
            composer,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Override how many chunks are retrieved per question (at least one)
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Answer a question from the indexed document
    pub async fn answer(&self, question: &str) -> Result<Answer, QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::Validation);
        }

        // Retrieve relevant chunks
        let hits = self.index.search(question, self.top_k).await?;
        let chunks: Vec<&TextChunk> = hits.iter().map(|hit| hit.chunk).collect();
        debug!(
            "Question {:?} matched {}",
            question,
            chunks
                .iter()
                .map(|chunk| chunk.provenance.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        // Generate answer
        let composition = self
            .composer
            .compose(question, &chunks)
            .await
            .map_err(QueryError::Composition)?;

        let sources = cited_sources(&chunks, &composition.cited);
        info!("Answered question using pages {:?}", sources);

        Ok(Answer {
            answer: composition.answer,
            sources,
        })
    }
}

/// Distinct provenance ids in citation order, or retrieval order when
/// nothing valid was cited.
fn cited_sources(chunks: &[&TextChunk], cited: &[usize]) -> Vec<String> {
    let mut ordered: Vec<&TextChunk> = cited
        .iter()
        .filter_map(|&i| chunks.get(i).copied())
        .collect();
    if ordered.is_empty() {
        ordered = chunks.to_vec();
    }

    let mut sources: Vec<String> = Vec::new();
    for chunk in ordered {
        let id = chunk.provenance.id();
        if !sources.contains(&id) {
            sources.push(id);
        }
    }
    sources
}
