use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use crate::chunking::{ChunkingConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::composer::AnswerComposer;
use crate::embeddings::EmbeddingProvider;
use crate::gemini::{GeminiClient, GeminiConfig};
use crate::openai::{OpenAiClient, OpenAiConfig};
use crate::rag::DEFAULT_TOP_K;

/// Backend used for both embeddings and answer generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    Openai,
    Gemini,
}

impl Provider {
    /// Build the configured backend, reading its credentials from the environment
    pub fn connect(self) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn AnswerComposer>)> {
        match self {
            Provider::Openai => {
                let client = Arc::new(OpenAiClient::new(OpenAiConfig::from_env()?));
                let embedder: Arc<dyn EmbeddingProvider> = client.clone();
                let composer: Arc<dyn AnswerComposer> = client;
                Ok((embedder, composer))
            }
            Provider::Gemini => {
                let client = Arc::new(GeminiClient::new(GeminiConfig::from_env()?));
                let embedder: Arc<dyn EmbeddingProvider> = client.clone();
                let composer: Arc<dyn AnswerComposer> = client;
                Ok((embedder, composer))
            }
        }
    }
}

/// Answers questions about a resume over HTTP using retrieval-augmented generation
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the document to index (text or PDF)
    #[arg(long, env = "RESUME_PATH", default_value = "public/resume.pdf")]
    pub document: PathBuf,

    /// Address to listen on
    #[arg(long, env = "RAG_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "RAG_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Embedding and language model backend
    #[arg(long, env = "RAG_PROVIDER", value_enum, default_value_t = Provider::Openai)]
    pub provider: Provider,

    /// Maximum chunk length in characters
    #[arg(long, env = "CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, env = "CHUNK_OVERLAP", default_value_t = DEFAULT_CHUNK_OVERLAP)]
    pub chunk_overlap: usize,

    /// Chunks retrieved per question
    #[arg(long, env = "TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Report failed model calls as 502 instead of 200 with an error body
    #[arg(long, env = "STRICT_ERRORS")]
    pub strict_errors: bool,
}

impl Args {
    pub fn chunking(&self) -> ChunkingConfig {
        ChunkingConfig::new(self.chunk_size, self.chunk_overlap)
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["resume-rag"]).unwrap();

        assert_eq!(args.listen_address(), "127.0.0.1:5000");
        assert_eq!(args.provider, Provider::Openai);
        assert_eq!(args.top_k, 3);
        assert!(!args.strict_errors);
        let chunking = args.chunking();
        assert_eq!(chunking.chunk_size, 1000);
        assert_eq!(chunking.chunk_overlap, 200);
        assert_eq!(chunking.separator, "\n");
    }

    #[test]
    fn test_connect_requires_api_key() {
        // single test so nothing else mutates these variables concurrently
        env::remove_var("OPENAI_API_KEY");
        env::remove_var("GEMINI_API_KEY");

        let err = Provider::Openai.connect().err().expect("missing key must fail");
        assert!(format!("{err:#}").contains("OPENAI_API_KEY"));

        let err = Provider::Gemini.connect().err().expect("missing key must fail");
        assert!(format!("{err:#}").contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "resume-rag",
            "--document",
            "cv.txt",
            "--provider",
            "gemini",
            "--port",
            "8080",
            "--chunk-size",
            "500",
            "--chunk-overlap",
            "50",
            "--strict-errors",
        ])
        .unwrap();

        assert_eq!(args.document, PathBuf::from("cv.txt"));
        assert_eq!(args.provider, Provider::Gemini);
        assert_eq!(args.port, 8080);
        assert_eq!(args.chunking().chunk_size, 500);
        assert!(args.strict_errors);
    }
}
