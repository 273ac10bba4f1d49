use std::path::PathBuf;

use thiserror::Error;

/// The source document could not be turned into segments.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to extract text from PDF {}: {message}", path.display())]
    Pdf { path: PathBuf, message: String },

    #[error("unsupported document format {mime_type} for {}; only text and PDF files are supported", path.display())]
    Unsupported { path: PathBuf, mime_type: String },

    #[error("document {} contains no text", .0.display())]
    Empty(PathBuf),
}

/// Invalid chunking parameters or input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("chunk size must be positive")]
    ZeroChunkSize,

    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },

    #[error("no segments to chunk")]
    NoSegments,
}

/// Failure talking to an embedding or generation backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure; the request URL is stripped before wrapping
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("API request failed: {status} {body}")]
    Api { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Request(err.without_url())
    }
}

/// The vector index could not be built.
#[derive(Debug, Error)]
pub enum IndexBuildError {
    #[error("nothing to index")]
    NoChunks,

    #[error("embedding provider failed")]
    Embedding(#[source] ProviderError),

    #[error("embedding provider returned an empty vector")]
    EmptyEmbedding,

    #[error("embedding provider returned {found} vectors for {expected} chunks")]
    CountMismatch { expected: usize, found: usize },

    #[error("embedding for chunk {chunk} has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        chunk: usize,
        expected: usize,
        found: usize,
    },
}

/// A similarity search could not be run.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("failed to embed query: {0}")]
    Embedding(#[source] ProviderError),

    #[error("query embedding has {found} dimensions, index has {expected}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// Per-request failure of the query service.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("No question provided")]
    Validation,

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] SearchError),

    #[error("answer composition failed: {0}")]
    Composition(#[source] ProviderError),
}
