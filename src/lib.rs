pub mod chunking;
pub mod composer;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod error;
pub mod gemini;
pub mod index;
pub mod openai;
pub mod rag;
pub mod server;
