use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use log::{error, info};
use std::sync::Arc;

use resume_rag::chunking::split_segments;
use resume_rag::config::Args;
use resume_rag::document::Document;
use resume_rag::index::VectorIndex;
use resume_rag::rag::RagEngine;
use resume_rag::server::{build_router, serve, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    // Credentials first, so a missing key fails before any work is done
    let (embedder, composer) = args
        .provider
        .connect()
        .context("Failed to configure model provider")?;

    info!("Processing file: {}", args.document.display());
    let document = Document::from_file(&args.document).context("Failed to load document")?;
    info!("Document type: {}", document.mime_type);

    let chunks = split_segments(&document.segments, &args.chunking())
        .context("Failed to chunk document")?;
    info!("Split into {} chunks", chunks.len());

    let index = VectorIndex::build(chunks, embedder)
        .await
        .context("Failed to build vector index")?;
    info!(
        "Indexed {} chunks of {} ({} dimensions)",
        index.len(),
        document.document_id,
        index.dimensions()
    );

    let engine = RagEngine::new(Arc::new(index), composer).with_top_k(args.top_k);
    let state = AppState::new(Arc::new(engine), args.strict_errors);

    let listener = tokio::net::TcpListener::bind(args.listen_address())
        .await
        .with_context(|| format!("Failed to bind {}", args.listen_address()))?;

    serve(listener, build_router(state))
        .await
        .context("Server error")?;

    Ok(())
}
