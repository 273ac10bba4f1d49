use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::env;

use crate::chunking::TextChunk;
use crate::composer::{build_prompt, parse_reply, AnswerComposer, Composition};
use crate::embeddings::{Embedding, EmbeddingProvider};
use crate::error::ProviderError;

const DEFAULT_EMBEDDINGS_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/text-embedding-004:embedContent";
const DEFAULT_GENERATE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";
const EMBEDDING_MODEL: &str = "models/text-embedding-004";
/// Keeps the key out of request URLs, which show up in transport errors
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Configuration for Gemini API
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub embeddings_url: String,
    pub generate_url: String,
}

impl GeminiConfig {
    /// Create a new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("GEMINI_API_KEY").context("Missing GEMINI_API_KEY")?;
        let embeddings_url = env::var("GEMINI_EMBEDDINGS_URL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDINGS_URL.to_string());
        let generate_url =
            env::var("GEMINI_GENERATE_URL").unwrap_or_else(|_| DEFAULT_GENERATE_URL.to_string());

        Ok(GeminiConfig {
            api_key,
            embeddings_url,
            generate_url,
        })
    }
}

/// Client for interacting with Gemini API
#[derive(Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: GeminiConfig) -> Self {
        let client = reqwest::Client::new();
        GeminiClient { config, client }
    }

    /// Generate text using the configured Gemini model
    pub async fn generate_text(
        &self,
        prompt: &str,
        temperature: f32,
        max_output_tokens: i32,
    ) -> Result<String, ProviderError> {
        let request = GenerateRequest {
            contents: vec![Content::new_with_role(prompt, "user")],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens,
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(&self.config.generate_url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let body = response.text().await?;
        parse_generate_response(&body)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Embedding, ProviderError> {
        let request = EmbeddingRequest {
            model: EMBEDDING_MODEL,
            content: EmbeddingContent {
                parts: vec![Part { text }],
            },
        };

        let response = self
            .client
            .post(&self.config.embeddings_url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let body = response.text().await?;
        let response_data: EmbeddingResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Malformed(format!("embedding response: {e}")))?;

        Ok(Embedding::new(response_data.embedding.values))
    }
}

#[async_trait]
impl AnswerComposer for GeminiClient {
    async fn compose(
        &self,
        question: &str,
        context: &[&TextChunk],
    ) -> Result<Composition, ProviderError> {
        let prompt = build_prompt(question, context);
        let reply = self.generate_text(&prompt, 0.0, 1024).await?;
        debug!("Gemini reply: {}", reply);
        parse_reply(&reply, context.len())
    }
}

/// Extract the generated text from a `generateContent` response body
fn parse_generate_response(body: &str) -> Result<String, ProviderError> {
    let response_data: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("generate response: {e}")))?;

    response_data
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text)
        .ok_or_else(|| ProviderError::Malformed("No response generated".to_string()))
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'static str,
    content: EmbeddingContent<'a>,
}

#[derive(Serialize)]
struct EmbeddingContent<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Deserialize, Debug)]
struct EmbeddingResponse {
    embedding: EmbeddingData,
}

#[derive(Deserialize, Debug)]
struct EmbeddingData {
    values: Vec<f32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
    role: &'static str,
}

impl<'a> Content<'a> {
    fn new_with_role(text: &'a str, role: &'static str) -> Self {
        Content {
            parts: vec![Part { text }],
            role,
        }
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: i32,
    response_mime_type: &'static str,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize, Debug)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: String,
}
