use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::env;

use crate::chunking::TextChunk;
use crate::composer::{build_prompt, parse_reply, AnswerComposer, Composition};
use crate::embeddings::{Embedding, EmbeddingProvider};
use crate::error::ProviderError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// Inputs per embeddings request
const EMBEDDING_BATCH_SIZE: usize = 96;

/// Configuration for the OpenAI API
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
}

impl OpenAiConfig {
    /// Create a new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY").context("Missing OPENAI_API_KEY")?;
        let base_url = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let embedding_model = env::var("OPENAI_EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string());
        let chat_model =
            env::var("OPENAI_CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());

        Ok(OpenAiConfig {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            embedding_model,
            chat_model,
        })
    }
}

/// Client for the OpenAI embeddings and chat completions endpoints
#[derive(Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = reqwest::Client::new();
        OpenAiClient { config, client }
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/{}", self.config.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body: detail,
            });
        }

        Ok(response.text().await?)
    }

    async fn embed_request(&self, input: &[&str]) -> Result<Vec<Embedding>, ProviderError> {
        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            input,
        };
        let body = self.post("embeddings", &request).await?;
        parse_embedding_response(&body, input.len())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Embedding, ProviderError> {
        self.embed_request(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Malformed("API returned empty response".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, ProviderError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBEDDING_BATCH_SIZE) {
            debug!("Embedding batch of {} texts", batch.len());
            embeddings.extend(self.embed_request(batch).await?);
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl AnswerComposer for OpenAiClient {
    async fn compose(
        &self,
        question: &str,
        context: &[&TextChunk],
    ) -> Result<Composition, ProviderError> {
        let prompt = build_prompt(question, context);
        let request = ChatRequest {
            model: &self.config.chat_model,
            temperature: 0.0,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let body = self.post("chat/completions", &request).await?;
        let reply = parse_chat_response(&body)?;
        debug!("OpenAI reply: {}", reply);
        parse_reply(&reply, context.len())
    }
}

/// Order embeddings by their `index` and check one came back per input
fn parse_embedding_response(body: &str, expected: usize) -> Result<Vec<Embedding>, ProviderError> {
    let mut response: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("embedding response: {e}")))?;

    if response.data.len() != expected {
        return Err(ProviderError::Malformed(format!(
            "expected {} embeddings, got {}",
            expected,
            response.data.len()
        )));
    }

    response.data.sort_by_key(|d| d.index);
    Ok(response
        .data
        .into_iter()
        .map(|d| Embedding::new(d.embedding))
        .collect())
}

fn parse_chat_response(body: &str) -> Result<String, ProviderError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("chat response: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::Malformed("No response generated".to_string()))
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}
