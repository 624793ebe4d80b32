use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingBackend;
use crate::core::errors::ApiError;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_MS: u64 = 200;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Embedding backend speaking the Ollama `/api/embeddings` protocol.
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    pub fn new(base_url: String, model: String, dimensions: usize) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            dimensions,
        })
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.post(&url).json(&request).send().await {
                Ok(response) if response.status().is_success() => {
                    let payload: EmbeddingResponse = response
                        .json()
                        .await
                        .map_err(|e| ApiError::Internal(format!("invalid embedding response: {e}")))?;
                    if payload.embedding.len() != self.dimensions {
                        return Err(ApiError::Internal(format!(
                            "embedding dimension mismatch: expected {}, got {}",
                            self.dimensions,
                            payload.embedding.len()
                        )));
                    }
                    return Ok(payload.embedding);
                }
                Ok(response) => {
                    return Err(ApiError::Internal(format!(
                        "embedding request failed: status {}",
                        response.status()
                    )));
                }
                Err(err) if attempt < MAX_ATTEMPTS && (err.is_timeout() || err.is_connect()) => {
                    tracing::debug!("Embedding attempt {} failed: {}; retrying", attempt, err);
                    tokio::time::sleep(Duration::from_millis(BACKOFF_MS * attempt as u64)).await;
                }
                Err(err) => {
                    return Err(ApiError::Internal(format!(
                        "embedding request failed: {err}"
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl EmbeddingBackend for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        // Serial on purpose: result order must stay aligned with the input,
        // and the local embedding server handles one request at a time well.
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed_one(text).await?);
        }
        Ok(vectors)
    }
}
