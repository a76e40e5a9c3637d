//! HTTP embedding provider for Ollama-style endpoints.
//!
//! Speaks the two-call contract the pipeline needs from a remote embedding
//! service: `GET /api/tags` as a liveness probe and `POST /api/embed` for
//! batch embedding. Request timeouts are set on the client so a stalled
//! service surfaces as a per-item failure instead of hanging the build.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use super::EmbeddingProvider;
use crate::types::RagError;

/// Configuration for [`HttpEmbeddingProvider`].
#[derive(Clone, Debug)]
pub struct HttpEmbeddingConfig {
    /// Base URL of the embedding service.
    pub base_url: Url,
    /// Model name sent with every embed request.
    pub model: String,
    /// Expected embedding dimensionality; responses are validated against it.
    pub dimensions: usize,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HttpEmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:11434").expect("static url"),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Embedding provider backed by an HTTP service.
#[derive(Clone)]
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    config: HttpEmbeddingConfig,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl HttpEmbeddingProvider {
    pub fn new(config: HttpEmbeddingConfig) -> Result<Self, RagError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpEmbeddingConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> Result<Url, RagError> {
        self.config
            .base_url
            .join(path)
            .map_err(|err| RagError::Config(format!("invalid endpoint {path}: {err}")))
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    async fn is_available(&self) -> bool {
        let Ok(endpoint) = self.endpoint("/api/tags") else {
            return false;
        };
        match self.client.get(endpoint).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(error = %err, "availability probe failed");
                false
            }
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let input = [text.to_string()];
        let mut vectors = self.embed_batch(&input).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Embedding("service returned no embedding".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        trace!(batch = texts.len(), model = %self.config.model, "requesting embeddings");

        let response = self
            .client
            .post(self.endpoint("/api/embed")?)
            .json(&EmbedRequest {
                model: &self.config.model,
                input: texts,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: EmbedResponse = response.json().await?;
        if body.embeddings.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "service returned {} embeddings for {} inputs",
                body.embeddings.len(),
                texts.len()
            )));
        }
        for vector in &body.embeddings {
            if vector.len() != self.config.dimensions {
                return Err(RagError::VectorDimension {
                    got: vector.len(),
                    want: self.config.dimensions,
                });
            }
        }
        Ok(body.embeddings)
    }
}
