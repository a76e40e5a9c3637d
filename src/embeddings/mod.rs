//! Embedding providers and the normalization contract.
//!
//! [`EmbeddingProvider`] is the boundary to an external embedding service:
//! it declares its dimensionality, answers a best-effort liveness probe, and
//! maps text to fixed-length vectors, singly or in batches. The pipeline
//! owns everything downstream of that boundary: normalization and the
//! synthetic fallback live in [`normalize`].

pub mod http;
pub mod mock;
pub mod normalize;

use async_trait::async_trait;

use crate::types::RagError;

pub use http::{HttpEmbeddingConfig, HttpEmbeddingProvider};
pub use mock::MockEmbeddingProvider;
pub use normalize::{normalize_l2, normalize_min_max, synthetic_embedding};

/// Boundary interface to an embedding service.
///
/// Implementations must not hang indefinitely: timeouts are the provider's
/// responsibility, and the coordinator treats a timeout like any other
/// per-item embedding failure.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Dimensionality of every vector this provider produces.
    fn dimensions(&self) -> usize;

    /// Best-effort liveness probe. Never errors; an unreachable service is
    /// simply reported as unavailable.
    async fn is_available(&self) -> bool;

    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;

    /// Embeds a batch of texts.
    ///
    /// On any per-item failure the whole batch fails; callers handle retries
    /// and fallback per item, not inside the provider.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}
