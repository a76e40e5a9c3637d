//! Deterministic mock embedding provider.
//!
//! Produces [`synthetic_embedding`] vectors, so identical text always maps
//! to identical vectors and lexically similar texts score close under
//! cosine similarity, enough structure for end-to-end retrieval tests
//! without a live service. Availability and per-call failures can be
//! injected to exercise the coordinator's degradation paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::EmbeddingProvider;
use super::normalize::synthetic_embedding;
use crate::types::RagError;

const DEFAULT_DIMENSIONS: usize = 64;

pub struct MockEmbeddingProvider {
    dimensions: usize,
    available: AtomicBool,
    fail_from_call: Option<usize>,
    calls: AtomicUsize,
    successes: AtomicUsize,
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
            available: AtomicBool::new(true),
            fail_from_call: None,
            calls: AtomicUsize::new(0),
            successes: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Makes every `embed` call starting at the zero-based `index` fail.
    #[must_use]
    pub fn failing_from_call(mut self, index: usize) -> Self {
        self.fail_from_call = Some(index);
        self
    }

    #[must_use]
    pub fn unavailable(self) -> Self {
        self.available.store(false, Ordering::SeqCst);
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Total `embed` calls observed, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that returned a vector.
    pub fn successful_calls(&self) -> usize {
        self.successes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_from_call.is_some_and(|from| index >= from) {
            return Err(RagError::Embedding(format!(
                "simulated failure on call {index}"
            )));
        }
        self.successes.fetch_add(1, Ordering::SeqCst);
        Ok(synthetic_embedding(text, self.dimensions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_text_yields_identical_vectors() {
        let provider = MockEmbeddingProvider::new();
        let a = provider.embed("hello world").await.unwrap();
        let b = provider.embed("hello world").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_DIMENSIONS);
    }

    #[tokio::test]
    async fn fails_from_the_configured_call_onwards() {
        let provider = MockEmbeddingProvider::new().failing_from_call(2);
        assert!(provider.embed("one").await.is_ok());
        assert!(provider.embed("two").await.is_ok());
        assert!(provider.embed("three").await.is_err());
        assert!(provider.embed("four").await.is_err());
        assert_eq!(provider.calls(), 4);
        assert_eq!(provider.successful_calls(), 2);
    }

    #[tokio::test]
    async fn batch_fails_wholesale_on_a_single_item_failure() {
        let provider = MockEmbeddingProvider::new().failing_from_call(1);
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert!(provider.embed_batch(&texts).await.is_err());
    }

    #[tokio::test]
    async fn availability_toggle_is_observed() {
        let provider = MockEmbeddingProvider::new().unavailable();
        assert!(!provider.is_available().await);
        provider.set_available(true);
        assert!(provider.is_available().await);
    }
}
