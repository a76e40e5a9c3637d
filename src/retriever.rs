//! Build coordinator and query path.
//!
//! [`Retriever`] orchestrates the full pipeline. A build runs as one
//! sequential task (load documents, chunk, embed, normalize, persist)
//! with the injected [`ProgressTracker`] recording each phase. Queries are
//! independent of builds: embed the query, normalize it with the same
//! convention used at build time, and delegate to the store's search.
//!
//! Embedding degradation is one-way per build: the first per-item provider
//! failure flips [`ProviderHealth`] to `Degraded`, and every remaining chunk
//! in that build gets a deterministic synthetic embedding instead. The real
//! provider is never retried mid-build, so a store generation is either
//! fully real or degrades wholesale from the failure point, never an
//! unpredictable mix. Query-time embedding has no such fallback: a degraded
//! query vector silently returning wrong neighbors is worse than a visible
//! error.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::chunking::{Chunker, ChunkingConfig};
use crate::embeddings::{EmbeddingProvider, normalize_min_max, synthetic_embedding};
use crate::ingestion::load_documents;
use crate::progress::{BuildPhase, ProgressTracker};
use crate::stores::{StoreStats, VectorStore};
use crate::types::{RagError, RetrievedChunk, TextChunk};

/// Default number of results returned by a query.
pub const DEFAULT_TOP_K: usize = 5;

/// Health of the embedding provider across one build, folded through the
/// per-chunk embedding step. Once `Degraded`, it stays `Degraded` for the
/// remainder of the build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderHealth {
    Healthy,
    Degraded,
}

/// Final stats of a completed build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    /// Documents loaded from the source directory.
    pub documents: usize,
    /// Chunks embedded and persisted.
    pub chunks: usize,
    /// Whether the build fell back to synthetic embeddings partway through.
    pub degraded: bool,
}

/// Orchestrates knowledge-base builds and similarity queries.
pub struct Retriever {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    chunker: Chunker,
    progress: ProgressTracker,
}

impl Retriever {
    pub fn builder() -> RetrieverBuilder {
        RetrieverBuilder::default()
    }

    /// Handle onto the current build's progress, for dashboards and logs.
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Aggregate store counts.
    pub async fn stats(&self) -> Result<StoreStats, RagError> {
        self.store.stats().await
    }

    /// Builds the knowledge base from a flat directory of text documents.
    ///
    /// Fails fast if the embedding provider is unavailable; availability
    /// gates whether the build starts at all. An empty corpus is not an
    /// error: the build completes with zero stats. Any step failure
    /// transitions the progress tracker to [`BuildPhase::Error`] and is
    /// returned to the caller.
    pub async fn build_knowledge_base(
        &self,
        source_dir: impl AsRef<Path>,
        clear_existing: bool,
    ) -> Result<BuildSummary, RagError> {
        match self.run_build(source_dir.as_ref(), clear_existing).await {
            Ok(summary) => Ok(summary),
            Err(err) => {
                self.progress.fail(err.to_string());
                Err(err)
            }
        }
    }

    /// Full rebuild: [`build_knowledge_base`](Self::build_knowledge_base)
    /// with `clear_existing = true`.
    pub async fn reload_knowledge_base(
        &self,
        source_dir: impl AsRef<Path>,
    ) -> Result<BuildSummary, RagError> {
        self.build_knowledge_base(source_dir, true).await
    }

    /// Returns the `top_k` chunks most similar to `query`.
    ///
    /// Embedding failures propagate; there is no synthetic fallback at
    /// query time.
    pub async fn retrieve_relevant(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, RagError> {
        let raw = self.provider.embed(query).await?;
        let normalized = normalize_min_max(&raw);
        let results = self.store.search(&normalized, top_k).await?;
        debug!(query_len = query.len(), results = results.len(), "query complete");
        Ok(results)
    }

    async fn run_build(
        &self,
        source_dir: &Path,
        clear_existing: bool,
    ) -> Result<BuildSummary, RagError> {
        self.progress.start_build();
        info!(dir = %source_dir.display(), clear_existing, "starting knowledge base build");

        if !self.provider.is_available().await {
            return Err(RagError::ProviderUnavailable(
                "availability probe failed at build start".to_string(),
            ));
        }

        self.store.initialize().await?;
        if clear_existing {
            self.store.clear().await?;
            self.progress.add_log("cleared existing index");
        }

        let corpus = load_documents(source_dir).await?;
        self.progress
            .begin_phase(BuildPhase::LoadingDocuments, corpus.len());
        self.progress.advance_by(corpus.len());
        self.progress.add_log(format!(
            "loaded {} documents ({} skipped)",
            corpus.len(),
            corpus.skipped
        ));

        if corpus.is_empty() {
            warn!(dir = %source_dir.display(), "no documents found");
            self.progress.add_log("no documents found; nothing to index");
            self.progress.complete();
            return Ok(BuildSummary::default());
        }

        self.progress.begin_phase(BuildPhase::Chunking, corpus.len());
        let mut chunks: Vec<TextChunk> = Vec::new();
        for (source_id, content) in &corpus.documents {
            let mut produced = self.chunker.chunk_text(content, source_id);
            chunks.append(&mut produced);
            self.progress.advance();
        }
        self.progress.add_log(format!(
            "chunked {} documents into {} chunks",
            corpus.len(),
            chunks.len()
        ));

        self.progress.begin_phase(BuildPhase::Embedding, chunks.len());
        let dimensions = self.provider.dimensions();
        let mut health = ProviderHealth::Healthy;
        let mut records: Vec<(TextChunk, Vec<f32>)> = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let raw = match health {
                ProviderHealth::Healthy => match self.provider.embed(&chunk.text).await {
                    Ok(vector) => vector,
                    Err(err) => {
                        warn!(
                            source = %chunk.source_id,
                            error = %err,
                            "embedding failed; using synthetic fallback for the rest of this build"
                        );
                        self.progress.add_log(format!(
                            "provider failed ({err}); continuing with synthetic embeddings"
                        ));
                        health = ProviderHealth::Degraded;
                        synthetic_embedding(&chunk.text, dimensions)
                    }
                },
                ProviderHealth::Degraded => synthetic_embedding(&chunk.text, dimensions),
            };
            records.push((chunk, normalize_min_max(&raw)));
            self.progress.advance();
        }

        self.progress.begin_phase(BuildPhase::Saving, 1);
        let stored = records.len();
        self.store.save_batch(records).await?;
        self.progress.advance();

        let stats = self.store.stats().await?;
        self.progress.add_log(format!(
            "stored {stored} chunks from {} sources ({} total in index)",
            stats.sources, stats.total_chunks
        ));
        self.progress.complete();

        let summary = BuildSummary {
            documents: corpus.len(),
            chunks: stored,
            degraded: health == ProviderHealth::Degraded,
        };
        info!(
            documents = summary.documents,
            chunks = summary.chunks,
            degraded = summary.degraded,
            "knowledge base build complete"
        );
        Ok(summary)
    }
}

/// Builder for [`Retriever`].
#[derive(Default)]
pub struct RetrieverBuilder {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStore>>,
    chunking: ChunkingConfig,
    progress: Option<ProgressTracker>,
}

impl RetrieverBuilder {
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn with_chunking_config(mut self, config: ChunkingConfig) -> Self {
        self.chunking = config;
        self
    }

    /// Injects a shared progress handle; omit it to get a private one.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressTracker) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn build(self) -> Result<Retriever, RagError> {
        let provider = self
            .provider
            .ok_or_else(|| RagError::Config("embedding provider is required".to_string()))?;
        let store = self
            .store
            .ok_or_else(|| RagError::Config("vector store is required".to_string()))?;
        Ok(Retriever {
            provider,
            store,
            chunker: Chunker::new(self.chunking),
            progress: self.progress.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbeddingProvider;
    use crate::stores::SqliteVectorStore;

    #[tokio::test]
    async fn builder_requires_provider_and_store() {
        assert!(matches!(
            Retriever::builder().build(),
            Err(RagError::Config(_))
        ));

        let store = SqliteVectorStore::open_in_memory().await.unwrap();
        assert!(matches!(
            Retriever::builder().with_store(Arc::new(store)).build(),
            Err(RagError::Config(_))
        ));
    }

    #[tokio::test]
    async fn unavailable_provider_fails_before_touching_the_store() {
        let store = Arc::new(SqliteVectorStore::open_in_memory().await.unwrap());
        let retriever = Retriever::builder()
            .with_provider(Arc::new(MockEmbeddingProvider::new().unavailable()))
            .with_store(store.clone())
            .build()
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let err = retriever
            .build_knowledge_base(dir.path(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::ProviderUnavailable(_)));
        assert_eq!(retriever.progress().phase(), BuildPhase::Error);
    }
}
