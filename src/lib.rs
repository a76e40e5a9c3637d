//! # ragmill: retrieval-augmented generation pipeline
//!
//! ragmill turns a directory of text documents into a queryable knowledge
//! base: documents are split into overlapping chunks, embedded by an
//! external service (with a deterministic synthetic fallback when that
//! service degrades), normalized, and persisted in a SQLite vector store
//! that answers queries by exact cosine scan.
//!
//! ```text
//! Source directory ──► ingestion::load_documents
//!                                 │
//!                                 ▼
//!                      chunking::Chunker ──► TextChunk sequence
//!                                 │
//!                                 ▼
//!             embeddings::EmbeddingProvider ──┐ per-item failure?
//!                        │                    └─► synthetic_embedding
//!                        ▼
//!             embeddings::normalize_min_max
//!                        │
//!                        ▼
//!             stores::VectorStore::save_batch
//!
//! Query string ──► embed ──► normalize ──► stores::VectorStore::search
//!                                             │
//!                                             ▼
//!                                   ranked RetrievedChunk list
//! ```
//!
//! The [`retriever::Retriever`] drives both paths; the injected
//! [`progress::ProgressTracker`] makes long-running builds observable.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ragmill::{
//!     HttpEmbeddingConfig, HttpEmbeddingProvider, Retriever, SqliteVectorStore,
//! };
//!
//! # async fn example() -> Result<(), ragmill::RagError> {
//! let provider = HttpEmbeddingProvider::new(HttpEmbeddingConfig::default())?;
//! let store = SqliteVectorStore::open("knowledge.sqlite").await?;
//! let retriever = Retriever::builder()
//!     .with_provider(Arc::new(provider))
//!     .with_store(Arc::new(store))
//!     .build()?;
//!
//! retriever.build_knowledge_base("./docs", true).await?;
//! let hits = retriever.retrieve_relevant("how do builds degrade?", 5).await?;
//! for hit in hits {
//!     println!("{:.3}  {}", hit.similarity, hit.chunk.source_id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod chunking;
pub mod embeddings;
pub mod ingestion;
pub mod progress;
pub mod retriever;
pub mod stores;
pub mod types;

pub use chunking::{Chunker, ChunkingConfig, estimate_tokens};
pub use embeddings::{
    EmbeddingProvider, HttpEmbeddingConfig, HttpEmbeddingProvider, MockEmbeddingProvider,
    normalize_l2, normalize_min_max, synthetic_embedding,
};
pub use progress::{BuildPhase, BuildProgress, ProgressTracker};
pub use retriever::{BuildSummary, DEFAULT_TOP_K, ProviderHealth, Retriever, RetrieverBuilder};
pub use stores::{SqliteVectorStore, StoreStats, VectorStore};
pub use types::{RagError, RetrievedChunk, TextChunk};
