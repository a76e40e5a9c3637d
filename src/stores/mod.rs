//! Storage backends for chunk text and embedding vectors.
//!
//! The [`VectorStore`] trait abstracts the persisted knowledge base: a
//! durable table of `(chunk, vector)` rows keyed by an auto-assigned row id,
//! queried by brute-force cosine scan. All rows in a store share one
//! embedding dimensionality and normalization convention; a convention
//! change requires a wholesale [`clear`](VectorStore::clear) and rebuild.
//!
//! ```text
//!              ┌──────────────────┐
//!              │ VectorStore trait│
//!              │   (async CRUD)   │
//!              └────────┬─────────┘
//!                       │
//!                       ▼
//!              ┌──────────────────┐
//!              │ SqliteVectorStore│
//!              │  tokio-rusqlite  │
//!              └──────────────────┘
//! ```

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{RagError, RetrievedChunk, TextChunk};

pub use sqlite::SqliteVectorStore;

/// Aggregate counts for observability.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Total stored chunks.
    pub total_chunks: usize,
    /// Number of distinct source documents.
    pub sources: usize,
    /// Sorted distinct source identifiers.
    pub files: Vec<String>,
}

/// Durable table of `(chunk, vector)` records with similarity search.
///
/// Search is deliberately a brute-force linear scan: the corpora this
/// pipeline serves stay in the tens of thousands of chunks, where an exact
/// scan is both simple and fast enough. Do not swap in an approximate index
/// unless that corpus-size assumption changes.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Idempotent schema setup; safe to call repeatedly.
    async fn initialize(&self) -> Result<(), RagError>;

    /// Deletes every record; used before a full rebuild.
    async fn clear(&self) -> Result<(), RagError>;

    /// Bulk-inserts records in a single transaction: either the whole batch
    /// becomes visible or none of it does.
    ///
    /// Rejects batches whose vectors disagree in dimensionality, with each
    /// other or with rows already stored.
    async fn save_batch(&self, records: Vec<(TextChunk, Vec<f32>)>) -> Result<(), RagError>;

    /// Returns up to `top_k` records ordered by descending cosine similarity
    /// to `query`, ties broken by insertion order.
    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>, RagError>;

    /// Aggregate counts for observability.
    async fn stats(&self) -> Result<StoreStats, RagError>;

    /// Total number of stored chunks.
    async fn count(&self) -> Result<usize, RagError>;
}
