//! Core data model shared across the pipeline.
//!
//! The types here flow through every stage: the chunker produces
//! [`TextChunk`]s, the store returns [`RetrievedChunk`]s at query time, and
//! every fallible operation reports a [`RagError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A contiguous, size-bounded slice of a source document.
///
/// Chunks from the same document form an ordered sequence; adjacent chunks
/// share an overlap region so context survives a cut. Chunks are created
/// during a build, never mutated, and superseded wholesale on rebuild.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// The chunk text, including any overlap carried from the previous chunk.
    pub text: String,
    /// Identifier of the originating document (typically the file name).
    pub source_id: String,
    /// Nearest enclosing heading path when markdown-aware chunking is used,
    /// levels joined with `" > "`.
    pub heading_context: Option<String>,
    /// Cheap deterministic token estimate, for budgeting only.
    pub token_count: usize,
}

impl TextChunk {
    pub fn new(
        text: impl Into<String>,
        source_id: impl Into<String>,
        heading_context: Option<String>,
        token_count: usize,
    ) -> Self {
        Self {
            text: text.into(),
            source_id: source_id.into(),
            heading_context,
            token_count,
        }
    }
}

/// A single similarity-search result: a stored chunk plus its cosine
/// similarity against the query vector. Produced only by search, never
/// persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: TextChunk,
    pub similarity: f32,
}

/// Top-level error for ragmill operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unsupported configuration, including a missing source
    /// directory.
    #[error("config error: {0}")]
    Config(String),

    /// The embedding provider failed its availability probe at build start.
    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// An embedding call failed (malformed response, unexpected shape).
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Transport-level HTTP failures reaching the embedding service.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Vector store failures.
    #[error("storage error: {0}")]
    Storage(String),

    /// Mismatch in vector dimensionality across records or against the store.
    #[error("vector dimension mismatch: got {got}, want {want}")]
    VectorDimension { got: usize, want: usize },
}
