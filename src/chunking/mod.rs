//! Document chunking: rolling-window splitting with overlap and optional
//! markdown heading awareness.
//!
//! The chunker is the first pipeline stage; it turns raw document text into
//! the ordered [`TextChunk`](crate::types::TextChunk) sequences that the
//! embedding and storage stages consume.

pub mod chunker;
pub mod config;

pub use chunker::{Chunker, estimate_tokens};
pub use config::ChunkingConfig;
