//! Chunking configuration.

use serde::{Deserialize, Serialize};

/// Closed set of chunking options.
///
/// Sizes are expressed in token-estimate units (see
/// [`estimate_tokens`](super::estimate_tokens)); one unit corresponds to
/// roughly four characters of text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size at which a boundary is cut.
    pub target_chunk_size: usize,
    /// Size of the region the tail of one chunk shares with the head of the
    /// next.
    pub overlap_size: usize,
    /// When enabled, cuts prefer paragraph and heading boundaries, heading
    /// lines are never split, and chunks carry their enclosing heading path.
    pub markdown_aware: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_chunk_size: 750,
            overlap_size: 75,
            markdown_aware: true,
        }
    }
}

impl ChunkingConfig {
    #[must_use]
    pub fn with_target_chunk_size(mut self, size: usize) -> Self {
        self.target_chunk_size = size;
        self
    }

    #[must_use]
    pub fn with_overlap_size(mut self, size: usize) -> Self {
        self.overlap_size = size;
        self
    }

    #[must_use]
    pub fn with_markdown_aware(mut self, enabled: bool) -> Self {
        self.markdown_aware = enabled;
        self
    }
}
