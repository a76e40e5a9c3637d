//! Rolling-window chunker with optional markdown awareness.
//!
//! The chunker walks a document and cuts a boundary whenever the running
//! size reaches the configured target. In markdown-aware mode it prefers
//! cuts that coincide with paragraph breaks or heading starts, never splits
//! inside a heading line, and tracks the open heading stack so every chunk
//! carries its enclosing heading path. The tail of each chunk is carried
//! into the head of the next so context survives a cut.
//!
//! All cut points and overlap regions are snapped to grapheme boundaries,
//! so multi-byte text is never split mid-cluster.

use std::collections::BTreeMap;

use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use super::config::ChunkingConfig;
use crate::types::TextChunk;

/// Approximate characters per token-estimate unit.
const CHARS_PER_TOKEN: usize = 4;

/// Deterministic, cheap token estimate proportional to character count.
///
/// This is for budgeting only; it is not a real tokenizer and must never be
/// treated as billable usage.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Splits documents into overlapping, size-bounded [`TextChunk`]s.
#[derive(Clone, Debug, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Chunks a single document into an ordered sequence.
    ///
    /// A document shorter than the target size yields exactly one chunk with
    /// no overlap; empty input yields an empty sequence. Chunking never
    /// fails on well-formed text.
    pub fn chunk_text(&self, content: &str, source_id: &str) -> Vec<TextChunk> {
        let graphemes: Vec<usize> = content.grapheme_indices(true).map(|(i, _)| i).collect();
        let total = graphemes.len();
        if total == 0 {
            return Vec::new();
        }

        let target = (self.config.target_chunk_size * CHARS_PER_TOKEN).max(1);
        let overlap = self.config.overlap_size * CHARS_PER_TOKEN;
        let byte_at = |pos: usize| {
            if pos == total {
                content.len()
            } else {
                graphemes[pos]
            }
        };

        // Partition the grapheme range into consecutive segments; overlap is
        // applied afterwards so the segments reconstruct the document exactly.
        let mut segments: Vec<(usize, usize)> = Vec::new();
        let mut start = 0usize;
        while start < total {
            let ideal = start + target;
            let end = if ideal >= total {
                total
            } else {
                self.pick_cut(content, &graphemes, start, ideal)
            };
            segments.push((start, end));
            start = end;
        }

        let mut tracker = HeadingTracker::default();
        let mut fed_byte = 0usize;
        let mut prev_start = 0usize;
        let mut chunks = Vec::with_capacity(segments.len());

        for (i, &(seg_start, seg_end)) in segments.iter().enumerate() {
            let lead = if i == 0 {
                seg_start
            } else {
                seg_start - overlap.min(seg_start - prev_start)
            };
            let lead_byte = byte_at(lead);
            let seg_start_byte = byte_at(seg_start);
            let end_byte = byte_at(seg_end);

            let heading_context = if self.config.markdown_aware {
                tracker.observe(&content[fed_byte..seg_start_byte]);
                fed_byte = seg_start_byte;
                tracker.context_at(&content[seg_start_byte..end_byte])
            } else {
                None
            };

            let text = &content[lead_byte..end_byte];
            chunks.push(TextChunk::new(
                text,
                source_id,
                heading_context,
                estimate_tokens(text),
            ));
            prev_start = seg_start;
        }

        debug!(
            source = source_id,
            chunks = chunks.len(),
            graphemes = total,
            "chunked document"
        );
        chunks
    }

    /// Chunks every document in the corpus.
    ///
    /// Order is preserved within a document; documents are visited in map
    /// order.
    pub fn chunk_documents(&self, documents: &BTreeMap<String, String>) -> Vec<TextChunk> {
        documents
            .iter()
            .flat_map(|(source_id, content)| self.chunk_text(content, source_id))
            .collect()
    }

    /// Chooses the cut position for a segment starting at `start` whose
    /// ideal end is `ideal` (both grapheme positions, `ideal < total`).
    fn pick_cut(&self, content: &str, graphemes: &[usize], start: usize, ideal: usize) -> usize {
        if !self.config.markdown_aware {
            return ideal;
        }

        // Search backwards from the ideal cut, down to the segment midpoint,
        // for a paragraph break or a heading start.
        let floor = start + (ideal - start) / 2;
        let window = &content[graphemes[floor]..graphemes[ideal]];
        let paragraph = window.rfind("\n\n").map(|i| graphemes[floor] + i + 2);
        let heading = window.rfind("\n#").map(|i| graphemes[floor] + i + 1);
        if let Some(cut_byte) = paragraph.max(heading) {
            let pos = graphemes.partition_point(|&b| b < cut_byte);
            if pos > start && pos <= ideal {
                return pos;
            }
        }

        // Hard cut at the target, moved back to the line start when it would
        // land inside a heading line.
        let ideal_byte = graphemes[ideal];
        let line_start = content[..ideal_byte].rfind('\n').map_or(0, |i| i + 1);
        if content[line_start..].starts_with('#') {
            let pos = graphemes.partition_point(|&b| b < line_start);
            if pos > start {
                return pos;
            }
        }
        ideal
    }
}

/// Tracks the currently-open markdown heading stack while text is observed
/// line by line.
#[derive(Debug, Default)]
struct HeadingTracker {
    stack: Vec<(usize, String)>,
    pending: String,
}

impl HeadingTracker {
    /// Feeds the next stretch of document text; only complete lines are
    /// applied, partial trailing lines are buffered.
    fn observe(&mut self, text: &str) {
        self.pending.push_str(text);
        while let Some(idx) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=idx).collect();
            self.apply(line.trim_end());
        }
    }

    fn apply(&mut self, line: &str) {
        let Some((level, title)) = parse_heading(line) else {
            return;
        };
        while self.stack.last().is_some_and(|(open, _)| *open >= level) {
            self.stack.pop();
        }
        self.stack.push((level, title.to_string()));
    }

    /// Heading path for a chunk whose fresh region is `upcoming`.
    ///
    /// A chunk that opens with its own heading line belongs under that
    /// heading, so the first line is peeked without advancing the tracker.
    fn context_at(&self, upcoming: &str) -> Option<String> {
        if self.pending.is_empty() {
            let first_line = upcoming.split('\n').next().unwrap_or("");
            if let Some((level, title)) = parse_heading(first_line.trim_end()) {
                let mut stack: Vec<&str> = self
                    .stack
                    .iter()
                    .take_while(|(open, _)| *open < level)
                    .map(|(_, title)| title.as_str())
                    .collect();
                stack.push(title);
                return Some(stack.join(" > "));
            }
        }
        if self.stack.is_empty() {
            None
        } else {
            Some(
                self.stack
                    .iter()
                    .map(|(_, title)| title.as_str())
                    .collect::<Vec<_>>()
                    .join(" > "),
            )
        }
    }
}

/// Parses an ATX heading (`#` through `######`, followed by a space).
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let title = line[hashes..].strip_prefix(' ')?.trim();
    if title.is_empty() {
        return None;
    }
    Some((hashes, title))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_config(target: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            target_chunk_size: target,
            overlap_size: overlap,
            markdown_aware: false,
        }
    }

    fn markdown_config(target: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            target_chunk_size: target,
            overlap_size: overlap,
            markdown_aware: true,
        }
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunker = Chunker::new(ChunkingConfig::default());
        assert!(chunker.chunk_text("", "empty.md").is_empty());
    }

    #[test]
    fn short_document_yields_single_chunk_without_overlap() {
        let chunker = Chunker::new(ChunkingConfig::default());
        let chunks = chunker.chunk_text("a short note", "note.md");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "a short note");
        assert_eq!(chunks[0].source_id, "note.md");
        assert_eq!(chunks[0].token_count, estimate_tokens("a short note"));
    }

    #[test]
    fn non_overlap_regions_reconstruct_the_document() {
        // target 10 units = 40 chars, overlap 2 units = 8 chars
        let chunker = Chunker::new(plain_config(10, 2));
        let content: String = (0..300).map(|i| (b'a' + (i % 26) as u8) as char).collect();
        let chunks = chunker.chunk_text(&content, "doc.txt");
        assert!(chunks.len() > 2);

        let mut rebuilt = chunks[0].text.clone();
        for chunk in &chunks[1..] {
            rebuilt.push_str(&chunk.text[8..]);
        }
        assert_eq!(rebuilt, content);
    }

    #[test]
    fn adjacent_chunks_share_exactly_the_overlap_region() {
        let chunker = Chunker::new(plain_config(10, 2));
        let content: String = (0..200).map(|i| (b'a' + (i % 26) as u8) as char).collect();
        let chunks = chunker.chunk_text(&content, "doc.txt");
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            let tail = &pair[0].text[pair[0].text.len() - 8..];
            let head = &pair[1].text[..8];
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn chunk_sizes_stay_within_the_target_plus_overlap() {
        let chunker = Chunker::new(markdown_config(10, 2));
        let content = "word ".repeat(200);
        for chunk in chunker.chunk_text(&content, "doc.txt") {
            assert!(chunk.token_count <= 10 + 2 + 1, "chunk too large: {}", chunk.token_count);
        }
    }

    #[test]
    fn markdown_cut_prefers_paragraph_breaks() {
        let para_one = format!("{}\n\n", "a".repeat(30));
        let para_two = "b".repeat(60);
        let content = format!("{para_one}{para_two}");
        let chunker = Chunker::new(markdown_config(10, 0));
        let chunks = chunker.chunk_text(&content, "doc.md");
        assert!(chunks.len() >= 2);
        assert_eq!(chunks[0].text, para_one);
        assert!(chunks[1].text.starts_with('b'));
    }

    #[test]
    fn hard_cut_never_lands_inside_a_heading_line() {
        // The ideal cut (40 chars) falls inside the heading line; the
        // boundary must move to the heading's line start instead.
        let content = format!("{}\n# Heading line here\nbody body body", "x".repeat(38));
        let chunker = Chunker::new(markdown_config(10, 0));
        let chunks = chunker.chunk_text(&content, "doc.md");
        assert!(chunks.len() >= 2);
        assert_eq!(chunks[0].text, format!("{}\n", "x".repeat(38)));
        assert!(chunks[1].text.starts_with("# Heading line here"));
    }

    #[test]
    fn heading_context_tracks_the_open_heading_stack() {
        let content = format!(
            "# Title\n\n{}\n\n## Sub\n\n{}",
            "intro ".repeat(12),
            "detail ".repeat(12)
        );
        let chunker = Chunker::new(markdown_config(10, 0));
        let chunks = chunker.chunk_text(&content, "doc.md");
        assert!(chunks.len() >= 2);
        assert_eq!(chunks[0].heading_context.as_deref(), Some("Title"));
        assert_eq!(
            chunks.last().unwrap().heading_context.as_deref(),
            Some("Title > Sub")
        );
    }

    #[test]
    fn sibling_heading_replaces_the_previous_one() {
        let content = format!(
            "# A\n\n{}\n\n# B\n\n{}",
            "alpha ".repeat(12),
            "beta ".repeat(12)
        );
        let chunker = Chunker::new(markdown_config(10, 0));
        let chunks = chunker.chunk_text(&content, "doc.md");
        assert_eq!(chunks.first().unwrap().heading_context.as_deref(), Some("A"));
        assert_eq!(chunks.last().unwrap().heading_context.as_deref(), Some("B"));
    }

    #[test]
    fn long_paragraph_is_hard_cut_not_dropped() {
        let content = "z".repeat(100);
        let chunker = Chunker::new(markdown_config(10, 0));
        let chunks = chunker.chunk_text(&content, "doc.md");
        assert_eq!(chunks.len(), 3);
        let rebuilt: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(rebuilt, content);
    }

    #[test]
    fn multibyte_text_is_cut_on_grapheme_boundaries() {
        let content = "héllo wörld ".repeat(30);
        let chunker = Chunker::new(plain_config(10, 2));
        let chunks = chunker.chunk_text(&content, "doc.txt");
        assert!(chunks.len() > 1);
        let rebuilt: String = std::iter::once(chunks[0].text.clone())
            .chain(chunks[1..].iter().map(|c| {
                let skip: usize = c.text.graphemes(true).take(8).map(str::len).sum();
                c.text[skip..].to_string()
            }))
            .collect();
        assert_eq!(rebuilt, content);
    }

    #[test]
    fn chunk_documents_preserves_per_document_order() {
        let mut documents = BTreeMap::new();
        documents.insert("a.md".to_string(), "alpha ".repeat(30));
        documents.insert("b.md".to_string(), "beta ".repeat(30));
        let chunker = Chunker::new(plain_config(10, 2));
        let chunks = chunker.chunk_documents(&documents);

        let from_a: Vec<_> = chunks.iter().filter(|c| c.source_id == "a.md").collect();
        let from_b: Vec<_> = chunks.iter().filter(|c| c.source_id == "b.md").collect();
        assert!(!from_a.is_empty() && !from_b.is_empty());
        assert_eq!(from_a.len() + from_b.len(), chunks.len());
    }

    #[test]
    fn token_estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }
}
