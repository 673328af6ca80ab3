//! Basic chunking: combine sequential elements into character-bounded chunks.
//!
//! - Elements are packed in order into `CompositeElement` chunks joined by a blank line.
//! - `max_characters` is a hard bound; `new_after_n_chars` closes a chunk early once reached.
//! - Tables never share a chunk. An oversized table becomes `TableChunk` pieces.
//! - Any other oversized element is split at semantic boundaries with `text-splitter` (counted in
//!   Unicode characters) and the pieces carry a sliding character overlap from their predecessor.
//! - Page breaks are dropped; a chunk reports the page of its first member.

use crate::partition::{ChunkLimits, Element, ElementCategory, ElementMetadata, compute_element_id};
use text_splitter::{ChunkCapacity, ChunkConfig, TextSplitter};

const SEPARATOR: &str = "\n\n";

/// Group partitioned elements according to `limits`.
pub(crate) fn chunk_elements(elements: Vec<Element>, limits: &ChunkLimits) -> Vec<Element> {
    let mut builder = ChunkBuilder::new(*limits);
    for element in elements {
        match element.category {
            ElementCategory::PageBreak => {}
            ElementCategory::Table | ElementCategory::TableChunk => builder.push_table(element),
            _ => builder.push_text(element),
        }
    }
    builder.finish()
}

struct ChunkBuilder {
    limits: ChunkLimits,
    pending: Vec<Element>,
    pending_len: usize,
    chunks: Vec<Element>,
}

impl ChunkBuilder {
    fn new(limits: ChunkLimits) -> Self {
        Self {
            limits,
            pending: Vec::new(),
            pending_len: 0,
            chunks: Vec::new(),
        }
    }

    fn push_text(&mut self, element: Element) {
        let len = char_len(&element.text);
        if len > self.limits.max_characters {
            self.flush();
            let metadata = element.metadata;
            for piece in split_oversized(&element.text, &self.limits) {
                self.emit(ElementCategory::CompositeElement, piece, &metadata);
            }
            return;
        }

        if !self.pending.is_empty() {
            let combined = self.pending_len + SEPARATOR.len() + len;
            if self.pending_len >= self.limits.new_after_n_chars
                || combined > self.limits.max_characters
            {
                self.flush();
            }
        }

        self.pending_len += if self.pending.is_empty() {
            len
        } else {
            SEPARATOR.len() + len
        };
        self.pending.push(element);
    }

    fn push_table(&mut self, element: Element) {
        self.flush();
        if char_len(&element.text) <= self.limits.max_characters {
            self.emit(ElementCategory::Table, element.text, &element.metadata);
            return;
        }
        for piece in split_oversized(&element.text, &self.limits) {
            self.emit(ElementCategory::TableChunk, piece, &element.metadata);
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let members = std::mem::take(&mut self.pending);
        self.pending_len = 0;
        let text = members
            .iter()
            .map(|member| member.text.as_str())
            .collect::<Vec<_>>()
            .join(SEPARATOR);
        let metadata = members[0].metadata.clone();
        self.emit(ElementCategory::CompositeElement, text, &metadata);
    }

    fn emit(&mut self, category: ElementCategory, text: String, source: &ElementMetadata) {
        let page_number = source.page_number;
        let element_id = compute_element_id(&category, &text, self.chunks.len(), page_number);
        self.chunks.push(Element {
            element_id,
            category,
            text,
            metadata: ElementMetadata {
                page_number,
                filetype: source.filetype.clone(),
                parent_id: None,
            },
        });
    }

    fn finish(mut self) -> Vec<Element> {
        self.flush();
        self.chunks
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split text longer than `max_characters` at semantic boundaries, then apply overlap.
fn split_oversized(text: &str, limits: &ChunkLimits) -> Vec<String> {
    let config = ChunkConfig::new(ChunkCapacity::new(limits.max_characters)).with_trim(true);
    let pieces = TextSplitter::new(config)
        .chunks(text)
        .map(str::to_string)
        .collect();
    apply_overlap(pieces, limits.max_characters, limits.overlap)
}

/// Prefix each piece with the tail of its predecessor, keeping every piece within `max_chars`.
fn apply_overlap(pieces: Vec<String>, max_chars: usize, overlap: usize) -> Vec<String> {
    let overlap = overlap.min(max_chars.saturating_sub(1));
    if overlap == 0 || pieces.len() < 2 {
        return pieces;
    }

    let mut overlapped = Vec::with_capacity(pieces.len());
    let mut previous: Option<String> = None;
    for current in pieces {
        let piece = match previous.as_deref() {
            Some(prev) => build_overlapped_piece(prev, &current, overlap, max_chars),
            None => current.clone(),
        };
        overlapped.push(piece);
        previous = Some(current);
    }
    overlapped
}

fn build_overlapped_piece(
    previous: &str,
    current: &str,
    overlap: usize,
    max_chars: usize,
) -> String {
    let tail = tail_chars(previous, overlap);
    let mut combined = String::with_capacity(tail.len() + current.len() + 1);
    if !tail.is_empty() {
        combined.push_str(tail);
        let tail_spaced = tail.ends_with(char::is_whitespace);
        if !tail_spaced && !current.starts_with(char::is_whitespace) {
            combined.push(' ');
        }
    }
    combined.push_str(current);
    tail_chars(&combined, max_chars).to_string()
}

/// Last `limit` characters of `text`, with leading whitespace removed.
fn tail_chars(text: &str, limit: usize) -> &str {
    let trimmed = text.trim_start();
    let count = char_len(trimmed);
    if count <= limit {
        return trimmed;
    }
    let start = trimmed
        .char_indices()
        .nth(count - limit)
        .map(|(offset, _)| offset)
        .unwrap_or(trimmed.len());
    trimmed[start..].trim_start()
}
