//! Options and error types shared by every partitioner.

use crate::config::Config;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned while partitioning a document.
#[derive(Debug, Error)]
pub enum PartitionError {
    /// The detected file type cannot be handled by the active partitioner.
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    /// The document claimed a supported format but its contents were malformed.
    #[error("Failed to parse document: {0}")]
    Parse(String),
    /// Base URL of the hosted partition API failed to parse.
    #[error("Invalid partition API URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Hosted partition API responded with an unexpected status code.
    #[error("Unexpected partition API response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the API.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Blocking partition task panicked or was cancelled.
    #[error("Partition task failed: {0}")]
    Task(String),
}

/// Layout-detection strategy requested from the partitioner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Let the partitioner pick.
    Auto,
    /// Text layer only.
    Fast,
    /// Model-based layout detection with OCR.
    HiRes,
    /// OCR without layout detection.
    OcrOnly,
}

impl Strategy {
    /// Wire name used by the hosted partition API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Fast => "fast",
            Self::HiRes => "hi_res",
            Self::OcrOnly => "ocr_only",
        }
    }
}

/// Character budgets for the `basic` chunking strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkLimits {
    /// Hard upper bound on chunk length, in characters.
    pub max_characters: usize,
    /// Soft bound; once a chunk reaches it the next element opens a new chunk.
    pub new_after_n_chars: usize,
    /// Characters carried from one split piece of an oversized element into the next.
    pub overlap: usize,
}

impl ChunkLimits {
    /// Build normalized limits: `max_characters >= 1`, `new_after_n_chars <= max_characters`,
    /// and `overlap < max_characters`.
    pub fn new(max_characters: usize, new_after_n_chars: Option<usize>, overlap: usize) -> Self {
        let max_characters = max_characters.max(1);
        Self {
            max_characters,
            new_after_n_chars: new_after_n_chars
                .unwrap_or(max_characters)
                .min(max_characters),
            overlap: overlap.min(max_characters - 1),
        }
    }
}

/// Post-partition grouping policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkingStrategy {
    /// Return elements exactly as partitioned.
    None,
    /// Combine sequential elements into character-bounded chunks.
    Basic(ChunkLimits),
}

/// Options passed to [`crate::partition::Partitioner::partition`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartitionOptions {
    /// Emit `PageBreak` elements between pages.
    pub include_page_breaks: bool,
    /// Layout strategy.
    pub strategy: Strategy,
    /// Chunking applied after partitioning.
    pub chunking: ChunkingStrategy,
}

impl PartitionOptions {
    /// Fixed options used by the HTTP endpoint: page breaks on, `hi_res`, `basic` chunking
    /// with the configured character budgets.
    pub fn for_requests(config: &Config) -> Self {
        Self {
            include_page_breaks: true,
            strategy: Strategy::HiRes,
            chunking: ChunkingStrategy::Basic(ChunkLimits::new(
                config.chunk_max_characters,
                config.chunk_new_after_n_chars,
                config.chunk_overlap,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_limits_clamp_soft_bound_and_overlap() {
        let limits = ChunkLimits::new(100, Some(400), 250);
        assert_eq!(limits.max_characters, 100);
        assert_eq!(limits.new_after_n_chars, 100);
        assert_eq!(limits.overlap, 99);
    }

    #[test]
    fn chunk_limits_default_soft_bound_to_hard_bound() {
        let limits = ChunkLimits::new(0, None, 0);
        assert_eq!(limits.max_characters, 1);
        assert_eq!(limits.new_after_n_chars, 1);
        assert_eq!(limits.overlap, 0);
    }

    #[test]
    fn strategy_wire_names_match_partition_api() {
        assert_eq!(Strategy::HiRes.as_str(), "hi_res");
        assert_eq!(Strategy::OcrOnly.as_str(), "ocr_only");
    }
}
