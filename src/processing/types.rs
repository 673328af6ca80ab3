//! Core data types and error definitions for the processing pipeline.

use crate::partition::PartitionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while decoding a request payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload was not valid base64 after padding normalization.
    #[error("Invalid base64 document payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Errors emitted by the partition pipeline.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Payload decoding failed.
    #[error("Failed to decode document: {0}")]
    Decode(#[from] DecodeError),
    /// Partitioner failed to split the document.
    #[error("Failed to partition document: {0}")]
    Partition(#[from] PartitionError),
}

/// `{category, text}` record used by the `elements` response shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRecord {
    /// Category label of the element.
    pub category: String,
    /// Text rendering of the element.
    pub text: String,
}

/// Body returned by the partition endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PartitionResponse {
    /// Bare element texts.
    Chunks {
        /// Text rendering of each element, in document order.
        chunks: Vec<String>,
    },
    /// Category/text records.
    Elements {
        /// One record per element, in document order.
        data: Vec<ElementRecord>,
    },
}

impl PartitionResponse {
    /// Number of elements carried by the response.
    pub fn len(&self) -> usize {
        match self {
            Self::Chunks { chunks } => chunks.len(),
            Self::Elements { data } => data.len(),
        }
    }

    /// Whether the response carries no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
