//! Partition pipeline: payload decoding, chunking, and response mapping.

mod chunking;
mod mappers;
pub mod payload;
mod service;
pub mod types;

pub use mappers::build_response;
pub use payload::{decode_document, pad_base64};
pub use service::{PartitionApi, PartitionService};
pub use types::{DecodeError, ElementRecord, PartitionResponse, ProcessingError};
