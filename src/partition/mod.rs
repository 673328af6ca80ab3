//! Document partitioners: the [`Partitioner`] trait and its native and hosted implementations.

mod docx;
pub mod element;
pub mod filetype;
mod markdown;
pub mod native;
pub mod remote;
mod text;
pub mod types;

pub use element::{Element, ElementCategory, ElementMetadata, compute_element_id};
pub use filetype::{FileType, detect_file_type};
pub use native::NativePartitioner;
pub use remote::UnstructuredApiPartitioner;
pub use types::{ChunkLimits, ChunkingStrategy, PartitionError, PartitionOptions, Strategy};

use crate::config::{Config, PartitionBackend};
use async_trait::async_trait;

/// Interface implemented by partitioning backends.
#[async_trait]
pub trait Partitioner: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Whether the backend applies the requested chunking strategy itself.
    fn applies_chunking(&self) -> bool {
        false
    }

    /// Split a decoded document into ordered elements.
    async fn partition(
        &self,
        document: Vec<u8>,
        options: &PartitionOptions,
    ) -> Result<Vec<Element>, PartitionError>;
}

/// Build the partitioner selected by the configuration.
pub fn get_partitioner(config: &Config) -> Result<Box<dyn Partitioner>, PartitionError> {
    match config.partition_backend {
        PartitionBackend::Native => Ok(Box::new(NativePartitioner::new())),
        PartitionBackend::Unstructured => {
            Ok(Box::new(UnstructuredApiPartitioner::from_config(config)?))
        }
    }
}
