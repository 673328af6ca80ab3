//! Partition service coordinating decoding, partitioning, chunking, and response mapping.

use crate::{
    config::{Config, ResponseShape},
    metrics::{MetricsSnapshot, PartitionMetrics},
    partition::{
        ChunkingStrategy, Element, PartitionError, PartitionOptions, Partitioner,
        get_partitioner,
    },
    processing::{
        chunking::chunk_elements,
        mappers::build_response,
        payload::{decode_document, preview},
        types::{PartitionResponse, ProcessingError},
    },
};
use async_trait::async_trait;
use std::{sync::Arc, time::Instant};

const PREVIEW_BYTES: usize = 100;
const LOGGED_ELEMENTS: usize = 5;

/// Runs the partition pipeline for one document at a time.
///
/// The service owns the partitioner and metrics registry so that the HTTP surface and the CLI
/// share the same components. Construct it once near process start and share it through an
/// `Arc`.
pub struct PartitionService {
    partitioner: Box<dyn Partitioner>,
    options: PartitionOptions,
    response_shape: ResponseShape,
    metrics: Arc<PartitionMetrics>,
}

/// Abstraction over the partition pipeline used by the HTTP surface.
#[async_trait]
pub trait PartitionApi: Send + Sync {
    /// Decode a base64 payload, partition it, and render the elements.
    async fn partition_document(&self, encoded: &str)
    -> Result<PartitionResponse, ProcessingError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl PartitionService {
    /// Build a service around an explicit partitioner.
    pub fn new(
        partitioner: Box<dyn Partitioner>,
        options: PartitionOptions,
        response_shape: ResponseShape,
    ) -> Self {
        Self {
            partitioner,
            options,
            response_shape,
            metrics: Arc::new(PartitionMetrics::new()),
        }
    }

    /// Build the service described by the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, PartitionError> {
        let partitioner = get_partitioner(config)?;
        let options = PartitionOptions::for_requests(config);
        tracing::info!(
            backend = partitioner.name(),
            response_shape = ?config.response_shape,
            options = ?options,
            "Partition service initialized"
        );
        Ok(Self::new(partitioner, options, config.response_shape))
    }

    /// Shape used when rendering responses.
    pub fn response_shape(&self) -> ResponseShape {
        self.response_shape
    }

    /// Decode a base64 payload and partition it.
    pub async fn partition_document(
        &self,
        encoded: &str,
    ) -> Result<PartitionResponse, ProcessingError> {
        let started = Instant::now();
        let document = decode_document(encoded).map_err(|error| self.fail(error))?;
        tracing::debug!(
            bytes = document.len(),
            preview = %preview(&document, PREVIEW_BYTES),
            "Decoded document"
        );
        tracing::debug!(setup_ms = elapsed_ms(started), "Request setup complete");
        self.partition_bytes(document).await
    }

    /// Partition raw document bytes that are already decoded.
    pub async fn partition_bytes(
        &self,
        document: Vec<u8>,
    ) -> Result<PartitionResponse, ProcessingError> {
        if document.is_empty() {
            tracing::info!("Empty document; skipping partitioner");
            self.metrics.record_document(0, 0);
            return Ok(build_response(&[], self.response_shape));
        }

        let started = Instant::now();
        let elements = self
            .partition_elements(document)
            .await
            .map_err(|error| self.fail(error))?;
        let partition_ms = elapsed_ms(started);

        let first: Vec<String> = elements
            .iter()
            .take(LOGGED_ELEMENTS)
            .map(ToString::to_string)
            .collect();
        tracing::info!(
            backend = self.partitioner.name(),
            elements = elements.len(),
            partition_ms,
            first = ?first,
            "Document partitioned"
        );
        self.metrics
            .record_document(elements.len() as u64, partition_ms);

        Ok(build_response(&elements, self.response_shape))
    }

    /// Return a snapshot of the partition counters.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn partition_elements(&self, document: Vec<u8>) -> Result<Vec<Element>, PartitionError> {
        let elements = self.partitioner.partition(document, &self.options).await?;
        match self.options.chunking {
            ChunkingStrategy::Basic(limits) if !self.partitioner.applies_chunking() => {
                let partitioned = elements.len();
                let task = tokio::task::spawn_blocking(move || chunk_elements(elements, &limits));
                let chunks = task
                    .await
                    .map_err(|err| PartitionError::Task(err.to_string()))?;
                tracing::debug!(
                    partitioned,
                    chunks = chunks.len(),
                    max_characters = limits.max_characters,
                    "Applied basic chunking"
                );
                Ok(chunks)
            }
            _ => Ok(elements),
        }
    }

    fn fail(&self, error: impl Into<ProcessingError>) -> ProcessingError {
        let error = error.into();
        tracing::error!(error = %error, "Partition request failed");
        self.metrics.record_failure();
        error
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl PartitionApi for PartitionService {
    async fn partition_document(
        &self,
        encoded: &str,
    ) -> Result<PartitionResponse, ProcessingError> {
        PartitionService::partition_document(self, encoded).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        PartitionService::metrics_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::{
        ChunkLimits, ElementCategory, ElementMetadata, NativePartitioner, Strategy,
    };
    use crate::processing::types::ElementRecord;
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubPartitioner {
        calls: Arc<AtomicUsize>,
        chunks_remotely: bool,
        fail: bool,
    }

    impl StubPartitioner {
        fn boxed(calls: &Arc<AtomicUsize>, chunks_remotely: bool, fail: bool) -> Box<Self> {
            Box::new(Self {
                calls: calls.clone(),
                chunks_remotely,
                fail,
            })
        }
    }

    #[async_trait]
    impl Partitioner for StubPartitioner {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn applies_chunking(&self) -> bool {
            self.chunks_remotely
        }

        async fn partition(
            &self,
            _document: Vec<u8>,
            _options: &PartitionOptions,
        ) -> Result<Vec<Element>, PartitionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PartitionError::UnsupportedFileType("image/png".into()));
            }
            Ok(["Heading", "First paragraph."]
                .iter()
                .enumerate()
                .map(|(index, text)| Element {
                    element_id: index.to_string(),
                    category: if index == 0 {
                        ElementCategory::Title
                    } else {
                        ElementCategory::NarrativeText
                    },
                    text: (*text).to_string(),
                    metadata: ElementMetadata::default(),
                })
                .collect())
        }
    }

    fn chunked_options() -> PartitionOptions {
        PartitionOptions {
            include_page_breaks: true,
            strategy: Strategy::HiRes,
            chunking: ChunkingStrategy::Basic(ChunkLimits::new(500, None, 0)),
        }
    }

    fn unchunked_options() -> PartitionOptions {
        PartitionOptions {
            chunking: ChunkingStrategy::None,
            ..chunked_options()
        }
    }

    #[tokio::test]
    async fn empty_payload_skips_partitioner() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = PartitionService::new(
            StubPartitioner::boxed(&calls, false, false),
            chunked_options(),
            ResponseShape::Chunks,
        );

        let response = service.partition_document("").await.expect("empty payload");

        assert_eq!(response, PartitionResponse::Chunks { chunks: Vec::new() });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.metrics_snapshot().documents_partitioned, 1);
    }

    #[tokio::test]
    async fn invalid_base64_is_counted_as_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = PartitionService::new(
            StubPartitioner::boxed(&calls, false, false),
            chunked_options(),
            ResponseShape::Chunks,
        );

        let error = service.partition_document("@@@").await.unwrap_err();

        assert!(matches!(error, ProcessingError::Decode(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.metrics_snapshot().failed_requests, 1);
    }

    #[tokio::test]
    async fn partition_failure_propagates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = PartitionService::new(
            StubPartitioner::boxed(&calls, false, true),
            chunked_options(),
            ResponseShape::Chunks,
        );

        let error = service
            .partition_document(&STANDARD.encode("x"))
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            ProcessingError::Partition(PartitionError::UnsupportedFileType(_))
        ));
        let snapshot = service.metrics_snapshot();
        assert_eq!(snapshot.failed_requests, 1);
        assert_eq!(snapshot.documents_partitioned, 0);
    }

    #[tokio::test]
    async fn local_partitioners_are_chunked_by_the_service() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = PartitionService::new(
            StubPartitioner::boxed(&calls, false, false),
            chunked_options(),
            ResponseShape::Chunks,
        );

        let response = service
            .partition_document(&STANDARD.encode("ignored"))
            .await
            .expect("partition");

        assert_eq!(
            response,
            PartitionResponse::Chunks {
                chunks: vec!["Heading\n\nFirst paragraph.".into()]
            }
        );
        let snapshot = service.metrics_snapshot();
        assert_eq!(snapshot.documents_partitioned, 1);
        assert_eq!(snapshot.elements_returned, 1);
        assert!(snapshot.last_partition_ms.is_some());
    }

    #[tokio::test]
    async fn remote_chunking_is_not_repeated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = PartitionService::new(
            StubPartitioner::boxed(&calls, true, false),
            chunked_options(),
            ResponseShape::Chunks,
        );

        let response = service
            .partition_document(&STANDARD.encode("ignored"))
            .await
            .expect("partition");

        assert_eq!(response.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn elements_shape_returns_category_records() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = PartitionService::new(
            StubPartitioner::boxed(&calls, false, false),
            unchunked_options(),
            ResponseShape::Elements,
        );

        let response = service
            .partition_document(&STANDARD.encode("ignored"))
            .await
            .expect("partition");

        assert_eq!(
            response,
            PartitionResponse::Elements {
                data: vec![
                    ElementRecord {
                        category: "Title".into(),
                        text: "Heading".into()
                    },
                    ElementRecord {
                        category: "NarrativeText".into(),
                        text: "First paragraph.".into()
                    },
                ]
            }
        );
    }

    #[tokio::test]
    async fn native_partitioner_handles_unpadded_text() {
        let service = PartitionService::new(
            Box::new(NativePartitioner::new()),
            unchunked_options(),
            ResponseShape::Elements,
        );
        let encoded = STANDARD.encode("Status Update\n\nAll systems are running normally.");

        let response = service
            .partition_document(encoded.trim_end_matches('='))
            .await
            .expect("partition");

        match response {
            PartitionResponse::Elements { data } => {
                assert_eq!(data.len(), 2);
                assert_eq!(data[0].category, "Title");
                assert_eq!(data[1].text, "All systems are running normally.");
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }
}
