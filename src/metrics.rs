use std::sync::atomic::{AtomicU64, Ordering};

const NO_LATENCY: u64 = u64::MAX;

/// Thread-safe counters describing partition activity.
pub struct PartitionMetrics {
    documents_partitioned: AtomicU64,
    elements_returned: AtomicU64,
    failed_requests: AtomicU64,
    last_partition_ms: AtomicU64,
}

impl Default for PartitionMetrics {
    fn default() -> Self {
        Self {
            documents_partitioned: AtomicU64::new(0),
            elements_returned: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            last_partition_ms: AtomicU64::new(NO_LATENCY),
        }
    }
}

impl PartitionMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a partitioned document, the number of elements returned, and the partition latency.
    pub fn record_document(&self, element_count: u64, partition_ms: u64) {
        self.documents_partitioned.fetch_add(1, Ordering::Relaxed);
        self.elements_returned
            .fetch_add(element_count, Ordering::Relaxed);
        self.last_partition_ms
            .store(partition_ms.min(NO_LATENCY - 1), Ordering::Relaxed);
    }

    /// Record a request that failed during decoding or partitioning.
    pub fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let last = self.last_partition_ms.load(Ordering::Relaxed);
        MetricsSnapshot {
            documents_partitioned: self.documents_partitioned.load(Ordering::Relaxed),
            elements_returned: self.elements_returned.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            last_partition_ms: (last != NO_LATENCY).then_some(last),
        }
    }
}

/// Immutable view of partition counters used for reporting.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents partitioned since startup.
    pub documents_partitioned: u64,
    /// Total elements returned across all partitioned documents.
    pub elements_returned: u64,
    /// Requests that failed during decoding or partitioning.
    pub failed_requests: u64,
    /// Partition latency of the most recent successful request, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_partition_ms: Option<u64>,
}
