//! HTTP surface for docsplit.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /unstructured/partition` – Decode a base64 document, partition it, and return the
//!   elements as `{ "chunks": [...] }` or `{ "data": [{category, text}] }` depending on
//!   `RESPONSE_SHAPE`. Any failure yields HTTP 500 with a plain-text message.
//! - `GET /metrics` – Observe partition counters and the last partition latency.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.

use crate::metrics::MetricsSnapshot;
use crate::processing::{PartitionApi, PartitionResponse, ProcessingError};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Build the HTTP router exposing the partition API surface.
///
/// `body_limit` caps request bodies in bytes; base64 documents routinely exceed axum's 2 MiB
/// default.
pub fn create_router<S>(service: Arc<S>, body_limit: usize) -> Router
where
    S: PartitionApi + 'static,
{
    Router::new()
        .route("/unstructured/partition", post(partition_document::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}

/// Request body for the `POST /unstructured/partition` endpoint.
#[derive(Deserialize)]
struct PartitionRequest {
    /// Base64-encoded document; trailing padding may be omitted.
    data: String,
}

/// Partition a base64 document with the configured partitioner.
async fn partition_document<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<PartitionRequest>,
) -> Result<Json<PartitionResponse>, AppError>
where
    S: PartitionApi,
{
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("partition_request", %request_id);
    async move {
        tracing::debug!(encoded_len = request.data.len(), "Partition request received");
        let response = service.partition_document(&request.data).await?;
        tracing::info!(elements = response.len(), "Partition request completed");
        Ok::<_, AppError>(Json(response))
    }
    .instrument(span)
    .await
}

/// Return the partition counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: PartitionApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "partition",
                method: "POST",
                path: "/unstructured/partition",
                description: "Partition a base64-encoded document (padding optional) into elements. Response returns { \"chunks\": [string] } or { \"data\": [{ \"category\": string, \"text\": string }] }.",
                request_example: Some(json!({
                    "data": "U3RhdHVzIFVwZGF0ZQoKQWxsIHN5c3RlbXMgbm9taW5hbC4"
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return partition counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

struct AppError(ProcessingError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

impl From<ProcessingError> for AppError {
    fn from(inner: ProcessingError) -> Self {
        Self(inner)
    }
}
