//! HTTP client for the hosted Unstructured partition API.

use super::{
    Partitioner,
    element::{Element, ElementCategory, ElementMetadata},
    filetype::detect_file_type,
    types::{ChunkingStrategy, PartitionError, PartitionOptions},
};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::{
    Client,
    header::ACCEPT,
    multipart::{Form, Part},
};
use serde::Deserialize;
use std::time::Duration;

const PARTITION_PATH: &str = "general/v0/general";
const API_KEY_HEADER: &str = "unstructured-api-key";

/// Partitioner that delegates to a hosted Unstructured API deployment.
///
/// The hosted service performs layout detection, OCR, and chunking itself, so every format it
/// understands (PDF, images, Office, HTML) is available through this backend.
pub struct UnstructuredApiPartitioner {
    pub(crate) client: Client,
    pub(crate) endpoint: String,
    pub(crate) api_key: Option<String>,
}

impl UnstructuredApiPartitioner {
    /// Build a client for the API rooted at `base_url`.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, PartitionError> {
        let mut builder = Client::builder().user_agent("docsplit/0.1");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        let base_url = normalize_base_url(base_url).map_err(PartitionError::InvalidUrl)?;
        let endpoint = format_endpoint(&base_url, PARTITION_PATH);

        tracing::debug!(
            endpoint = %endpoint,
            has_api_key = api_key.as_deref().map(|key| !key.is_empty()).unwrap_or(false),
            timeout_secs = timeout.map(|t| t.as_secs()),
            "Initialized Unstructured API client"
        );

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    /// Build a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, PartitionError> {
        let base_url = config.unstructured_api_url.as_deref().ok_or_else(|| {
            PartitionError::InvalidUrl("UNSTRUCTURED_API_URL is not configured".to_string())
        })?;
        Self::new(
            base_url,
            config.unstructured_api_key.clone(),
            config.unstructured_api_timeout_secs.map(Duration::from_secs),
        )
    }

    fn build_form(document: Vec<u8>, options: &PartitionOptions) -> Result<Form, PartitionError> {
        let file_type = detect_file_type(&document);
        let part = Part::bytes(document)
            .file_name(format!("document.{}", file_type.extension()))
            .mime_str(file_type.mime_type())?;

        let mut form = Form::new()
            .part("files", part)
            .text("strategy", options.strategy.as_str())
            .text("include_page_breaks", options.include_page_breaks.to_string());

        if let ChunkingStrategy::Basic(limits) = options.chunking {
            form = form
                .text("chunking_strategy", "basic")
                .text("max_characters", limits.max_characters.to_string())
                .text("new_after_n_chars", limits.new_after_n_chars.to_string())
                .text("overlap", limits.overlap.to_string());
        }

        Ok(form)
    }
}

#[async_trait]
impl Partitioner for UnstructuredApiPartitioner {
    fn name(&self) -> &'static str {
        "unstructured"
    }

    fn applies_chunking(&self) -> bool {
        true
    }

    async fn partition(
        &self,
        document: Vec<u8>,
        options: &PartitionOptions,
    ) -> Result<Vec<Element>, PartitionError> {
        let size = document.len();
        let form = Self::build_form(document, options)?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .multipart(form);
        if let Some(key) = self.api_key.as_deref() {
            request = request.header(API_KEY_HEADER, key);
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            bytes = size,
            strategy = options.strategy.as_str(),
            "Sending document to Unstructured API"
        );
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = PartitionError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Unstructured API rejected document");
            return Err(error);
        }

        let elements: Vec<ApiElement> = response.json().await?;
        Ok(elements.into_iter().map(Element::from).collect())
    }
}

/// Element as serialized by the hosted API.
#[derive(Debug, Deserialize)]
struct ApiElement {
    #[serde(rename = "type")]
    category: ElementCategory,
    #[serde(default)]
    element_id: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    metadata: ApiMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct ApiMetadata {
    page_number: Option<u32>,
    filetype: Option<String>,
    parent_id: Option<String>,
}

impl From<ApiElement> for Element {
    fn from(value: ApiElement) -> Self {
        Self {
            element_id: value.element_id,
            category: value.category,
            text: value.text,
            metadata: ElementMetadata {
                page_number: value.metadata.page_number,
                filetype: value.metadata.filetype,
                parent_id: value.metadata.parent_id,
            },
        }
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
