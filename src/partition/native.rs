//! In-process partitioner for text-family documents.

use super::{
    Partitioner,
    docx::partition_docx,
    element::Element,
    filetype::{FileType, detect_file_type},
    markdown::partition_markdown,
    text::partition_text,
    types::{PartitionError, PartitionOptions, Strategy},
};
use async_trait::async_trait;

/// Partitions plain text, Markdown, and DOCX documents without leaving the process.
///
/// Formats that need layout analysis or OCR (PDF, images, HTML) are rejected with
/// [`PartitionError::UnsupportedFileType`]; route those through the hosted API backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativePartitioner;

impl NativePartitioner {
    /// Construct the native partitioner.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Partitioner for NativePartitioner {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn partition(
        &self,
        document: Vec<u8>,
        options: &PartitionOptions,
    ) -> Result<Vec<Element>, PartitionError> {
        let options = *options;
        tokio::task::spawn_blocking(move || partition_bytes(&document, &options))
            .await
            .map_err(|err| PartitionError::Task(err.to_string()))?
    }
}

/// Synchronously partition a decoded document.
pub fn partition_bytes(
    bytes: &[u8],
    options: &PartitionOptions,
) -> Result<Vec<Element>, PartitionError> {
    let file_type = detect_file_type(bytes);
    if !matches!(options.strategy, Strategy::Auto | Strategy::Fast) {
        tracing::debug!(
            strategy = options.strategy.as_str(),
            file_type = file_type.mime_type(),
            "Native partitioner reads the text layer regardless of strategy"
        );
    }

    match &file_type {
        FileType::Text => Ok(partition_text(
            &decode_utf8(bytes)?,
            file_type.mime_type(),
            options.include_page_breaks,
        )),
        FileType::Markdown => Ok(partition_markdown(
            &decode_utf8(bytes)?,
            file_type.mime_type(),
            options.include_page_breaks,
        )),
        FileType::Docx => partition_docx(bytes, options.include_page_breaks),
        other => Err(PartitionError::UnsupportedFileType(
            other.mime_type().to_string(),
        )),
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String, PartitionError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|err| PartitionError::Parse(format!("document is not valid UTF-8: {err}")))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::ChunkingStrategy;

    fn options() -> PartitionOptions {
        PartitionOptions {
            include_page_breaks: true,
            strategy: Strategy::HiRes,
            chunking: ChunkingStrategy::None,
        }
    }

    #[tokio::test]
    async fn partitions_plain_text_off_the_runtime() {
        let elements = NativePartitioner::new()
            .partition(b"Title Line\n\nA full sentence of body text.".to_vec(), &options())
            .await
            .expect("partition");

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].metadata.filetype.as_deref(), Some("text/plain"));
    }

    #[test]
    fn strips_byte_order_mark() {
        let elements =
            partition_bytes("\u{feff}Hello there.".as_bytes(), &options()).expect("partition");
        assert_eq!(elements[0].text, "Hello there.");
    }

    #[test]
    fn rejects_pdf_documents() {
        let error = partition_bytes(b"%PDF-1.4\n1 0 obj\n", &options()).unwrap_err();
        match error {
            PartitionError::UnsupportedFileType(mime) => assert_eq!(mime, "application/pdf"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
