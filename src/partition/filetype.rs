//! Content-based file type detection for decoded documents.
//!
//! Requests carry raw bytes without a filename, so detection relies on magic bytes (`infer`),
//! a peek inside ZIP containers for Office documents, and a few Markdown markers for UTF-8 text.

use std::io::Cursor;
use zip::ZipArchive;

/// MIME type of Word OOXML documents.
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Document formats recognized by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileType {
    /// Portable Document Format.
    Pdf,
    /// Word OOXML document.
    Docx,
    /// HTML page.
    Html,
    /// Markdown text.
    Markdown,
    /// Plain UTF-8 text.
    Text,
    /// Raster image, with its MIME type.
    Image(String),
    /// Anything else, with the best-known MIME type.
    Unknown(String),
}

impl FileType {
    /// MIME type reported in element metadata and sent to the hosted API.
    pub fn mime_type(&self) -> &str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => DOCX_MIME_TYPE,
            Self::Html => "text/html",
            Self::Markdown => "text/markdown",
            Self::Text => "text/plain",
            Self::Image(mime) | Self::Unknown(mime) => mime,
        }
    }

    /// File extension used when a filename is required.
    pub fn extension(&self) -> &str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Html => "html",
            Self::Markdown => "md",
            Self::Text => "txt",
            Self::Image(mime) => mime.rsplit('/').next().unwrap_or("img"),
            Self::Unknown(_) => "bin",
        }
    }
}

/// Detect the format of a decoded document from its contents.
pub fn detect_file_type(bytes: &[u8]) -> FileType {
    if bytes.starts_with(ZIP_MAGIC) && zip_contains(bytes, "word/document.xml") {
        return FileType::Docx;
    }

    if let Some(kind) = infer::get(bytes) {
        match kind.mime_type() {
            "application/pdf" => return FileType::Pdf,
            DOCX_MIME_TYPE => return FileType::Docx,
            "text/html" => return FileType::Html,
            mime if kind.matcher_type() == infer::MatcherType::Image => {
                return FileType::Image(mime.to_string());
            }
            mime if mime.starts_with("text/") => {}
            mime => return FileType::Unknown(mime.to_string()),
        }
    }

    match std::str::from_utf8(bytes) {
        Ok(text) if looks_like_markdown(text) => FileType::Markdown,
        Ok(_) => FileType::Text,
        Err(_) => FileType::Unknown("application/octet-stream".to_string()),
    }
}

fn zip_contains(bytes: &[u8], entry: &str) -> bool {
    match ZipArchive::new(Cursor::new(bytes)) {
        Ok(archive) => archive.index_for_name(entry).is_some(),
        Err(_) => false,
    }
}

/// Heuristic Markdown check: ATX headings, code fences, or a table delimiter row.
pub(crate) fn looks_like_markdown(text: &str) -> bool {
    text.lines().any(|line| {
        let trimmed = line.trim_start();
        is_atx_heading(trimmed) || trimmed.starts_with("```") || is_table_delimiter(trimmed)
    })
}

fn is_atx_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    (1..=6).contains(&hashes) && line[hashes..].starts_with(' ')
}

fn is_table_delimiter(line: &str) -> bool {
    let line = line.trim_end();
    line.contains('|')
        && line.contains("---")
        && line
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::{ZipWriter, write::SimpleFileOptions};

    #[test]
    fn detects_pdf_magic() {
        assert_eq!(detect_file_type(b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n"), FileType::Pdf);
    }

    #[test]
    fn detects_plain_text_and_markdown() {
        assert_eq!(detect_file_type(b"Quarterly report\n\nAll good."), FileType::Text);
        assert_eq!(
            detect_file_type(b"# Quarterly report\n\nAll good."),
            FileType::Markdown
        );
        assert_eq!(
            detect_file_type(b"| a | b |\n|---|---|\n| 1 | 2 |"),
            FileType::Markdown
        );
    }

    #[test]
    fn hashtags_are_not_headings() {
        assert!(!looks_like_markdown("#rustlang is great"));
    }

    #[test]
    fn detects_docx_by_archive_contents() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .expect("start entry");
        writer.write_all(b"<w:document/>").expect("write entry");
        let bytes = writer.finish().expect("finish archive").into_inner();

        assert_eq!(detect_file_type(&bytes), FileType::Docx);
    }

    #[test]
    fn binary_noise_is_unknown() {
        let detected = detect_file_type(&[0x00, 0x01, 0x02, 0x9f, 0xff, 0x80]);
        assert!(matches!(detected, FileType::Unknown(_)));
    }
}
