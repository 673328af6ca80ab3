//! Element model returned by partitioners.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

const ELEMENT_ID_HEX_LEN: usize = 32;

/// Category label attached to each partition element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementCategory {
    /// Section or document heading.
    Title,
    /// Prose paragraph.
    NarrativeText,
    /// Bulleted or enumerated list entry.
    ListItem,
    /// Whole table.
    Table,
    /// Piece of a table that exceeded the chunk budget.
    TableChunk,
    /// Boundary between two pages.
    PageBreak,
    /// Running page header.
    Header,
    /// Running page footer.
    Footer,
    /// Source code block.
    CodeSnippet,
    /// Image, rendered through its alt text or OCR text.
    Image,
    /// Caption attached to a figure or table.
    FigureCaption,
    /// Mathematical formula.
    Formula,
    /// Postal address.
    Address,
    /// Bare e-mail address.
    EmailAddress,
    /// Text that matched no other category.
    UncategorizedText,
    /// Chunk combining several sequential elements.
    CompositeElement,
    /// Label reported by an external partitioner that has no dedicated variant.
    Other(String),
}

impl ElementCategory {
    /// Label used in JSON responses.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Title => "Title",
            Self::NarrativeText => "NarrativeText",
            Self::ListItem => "ListItem",
            Self::Table => "Table",
            Self::TableChunk => "TableChunk",
            Self::PageBreak => "PageBreak",
            Self::Header => "Header",
            Self::Footer => "Footer",
            Self::CodeSnippet => "CodeSnippet",
            Self::Image => "Image",
            Self::FigureCaption => "FigureCaption",
            Self::Formula => "Formula",
            Self::Address => "Address",
            Self::EmailAddress => "EmailAddress",
            Self::UncategorizedText => "UncategorizedText",
            Self::CompositeElement => "CompositeElement",
            Self::Other(label) => label,
        }
    }

    /// Parse a label, keeping unknown labels verbatim.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Title" => Self::Title,
            "NarrativeText" => Self::NarrativeText,
            "ListItem" => Self::ListItem,
            "Table" => Self::Table,
            "TableChunk" => Self::TableChunk,
            "PageBreak" => Self::PageBreak,
            "Header" => Self::Header,
            "Footer" => Self::Footer,
            "CodeSnippet" => Self::CodeSnippet,
            "Image" => Self::Image,
            "FigureCaption" => Self::FigureCaption,
            "Formula" => Self::Formula,
            "Address" => Self::Address,
            "EmailAddress" => Self::EmailAddress,
            "UncategorizedText" => Self::UncategorizedText,
            "CompositeElement" => Self::CompositeElement,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ElementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ElementCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ElementCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// Positional and provenance metadata for an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ElementMetadata {
    /// 1-based page the element starts on, when the format has pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    /// MIME type of the source document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filetype: Option<String>,
    /// Identifier of the enclosing element, when the partitioner reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// A structured fragment of a partitioned document.
///
/// The `Display` rendering is the element text, which is what the `chunks` response shape
/// returns for each element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    /// Stable identifier for the element.
    pub element_id: String,
    /// Category label.
    pub category: ElementCategory,
    /// Text content; empty for page breaks.
    pub text: String,
    /// Positional metadata.
    pub metadata: ElementMetadata,
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Derive a deterministic element id from the element's category, text, position, and page.
pub fn compute_element_id(
    category: &ElementCategory,
    text: &str,
    sequence: usize,
    page_number: Option<u32>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(category.as_str().as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(page_number.unwrap_or(0).to_le_bytes());
    hasher.update(text.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(ELEMENT_ID_HEX_LEN);
    digest
}

/// Accumulates elements while a native partitioner walks a document.
///
/// Tracks the current page so each element carries its page number, and drops empty text.
pub(crate) struct ElementSink {
    filetype: String,
    include_page_breaks: bool,
    page: u32,
    elements: Vec<Element>,
}

impl ElementSink {
    pub(crate) fn new(filetype: &str, include_page_breaks: bool) -> Self {
        Self {
            filetype: filetype.to_string(),
            include_page_breaks,
            page: 1,
            elements: Vec::new(),
        }
    }

    /// Append an element; whitespace-only text is ignored.
    pub(crate) fn push(&mut self, category: ElementCategory, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.push_raw(category, text.to_string());
    }

    /// Close the current page, emitting a `PageBreak` element when enabled.
    pub(crate) fn page_break(&mut self) {
        if self.include_page_breaks {
            self.push_raw(ElementCategory::PageBreak, String::new());
        }
        self.page += 1;
    }

    pub(crate) fn finish(self) -> Vec<Element> {
        self.elements
    }

    fn push_raw(&mut self, category: ElementCategory, text: String) {
        let page_number = Some(self.page);
        let element_id = compute_element_id(&category, &text, self.elements.len(), page_number);
        self.elements.push(Element {
            element_id,
            category,
            text,
            metadata: ElementMetadata {
                page_number,
                filetype: Some(self.filetype.clone()),
                parent_id: None,
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_round_trip_and_keep_unknowns() {
        assert_eq!(
            ElementCategory::from_label("NarrativeText"),
            ElementCategory::NarrativeText
        );
        let other = ElementCategory::from_label("Sidebar");
        assert_eq!(other, ElementCategory::Other("Sidebar".into()));
        assert_eq!(other.as_str(), "Sidebar");
    }

    #[test]
    fn element_ids_are_stable_and_position_sensitive() {
        let first = compute_element_id(&ElementCategory::Title, "Intro", 0, Some(1));
        let again = compute_element_id(&ElementCategory::Title, "Intro", 0, Some(1));
        let moved = compute_element_id(&ElementCategory::Title, "Intro", 1, Some(1));

        assert_eq!(first, again);
        assert_ne!(first, moved);
        assert_eq!(first.len(), 32);
    }

    #[test]
    fn sink_tracks_pages_and_skips_blank_text() {
        let mut sink = ElementSink::new("text/plain", true);
        sink.push(ElementCategory::Title, "  Heading ");
        sink.push(ElementCategory::NarrativeText, "   ");
        sink.page_break();
        sink.push(ElementCategory::NarrativeText, "Second page.");
        let elements = sink.finish();

        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].text, "Heading");
        assert_eq!(elements[1].category, ElementCategory::PageBreak);
        assert_eq!(elements[1].to_string(), "");
        assert_eq!(elements[2].metadata.page_number, Some(2));
    }

    #[test]
    fn sink_without_page_breaks_still_advances_pages() {
        let mut sink = ElementSink::new("text/plain", false);
        sink.page_break();
        sink.push(ElementCategory::NarrativeText, "Later.");
        let elements = sink.finish();

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].metadata.page_number, Some(2));
    }
}
