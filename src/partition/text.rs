//! Plain-text partitioning.
//!
//! Pages are separated by form feeds, blocks by blank lines. Each block is classified with a
//! handful of cheap heuristics: list markers, lone e-mail addresses, short unpunctuated lines
//! (titles), and prose.

use super::element::{Element, ElementCategory, ElementSink};

/// Blocks with at most this many words and no sentence terminator are treated as titles.
const MAX_TITLE_WORDS: usize = 12;

const BULLETS: [char; 9] = ['•', '-', '*', '‣', '◦', '▪', '●', '–', '·'];

/// Split plain text into elements.
pub(crate) fn partition_text(
    text: &str,
    filetype: &str,
    include_page_breaks: bool,
) -> Vec<Element> {
    let mut sink = ElementSink::new(filetype, include_page_breaks);
    let normalized = text.replace("\r\n", "\n");

    for (index, page) in normalized.split('\x0c').enumerate() {
        if index > 0 {
            sink.page_break();
        }
        for block in split_blocks(page) {
            push_block(&block, &mut sink);
        }
    }

    sink.finish()
}

fn split_blocks(page: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in page.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn push_block(lines: &[&str], sink: &mut ElementSink) {
    let items: Vec<&str> = lines.iter().filter_map(|line| list_item_body(line)).collect();
    if items.len() == lines.len() {
        for item in items {
            sink.push(ElementCategory::ListItem, item);
        }
        return;
    }

    let text = lines
        .iter()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join(" ");
    sink.push(classify_paragraph(&text), &text);
}

/// Return the item text when `line` starts with a bullet or an enumeration marker.
pub(crate) fn list_item_body(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();

    if let Some(rest) = trimmed.strip_prefix(BULLETS) {
        return non_empty_after_space(rest);
    }

    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    if (1..=3).contains(&digits) {
        let rest = &trimmed[digits..];
        if let Some(rest) = rest.strip_prefix(['.', ')']) {
            return non_empty_after_space(rest);
        }
    }

    None
}

fn non_empty_after_space(rest: &str) -> Option<&str> {
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let body = rest.trim();
    (!body.is_empty()).then_some(body)
}

/// Classify a paragraph that is not a list.
pub(crate) fn classify_paragraph(text: &str) -> ElementCategory {
    let text = text.trim();
    if !text.chars().any(char::is_alphabetic) {
        return ElementCategory::UncategorizedText;
    }
    if is_email_address(text) {
        return ElementCategory::EmailAddress;
    }

    let words = text.split_whitespace().count();
    let ends_sentence = text.ends_with(['.', '!', '?']);
    if words <= MAX_TITLE_WORDS && !ends_sentence {
        ElementCategory::Title
    } else {
        ElementCategory::NarrativeText
    }
}

fn is_email_address(text: &str) -> bool {
    if text.split_whitespace().count() != 1 {
        return false;
    }
    match text.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(elements: &[Element]) -> Vec<&str> {
        elements.iter().map(|e| e.category.as_str()).collect()
    }

    #[test]
    fn classifies_titles_prose_and_lists() {
        let text = "Annual Report\n\nRevenue grew across every region this year.\nMargins held.\n\n- North\n- South\n";
        let elements = partition_text(text, "text/plain", true);

        assert_eq!(
            categories(&elements),
            vec!["Title", "NarrativeText", "ListItem", "ListItem"]
        );
        assert_eq!(
            elements[1].text,
            "Revenue grew across every region this year. Margins held."
        );
        assert_eq!(elements[2].text, "North");
    }

    #[test]
    fn form_feed_starts_new_page() {
        let elements = partition_text("First page.\x0cSecond page.", "text/plain", true);

        assert_eq!(
            categories(&elements),
            vec!["NarrativeText", "PageBreak", "NarrativeText"]
        );
        assert_eq!(elements[2].metadata.page_number, Some(2));
    }

    #[test]
    fn page_breaks_can_be_suppressed() {
        let elements = partition_text("First page.\x0cSecond page.", "text/plain", false);
        assert_eq!(categories(&elements), vec!["NarrativeText", "NarrativeText"]);
    }

    #[test]
    fn enumerated_items_require_marker_and_space() {
        assert_eq!(list_item_body("1. Install"), Some("Install"));
        assert_eq!(list_item_body("  12) Configure"), Some("Configure"));
        assert_eq!(list_item_body("3.14 is pi"), None);
        assert_eq!(list_item_body("-dash"), None);
        assert_eq!(list_item_body("• "), None);
    }

    #[test]
    fn mixed_blocks_are_not_lists() {
        let elements = partition_text("Steps to follow:\n1. Install", "text/plain", true);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].text, "Steps to follow: 1. Install");
    }

    #[test]
    fn recognizes_email_and_numeric_blocks() {
        assert_eq!(
            classify_paragraph("ops@example.com"),
            ElementCategory::EmailAddress
        );
        assert_eq!(
            classify_paragraph("2024 - 2025"),
            ElementCategory::UncategorizedText
        );
    }

    #[test]
    fn blank_input_yields_no_elements() {
        assert!(partition_text(" \n\n\t\n", "text/plain", true).is_empty());
    }
}
