//! Markdown partitioning on top of `pulldown-cmark` events.

use super::element::{Element, ElementCategory, ElementSink};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

#[derive(Default)]
struct TableState {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

impl TableState {
    fn render(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

struct MarkdownWalker {
    sink: ElementSink,
    buffer: String,
    item_depth: usize,
    table: Option<TableState>,
    image_start: Option<usize>,
}

impl MarkdownWalker {
    fn flush(&mut self, category: ElementCategory) {
        let text = std::mem::take(&mut self.buffer);
        self.sink.push(category, &text);
    }

    /// Close pending text before a block starts; text inside a list item stays a list item.
    fn flush_pending(&mut self) {
        let category = if self.item_depth > 0 {
            ElementCategory::ListItem
        } else {
            ElementCategory::NarrativeText
        };
        self.flush(category);
    }

    fn write(&mut self, text: &str) {
        match self.table.as_mut() {
            Some(table) => table.cell.push_str(text),
            None => self.buffer.push_str(text),
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { .. } => self.flush_pending(),
            Tag::Paragraph if self.item_depth == 0 => self.flush_pending(),
            Tag::Item => {
                if self.item_depth > 0 {
                    self.flush(ElementCategory::ListItem);
                }
                self.item_depth += 1;
            }
            Tag::CodeBlock(_) => self.flush_pending(),
            Tag::Table(_) => {
                self.flush_pending();
                self.table = Some(TableState::default());
            }
            Tag::TableHead | Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.row.clear();
                }
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.cell.clear();
                }
            }
            Tag::Image { .. } if self.table.is_none() => {
                self.image_start = Some(self.buffer.len());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => self.flush(ElementCategory::Title),
            TagEnd::Paragraph => {
                if self.item_depth == 0 {
                    let category = if self.buffer.trim().is_empty() {
                        ElementCategory::NarrativeText
                    } else {
                        super::text::classify_paragraph(&self.buffer)
                    };
                    let category = match category {
                        ElementCategory::Title => ElementCategory::NarrativeText,
                        other => other,
                    };
                    self.flush(category);
                } else {
                    self.buffer.push(' ');
                }
            }
            TagEnd::Item => {
                self.flush(ElementCategory::ListItem);
                self.item_depth = self.item_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => self.flush(ElementCategory::CodeSnippet),
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    let cell = std::mem::take(&mut table.cell);
                    table.row.push(cell.trim().to_string());
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.sink.push(ElementCategory::Table, &table.render());
                }
            }
            TagEnd::Image => {
                if let Some(start) = self.image_start.take() {
                    let alt = self.buffer.split_off(start);
                    self.sink.push(ElementCategory::Image, &alt);
                }
            }
            _ => {}
        }
    }
}

/// Split a Markdown document into elements.
///
/// Headings become titles, list items are emitted one per item (nested items included), code
/// blocks become code snippets, and tables are rendered with tab-separated cells. Paragraphs
/// keep the plain-text classifier except that they never become titles: Markdown marks titles
/// explicitly.
pub(crate) fn partition_markdown(
    text: &str,
    filetype: &str,
    include_page_breaks: bool,
) -> Vec<Element> {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut walker = MarkdownWalker {
        sink: ElementSink::new(filetype, include_page_breaks),
        buffer: String::new(),
        item_depth: 0,
        table: None,
        image_start: None,
    };

    for event in Parser::new_ext(text, options) {
        match event {
            Event::Start(tag) => walker.start(tag),
            Event::End(tag) => walker.end(tag),
            Event::Text(value) => walker.write(&value),
            Event::Code(value) => walker.write(&value),
            Event::SoftBreak => walker.write(" "),
            Event::HardBreak => walker.write("\n"),
            Event::Rule => walker.flush_pending(),
            _ => {}
        }
    }
    walker.flush(ElementCategory::NarrativeText);
    walker.sink.finish()
}
