//! DOCX partitioning straight from `word/document.xml`.
//!
//! Paragraph styles drive classification (`Title`/`Heading*`, `List*`, `Caption`), numbering
//! properties mark list items, and explicit page breaks (`<w:br w:type="page"/>`,
//! `<w:pageBreakBefore/>`) advance the page counter. Only explicit breaks are visible here;
//! Word's own reflow pagination is not.

use super::element::{Element, ElementCategory, ElementSink};
use super::filetype::DOCX_MIME_TYPE;
use super::types::PartitionError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::{Cursor, Read};
use zip::ZipArchive;

#[derive(Default)]
struct Paragraph {
    text: String,
    style: Option<String>,
    numbered: bool,
}

#[derive(Default)]
struct Table {
    depth: usize,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

/// Open the DOCX archive and partition its main document part.
pub(crate) fn partition_docx(
    bytes: &[u8],
    include_page_breaks: bool,
) -> Result<Vec<Element>, PartitionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| PartitionError::Parse(format!("failed to open DOCX archive: {err}")))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|err| PartitionError::Parse(format!("missing word/document.xml: {err}")))?
        .read_to_string(&mut xml)
        .map_err(|err| PartitionError::Parse(format!("failed to read word/document.xml: {err}")))?;

    parse_document_xml(&xml, include_page_breaks)
}

/// Walk the WordprocessingML body and emit one element per paragraph or table.
pub(crate) fn parse_document_xml(
    xml: &str,
    include_page_breaks: bool,
) -> Result<Vec<Element>, PartitionError> {
    let mut reader = Reader::from_str(xml);
    let mut sink = ElementSink::new(DOCX_MIME_TYPE, include_page_breaks);
    let mut paragraph: Option<Paragraph> = None;
    let mut table: Option<Table> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => paragraph = Some(Paragraph::default()),
                b"t" => in_text = true,
                b"numPr" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.numbered = true;
                    }
                }
                b"tbl" => {
                    let state = table.get_or_insert_with(Table::default);
                    state.depth += 1;
                }
                b"tr" => {
                    if let Some(state) = table.as_mut().filter(|t| t.depth == 1) {
                        state.row.clear();
                    }
                }
                b"tc" => {
                    if let Some(state) = table.as_mut().filter(|t| t.depth == 1) {
                        state.cell.clear();
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"pStyle" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.style = attribute(&e, b"val");
                    }
                }
                b"numPr" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.numbered = true;
                    }
                }
                b"pageBreakBefore" if table.is_none() && is_enabled(&e) => sink.page_break(),
                b"tab" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.text.push('\t');
                    }
                }
                b"cr" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.text.push('\n');
                    }
                }
                b"br" => {
                    let is_page = attribute(&e, b"type").as_deref() == Some("page");
                    if is_page && table.is_none() {
                        if let Some(p) = paragraph.as_mut() {
                            let before = std::mem::take(&mut p.text);
                            sink.push(paragraph_category(p, &before), &before);
                        }
                        sink.page_break();
                    } else if let Some(p) = paragraph.as_mut() {
                        p.text.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                if let Some(p) = paragraph.as_mut() {
                    p.text.push_str(&String::from_utf8_lossy(t.as_ref()));
                }
            }
            Ok(Event::GeneralRef(entity)) if in_text => {
                if let (Some(p), Some(resolved)) = (
                    paragraph.as_mut(),
                    resolve_entity(&String::from_utf8_lossy(entity.as_ref())),
                ) {
                    p.text.push_str(&resolved);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if let Some(p) = paragraph.take() {
                        match table.as_mut() {
                            Some(state) => {
                                if !state.cell.is_empty() && !p.text.trim().is_empty() {
                                    state.cell.push('\n');
                                }
                                state.cell.push_str(p.text.trim());
                            }
                            None => sink.push(paragraph_category(&p, &p.text), &p.text),
                        }
                    }
                }
                b"tc" => {
                    if let Some(state) = table.as_mut().filter(|t| t.depth == 1) {
                        let cell = std::mem::take(&mut state.cell);
                        state.row.push(cell);
                    }
                }
                b"tr" => {
                    if let Some(state) = table.as_mut().filter(|t| t.depth == 1) {
                        let row = std::mem::take(&mut state.row);
                        if row.iter().any(|cell| !cell.is_empty()) {
                            state.rows.push(row);
                        }
                    }
                }
                b"tbl" => {
                    if let Some(state) = table.as_mut() {
                        state.depth -= 1;
                        if state.depth == 0 {
                            let rendered = render_rows(&state.rows);
                            table = None;
                            sink.push(ElementCategory::Table, &rendered);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(PartitionError::Parse(format!(
                    "malformed word/document.xml at byte {}: {err}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    Ok(sink.finish())
}

fn paragraph_category(paragraph: &Paragraph, text: &str) -> ElementCategory {
    let style = paragraph
        .style
        .as_deref()
        .unwrap_or_default()
        .to_ascii_lowercase();

    if style == "title" || style == "subtitle" || style.starts_with("heading") {
        ElementCategory::Title
    } else if paragraph.numbered || style.starts_with("list") {
        ElementCategory::ListItem
    } else if style == "caption" {
        ElementCategory::FigureCaption
    } else if style == "header" {
        ElementCategory::Header
    } else if style == "footer" {
        ElementCategory::Footer
    } else {
        super::text::classify_paragraph(text)
    }
}

fn render_rows(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| row.join("\t"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .map(|attr| String::from_utf8_lossy(attr.value.as_ref()).into_owned())
}

/// `<w:pageBreakBefore/>` is on unless `w:val` says otherwise.
fn is_enabled(element: &BytesStart<'_>) -> bool {
    !matches!(
        attribute(element, b"val").as_deref(),
        Some("0" | "false" | "off")
    )
}

fn resolve_entity(name: &str) -> Option<String> {
    if let Some(value) = quick_xml::escape::resolve_predefined_entity(name) {
        return Some(value.to_string());
    }
    let code = match name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => name.strip_prefix('#')?.parse().ok()?,
    };
    char::from_u32(code).map(String::from)
}
