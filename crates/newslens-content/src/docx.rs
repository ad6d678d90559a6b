//! Word document text extraction
//!
//! Only body-level paragraphs (direct children of `w:body`) are read.
//! Paragraphs nested in tables or text boxes are skipped. Inside a
//! paragraph, runs contribute their `w:t` text, `w:tab` as a tab and
//! `w:br`/`w:cr` as a newline.

use crate::ContentError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

/// Upper bound on the decompressed document part
const MAX_DOCUMENT_XML_BYTES: u64 = 64 * 1024 * 1024;

/// Extract body paragraphs joined with `\n`
pub(crate) fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, ContentError> {
    let corrupt = |reason: String| ContentError::CorruptDocument {
        filename: filename.to_string(),
        reason,
    };

    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| corrupt(format!("Not a zip archive: {}", e)))?;

    let xml = {
        let entry = archive
            .by_name(DOCUMENT_PART)
            .map_err(|e| corrupt(format!("Missing {}: {}", DOCUMENT_PART, e)))?;

        let mut xml = String::new();
        entry
            .take(MAX_DOCUMENT_XML_BYTES + 1)
            .read_to_string(&mut xml)
            .map_err(|e| corrupt(format!("Failed to read {}: {}", DOCUMENT_PART, e)))?;

        if xml.len() as u64 > MAX_DOCUMENT_XML_BYTES {
            return Err(corrupt(format!(
                "{} exceeds {} bytes",
                DOCUMENT_PART, MAX_DOCUMENT_XML_BYTES
            )));
        }
        xml
    };

    let paragraphs = body_paragraphs(&xml).map_err(corrupt)?;
    Ok(paragraphs.join("\n"))
}

/// Text of each body-level `w:p`, in document order
fn body_paragraphs(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    let mut depth = 0usize;
    let mut body_depth: Option<usize> = None;
    // Paragraph being collected and the depth it opened at
    let mut current: Option<(String, usize)> = None;
    // Depths of the open hyperlink, run and text elements that belong to
    // `current`; anything nested deeper (text boxes, drawings) is ignored
    let mut hyperlink_depth: Option<usize> = None;
    let mut run_depth: Option<usize> = None;
    let mut text_depth: Option<usize> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("Malformed XML at byte {}: {}", reader.buffer_position(), e))?;

        match event {
            Event::Start(element) => {
                depth += 1;
                let paragraph_depth = current.as_ref().map(|(_, opened_at)| *opened_at);
                match element.name().as_ref() {
                    b"w:body" => body_depth = Some(depth),
                    b"w:p" if current.is_none() && is_body_child(body_depth, depth) => {
                        current = Some((String::new(), depth));
                    }
                    b"w:hyperlink" if paragraph_depth.is_some_and(|p| depth == p + 1) => {
                        hyperlink_depth = Some(depth);
                    }
                    b"w:r"
                        if run_depth.is_none()
                            && is_run_position(paragraph_depth, hyperlink_depth, depth) =>
                    {
                        run_depth = Some(depth);
                    }
                    b"w:t" if run_depth.is_some_and(|r| depth == r + 1) => {
                        text_depth = Some(depth);
                    }
                    name => push_special(&mut current, run_depth, depth - 1, name),
                }
            }
            Event::Empty(element) => match element.name().as_ref() {
                b"w:p" if current.is_none() && is_body_child(body_depth, depth + 1) => {
                    paragraphs.push(String::new());
                }
                name => push_special(&mut current, run_depth, depth, name),
            },
            Event::Text(text) if text_depth == Some(depth) => {
                if let Some((paragraph, _)) = current.as_mut() {
                    let unescaped = text
                        .unescape()
                        .map_err(|e| format!("Invalid text content: {}", e))?;
                    paragraph.push_str(&unescaped);
                }
            }
            Event::End(element) => {
                let closes = |open: Option<usize>| open == Some(depth);
                match element.name().as_ref() {
                    b"w:t" if closes(text_depth) => text_depth = None,
                    b"w:r" if closes(run_depth) => run_depth = None,
                    b"w:hyperlink" if closes(hyperlink_depth) => hyperlink_depth = None,
                    b"w:p" if matches!(current, Some((_, opened_at)) if opened_at == depth) => {
                        if let Some((paragraph, _)) = current.take() {
                            paragraphs.push(paragraph);
                        }
                    }
                    b"w:body" => body_depth = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(format!("Unexpected end of document with {} open elements", depth));
    }

    Ok(paragraphs)
}

fn is_body_child(body_depth: Option<usize>, depth: usize) -> bool {
    body_depth.is_some_and(|body| depth == body + 1)
}

/// A run counts when it sits directly in the paragraph or in one of its hyperlinks
fn is_run_position(
    paragraph_depth: Option<usize>,
    hyperlink_depth: Option<usize>,
    depth: usize,
) -> bool {
    paragraph_depth.is_some_and(|p| depth == p + 1)
        || hyperlink_depth.is_some_and(|h| depth == h + 1)
}

/// Tabs and breaks that are direct children of the current run
///
/// `parent_depth` is the depth of the element that contains `name`.
fn push_special(
    current: &mut Option<(String, usize)>,
    run_depth: Option<usize>,
    parent_depth: usize,
    name: &[u8],
) {
    let Some((paragraph, _)) = current.as_mut() else {
        return;
    };
    if run_depth != Some(parent_depth) {
        return;
    }
    match name {
        b"w:tab" => paragraph.push('\t'),
        b"w:br" | b"w:cr" => paragraph.push('\n'),
        _ => {}
    }
}
