//! Serialisation of translated paragraphs to Word and PDF.
//!
//! Both writers are total: any sequence, including an empty one, produces a
//! valid document with one block per paragraph, in order.
//!
//! - **Word**: one document paragraph per entry.
//! - **PDF**: A4 pages, 72 pt margins, Helvetica 10/12. Each entry becomes a
//!   word-wrapped text block followed by a fixed 5 pt spacer; pages break
//!   automatically.
//!
//! Files are written next to their final path as `<name>.tmp` and renamed,
//! so a reader never sees half a document.

use crate::document::DocumentFormat;
use crate::error::DocTranslateError;
use docx_rs::{Docx, Paragraph, Run};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 72.0;
const FONT_SIZE: f32 = 10.0;
const LEADING: f32 = 12.0;
const SPACER: f32 = 5.0;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Write `paragraphs` to `path` in `format`, atomically.
pub async fn write_document(
    paragraphs: &[String],
    format: DocumentFormat,
    path: &Path,
) -> Result<(), DocTranslateError> {
    let paragraphs = paragraphs.to_vec();
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let bytes = match format {
            DocumentFormat::Docx => docx_bytes(&paragraphs)?,
            DocumentFormat::Pdf => pdf_bytes(&paragraphs)?,
        };
        write_atomic(&path, &bytes)
    })
    .await
    .map_err(|e| DocTranslateError::Internal(format!("writer task panicked: {e}")))?
}

/// Write every requested format; on failure remove whatever this call
/// already wrote so no partial output remains.
pub async fn write_outputs(
    paragraphs: &[String],
    targets: &[(DocumentFormat, PathBuf)],
) -> Result<(), DocTranslateError> {
    let mut written: Vec<&Path> = Vec::with_capacity(targets.len());
    for (format, path) in targets {
        if let Err(e) = write_document(paragraphs, *format, path).await {
            for done in written {
                if let Err(rm) = std::fs::remove_file(done) {
                    warn!("Could not remove partial output {}: {}", done.display(), rm);
                }
            }
            return Err(e);
        }
        debug!("Wrote {} document: {}", format, path.display());
        written.push(path);
    }
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DocTranslateError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DocTranslateError::write_failed(path, e))?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    std::fs::write(&tmp_path, bytes).map_err(|e| DocTranslateError::write_failed(path, e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        DocTranslateError::write_failed(path, e)
    })
}

// ── Word ─────────────────────────────────────────────────────────────────

/// Serialise `paragraphs` as a `.docx` package.
pub fn docx_bytes(paragraphs: &[String]) -> Result<Vec<u8>, DocTranslateError> {
    let docx = paragraphs.iter().fold(Docx::new(), |docx, text| {
        docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(text.as_str())))
    });

    let mut cursor = std::io::Cursor::new(Vec::new());
    docx.build()
        .pack(&mut cursor)
        .map_err(|e| DocTranslateError::SerializeFailed {
            format: DocumentFormat::Docx.to_string(),
            detail: e.to_string(),
        })?;
    Ok(cursor.into_inner())
}

// ── PDF ──────────────────────────────────────────────────────────────────

/// Serialise `paragraphs` as a PDF.
pub fn pdf_bytes(paragraphs: &[String]) -> Result<Vec<u8>, DocTranslateError> {
    let pages = layout(paragraphs);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for lines in &pages {
        let page_id = add_page(&mut doc, pages_id, resources_id, lines)?;
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| DocTranslateError::SerializeFailed {
            format: DocumentFormat::Pdf.to_string(),
            detail: e.to_string(),
        })?;
    Ok(out)
}

/// A positioned line of text.
#[derive(Debug, Clone, PartialEq)]
struct PlacedLine {
    y: f32,
    text: String,
}

/// Flow paragraphs onto pages. Always returns at least one (possibly blank) page.
fn layout(paragraphs: &[String]) -> Vec<Vec<PlacedLine>> {
    let top = PAGE_HEIGHT - MARGIN - FONT_SIZE;
    let bottom = MARGIN;
    let max_chars = ((PAGE_WIDTH - 2.0 * MARGIN) / (FONT_SIZE * AVG_GLYPH_WIDTH)) as usize;

    let mut pages: Vec<Vec<PlacedLine>> = vec![Vec::new()];
    let mut y = top;

    for paragraph in paragraphs {
        for line in wrap(paragraph, max_chars) {
            if y < bottom {
                pages.push(Vec::new());
                y = top;
            }
            if let Some(page) = pages.last_mut() {
                page.push(PlacedLine { y, text: line });
            }
            y -= LEADING;
        }
        y -= SPACER;
    }
    pages
}

/// Greedy word wrap to `max_chars` per line; longer words are hard-split.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let len = word.len();
        if len == 0 {
            continue;
        }
        if current_len > 0 && current_len + 1 + len > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word);
        current_len += len;
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    lines: &[PlacedLine],
) -> Result<ObjectId, DocTranslateError> {
    let mut operations = Vec::with_capacity(lines.len() * 5);
    for line in lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]));
        operations.push(Operation::new("Td", vec![MARGIN.into(), line.y.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(win_ansi(&line.text))],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    let content = Content { operations }
        .encode()
        .map_err(|e| DocTranslateError::SerializeFailed {
            format: DocumentFormat::Pdf.to_string(),
            detail: e.to_string(),
        })?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    }))
}

/// Encode `text` for a WinAnsi simple font; unmappable characters become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => match c {
                '€' => 0x80,
                '‚' => 0x82,
                '„' => 0x84,
                '…' => 0x85,
                'Š' => 0x8A,
                'Œ' => 0x8C,
                'Ž' => 0x8E,
                '\u{2018}' => 0x91,
                '\u{2019}' => 0x92,
                '\u{201C}' => 0x93,
                '\u{201D}' => 0x94,
                '•' => 0x95,
                '–' => 0x96,
                '—' => 0x97,
                '™' => 0x99,
                'š' => 0x9A,
                'œ' => 0x9C,
                'ž' => 0x9E,
                'Ÿ' => 0x9F,
                '\t' => b' ',
                _ => b'?',
            },
        })
        .collect()
}
