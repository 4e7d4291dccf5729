//! Paragraph extraction from Word and PDF documents.
//!
//! Both readers return the document's text as an ordered list of trimmed,
//! non-empty paragraphs:
//!
//! - **Word**: one entry per body paragraph (text of all its runs, including
//!   runs inside hyperlinks). Tables, headers and footers are not read.
//! - **PDF**: one entry per text line, page by page. A page that yields no
//!   text is skipped or fails the run according to [`EmptyPagePolicy`].
//!
//! Parsing is CPU-bound and synchronous, so [`read_paragraphs`] moves it to
//! tokio's blocking pool.

use crate::config::EmptyPagePolicy;
use crate::document::DocumentFormat;
use crate::error::DocTranslateError;
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read `path` as `format` and return its paragraphs in reading order.
pub async fn read_paragraphs(
    path: &Path,
    format: DocumentFormat,
    policy: EmptyPagePolicy,
) -> Result<Vec<String>, DocTranslateError> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || match format {
        DocumentFormat::Docx => read_docx(&path),
        DocumentFormat::Pdf => read_pdf(&path, policy),
    })
    .await
    .map_err(|e| DocTranslateError::Internal(format!("reader task panicked: {e}")))?
}

// ── Word ─────────────────────────────────────────────────────────────────

/// Read the body paragraphs of a `.docx` file.
pub fn read_docx(path: &Path) -> Result<Vec<String>, DocTranslateError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DocTranslateError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => DocTranslateError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => DocTranslateError::CorruptDocument {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    })?;
    docx_paragraphs(&bytes).map_err(|detail| DocTranslateError::CorruptDocument {
        path: path.to_path_buf(),
        detail,
    })
}

/// Extract trimmed, non-empty body paragraphs from `.docx` bytes.
pub fn docx_paragraphs(bytes: &[u8]) -> Result<Vec<String>, String> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| e.to_string())?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(paragraph_text(&p.children)),
            _ => None,
        })
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    debug!("Word document: {} paragraphs", paragraphs.len());
    Ok(paragraphs)
}

fn paragraph_text(children: &[ParagraphChild]) -> String {
    let mut text = String::new();
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for rc in &run.children {
                    match rc {
                        RunChild::Text(t) => text.push_str(&t.text),
                        RunChild::Tab(_) => text.push('\t'),
                        RunChild::Break(_) => text.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => text.push_str(&paragraph_text(&link.children)),
            _ => {}
        }
    }
    text
}

// ── PDF ──────────────────────────────────────────────────────────────────

/// Read the text lines of a PDF file, page by page.
pub fn read_pdf(path: &Path, policy: EmptyPagePolicy) -> Result<Vec<String>, DocTranslateError> {
    let doc = lopdf::Document::load(path).map_err(|e| DocTranslateError::CorruptDocument {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    pdf_paragraphs(&doc, policy)
}

/// Extract trimmed, non-empty lines from every page of `doc`.
pub fn pdf_paragraphs(
    doc: &lopdf::Document,
    policy: EmptyPagePolicy,
) -> Result<Vec<String>, DocTranslateError> {
    let pages = doc.get_pages();
    let mut lines = Vec::new();

    for (&page_num, _) in pages.iter() {
        let page_text = match doc.extract_text(&[page_num]) {
            Ok(text) => text,
            Err(e) => {
                debug!("Page {}: text extraction failed: {}", page_num, e);
                String::new()
            }
        };

        let before = lines.len();
        lines.extend(
            page_text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        );

        if lines.len() == before {
            match policy {
                EmptyPagePolicy::Skip => {
                    warn!("Page {}: no extractable text, skipping", page_num);
                }
                EmptyPagePolicy::Fail => {
                    return Err(DocTranslateError::EmptyPage {
                        page: page_num as usize,
                    });
                }
            }
        }
    }

    debug!("PDF document: {} pages, {} lines", pages.len(), lines.len());
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Hyperlink, HyperlinkType, Paragraph, Run};
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    fn docx_bytes(docx: Docx) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        docx.build().pack(&mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn docx_skips_empty_and_trims() {
        let bytes = docx_bytes(
            Docx::new()
                .add_paragraph(Paragraph::new().add_run(Run::new().add_text("  Bonjour le monde ")))
                .add_paragraph(Paragraph::new())
                .add_paragraph(Paragraph::new().add_run(Run::new().add_text("   ")))
                .add_paragraph(
                    Paragraph::new()
                        .add_run(Run::new().add_text("Ceci est "))
                        .add_run(Run::new().add_text("un test")),
                ),
        );
        let paragraphs = docx_paragraphs(&bytes).unwrap();
        assert_eq!(paragraphs, vec!["Bonjour le monde", "Ceci est un test"]);
    }

    #[test]
    fn docx_reads_hyperlink_runs() {
        let bytes = docx_bytes(
            Docx::new().add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text("Voir "))
                    .add_hyperlink(
                        Hyperlink::new("https://example.org", HyperlinkType::External)
                            .add_run(Run::new().add_text("le site")),
                    ),
            ),
        );
        assert_eq!(docx_paragraphs(&bytes).unwrap(), vec!["Voir le site"]);
    }

    #[test]
    fn docx_garbage_is_an_error() {
        assert!(docx_paragraphs(b"PK\x03\x04 definitely not a zip").is_err());
    }

    /// Build a PDF with one page per entry; `None` pages carry no text.
    fn pdf_with_pages(pages: &[Option<&[&str]>]) -> lopdf::Document {
        let mut doc = lopdf::Document::with_version("1.5");
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

        let mut kids: Vec<Object> = Vec::new();
        for page in pages {
            let mut operations = Vec::new();
            if let Some(lines) = page {
                for (i, line) in lines.iter().enumerate() {
                    operations.push(Operation::new("BT", vec![]));
                    operations.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
                    operations.push(Operation::new(
                        "Td",
                        vec![72.into(), (770 - 12 * i as i64).into()],
                    ));
                    operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                    operations.push(Operation::new("ET", vec![]));
                }
            }
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            });
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
        doc
    }

    fn joined(lines: &[String]) -> String {
        lines.join(" ")
    }

    #[test]
    fn pdf_lines_follow_page_order() {
        let doc = pdf_with_pages(&[
            Some(&["Premiere page", "Deuxieme ligne"][..]),
            Some(&["Seconde page"][..]),
        ]);
        let lines = pdf_paragraphs(&doc, EmptyPagePolicy::Skip).unwrap();
        let text = joined(&lines);
        let a = text.find("Premiere page").unwrap();
        let b = text.find("Deuxieme ligne").unwrap();
        let c = text.find("Seconde page").unwrap();
        assert!(a < b && b < c, "out of order: {lines:?}");
        assert!(lines.iter().all(|l| !l.is_empty() && l.trim() == l));
    }

    #[test]
    fn pdf_empty_page_is_skipped_by_default() {
        let doc = pdf_with_pages(&[Some(&["Avant"][..]), None, Some(&["Apres"][..])]);
        let lines = pdf_paragraphs(&doc, EmptyPagePolicy::Skip).unwrap();
        let text = joined(&lines);
        assert!(text.contains("Avant") && text.contains("Apres"));
    }

    #[test]
    fn pdf_empty_page_fails_when_configured() {
        let doc = pdf_with_pages(&[Some(&["Avant"][..]), None]);
        let err = pdf_paragraphs(&doc, EmptyPagePolicy::Fail).unwrap_err();
        assert!(matches!(err, DocTranslateError::EmptyPage { page: 2 }));
    }

    #[test]
    fn pdf_garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.4\nthis is not a real pdf").unwrap();
        let err = read_pdf(&path, EmptyPagePolicy::Skip).unwrap_err();
        assert!(matches!(err, DocTranslateError::CorruptDocument { .. }));
    }
}
