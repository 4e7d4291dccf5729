//! Document formats: declared MIME types, extensions, and magic bytes.
//!
//! A document is accepted on its *declared* type (upload MIME type, HTTP
//! `Content-Type`, or file extension) and then checked against its first
//! bytes, so a mislabelled file fails with a clear error before any parser
//! touches it.

use crate::error::DocTranslateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// MIME type of PDF documents.
pub const PDF_MIME: &str = "application/pdf";

/// MIME type of Word OOXML documents.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// A document format the crate can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub fn mime(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => PDF_MIME,
            DocumentFormat::Docx => DOCX_MIME,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }

    /// Resolve a declared MIME type. Parameters (`; charset=…`) are ignored.
    pub fn from_mime(mime: &str) -> Result<Self, DocTranslateError> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            PDF_MIME => Ok(DocumentFormat::Pdf),
            DOCX_MIME => Ok(DocumentFormat::Docx),
            _ => Err(DocTranslateError::UnsupportedFormat {
                declared: mime.to_string(),
            }),
        }
    }

    /// Resolve the type declared by a file name's extension.
    pub fn from_path(path: &Path) -> Result<Self, DocTranslateError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => Ok(DocumentFormat::Pdf),
            Some("docx") => Ok(DocumentFormat::Docx),
            _ => Err(DocTranslateError::UnsupportedFormat {
                declared: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
            }),
        }
    }

    /// Leading bytes every well-formed file of this format starts with.
    pub fn magic(self) -> &'static [u8] {
        match self {
            DocumentFormat::Pdf => b"%PDF",
            // .docx is a zip container
            DocumentFormat::Docx => b"PK\x03\x04",
        }
    }

    /// Check that `head` (the first bytes of a file) matches this format.
    pub fn matches_magic(self, head: &[u8]) -> bool {
        head.starts_with(self.magic())
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Pdf => f.write_str("PDF"),
            DocumentFormat::Docx => f.write_str("Word"),
        }
    }
}
