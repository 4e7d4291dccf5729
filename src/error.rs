//! Error types for the edgequake-doctranslate library.
//!
//! Two distinct error types reflect two distinct failure scopes:
//!
//! * [`DocTranslateError`] — **Fatal**: the run cannot produce output (the
//!   declared type is unsupported, the document is corrupt, a batch failed).
//!   Returned as `Err(DocTranslateError)` from the top-level `translate*`
//!   functions. No output file survives a fatal error.
//!
//! * [`BatchError`] — a single call to the translation model failed. The
//!   orchestrator may retry it (see
//!   [`crate::config::TranslationConfig::max_retries`]); once retries are
//!   exhausted it is wrapped into [`DocTranslateError::TranslationFailed`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-doctranslate library.
#[derive(Debug, Error)]
pub enum DocTranslateError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The declared type is neither PDF nor Word.
    #[error(
        "Unsupported document type '{declared}'\n\
Only PDF (application/pdf) and Word (.docx) documents can be translated."
    )]
    UnsupportedFormat { declared: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Document errors ───────────────────────────────────────────────────
    /// The file matches its declared type by name but could not be parsed.
    #[error("Document '{path}' is corrupt: {detail}")]
    CorruptDocument { path: PathBuf, detail: String },

    /// A PDF page had no extractable text and the run is configured to fail.
    #[error(
        "Page {page} has no extractable text (scanned image?)\n\
Re-run with --on-empty-page skip to ignore such pages."
    )]
    EmptyPage { page: usize },

    // ── Translation errors ────────────────────────────────────────────────
    /// The translator backend could not be constructed.
    #[error("Translator '{backend}' is not configured.\n{hint}")]
    TranslatorNotConfigured { backend: String, hint: String },

    /// A batch failed after all retries; the whole run is aborted.
    #[error("Translation failed on batch {batch}/{total_batches}: {source}")]
    TranslationFailed {
        batch: usize,
        total_batches: usize,
        #[source]
        source: BatchError,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an output document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document library refused to serialise the translated document.
    #[error("Failed to serialise {format} document: {detail}")]
    SerializeFailed { format: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failure of one call to the translation model.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum BatchError {
    /// The request could not be sent or the backend answered with an error.
    #[error("request failed: {detail}")]
    Request { detail: String },

    /// The backend did not answer in time.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The backend answered, but the body could not be understood.
    #[error("invalid response: {detail}")]
    InvalidResponse { detail: String },

    /// The backend returned a different number of texts than it was sent.
    #[error("expected {expected} translations, got {got}")]
    CountMismatch { expected: usize, got: usize },
}

impl DocTranslateError {
    /// Wrap an I/O error raised while writing `path`.
    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DocTranslateError::OutputWriteFailed {
            path: path.into(),
            source,
        }
    }
}
