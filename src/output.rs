//! Result types returned by the top-level translation API.

use crate::document::DocumentFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a translation run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationOutput {
    /// Format of the input document.
    pub format: DocumentFormat,
    /// Paragraphs read from the input, in reading order.
    pub source: Vec<String>,
    /// Translations; `translated[i]` is the translation of `source[i]`.
    pub translated: Vec<String>,
    /// Files written, one per requested output format.
    pub files: Vec<OutputFile>,
    pub stats: TranslationStats,
}

/// A document written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    pub format: DocumentFormat,
    pub path: PathBuf,
}

/// Counters and timings for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationStats {
    /// Paragraphs read from the input.
    pub paragraphs: usize,
    /// Batches the paragraphs were split into.
    pub batches: usize,
    /// Translator calls made, retries included.
    pub model_calls: usize,
    /// Paragraphs cut to `max_input_chars` before sending.
    pub truncated_paragraphs: usize,
    /// Failed attempts that were retried.
    pub retries: usize,
    pub read_duration_ms: u64,
    pub translate_duration_ms: u64,
    pub write_duration_ms: u64,
    pub total_duration_ms: u64,
}
