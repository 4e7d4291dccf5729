//! # edgequake-doctranslate
//!
//! Translate Word and PDF documents paragraph by paragraph with a machine
//! translation model, and write the result back as Word and PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .docx / .pdf
//!  │
//!  ├─ 1. Input      resolve local file or download from URL, check type
//!  ├─ 2. Read       ordered, trimmed, non-empty paragraphs (spawn_blocking)
//!  ├─ 3. Translate  fixed-size batches, one model call each, with progress
//!  └─ 4. Write      document_traduit.docx + document_traduit.pdf
//! ```
//!
//! The model sits behind the [`Translator`] trait. Two backends ship with the
//! crate: [`MarianTranslator`] (pretrained `opus-mt` checkpoints served over
//! HTTP, the default) and [`LlmTranslator`] (any chat model reachable through
//! `edgequake-llm`).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doctranslate::{translate_document, Language, TranslationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TranslationConfig::builder()
//!         .languages(Language::Fr, Language::En)
//!         .batch_size(5)
//!         .build()?;
//!     let output = translate_document("rapport.pdf", &config).await?;
//!     eprintln!("{} paragraphs in {} model calls",
//!         output.stats.paragraphs,
//!         output.stats.model_calls);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doctranslate` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-doctranslate = { version = "0.1", default-features = false }
//! ```
//!
//! ## Languages
//!
//! | Code | Language |
//! |------|----------|
//! | `fr` | French   |
//! | `en` | English  |
//! | `es` | Spanish  |
//! | `de` | German   |
//! | `it` | Italian  |
//!
//! Any ordered pair of distinct languages is accepted; the Marian backend
//! loads `Helsinki-NLP/opus-mt-<src>-<tgt>`.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod language;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod translate;
pub mod translator;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    EmptyPagePolicy, TranslationConfig, TranslationConfigBuilder, TranslatorBackend,
    DEFAULT_MAX_INPUT_CHARS,
};
pub use document::{DocumentFormat, DOCX_MIME, PDF_MIME};
pub use error::{BatchError, DocTranslateError};
pub use language::{Language, LanguagePair};
pub use output::{OutputFile, TranslationOutput, TranslationStats};
pub use progress::{NoopProgressCallback, ProgressCallback, TranslationProgressCallback};
pub use translate::{extract, translate_bytes, translate_document, translate_document_sync, translate_file};
pub use translator::{LlmTranslator, MarianTranslator, Translator};
