//! Top-level translation entry points.
//!
//! A run is strictly sequential: resolve the input, read its paragraphs,
//! translate them batch by batch, then write every requested format. Any
//! fatal error stops the run before the write stage, so a failed run never
//! leaves output files behind.

use crate::config::TranslationConfig;
use crate::document::DocumentFormat;
use crate::error::DocTranslateError;
use crate::output::{OutputFile, TranslationOutput, TranslationStats};
use crate::pipeline::{input, read, translate, write};
use crate::translator::resolve_translator;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Translate a Word or PDF document (local path or URL) and write the
/// translated document in every format of `config.output_formats`.
///
/// # Errors
/// - `UnsupportedFormat` when the input type is neither PDF nor Word; no
///   translator call is made and nothing is written.
/// - `TranslationFailed` when a batch fails; nothing is written.
/// - `OutputWriteFailed` / `SerializeFailed` when writing fails; files
///   already written by this call are removed.
///
/// # Example
/// ```rust,no_run
/// use edgequake_doctranslate::{translate_document, Language, TranslationConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TranslationConfig::builder()
///     .languages(Language::Fr, Language::En)
///     .build()?;
/// let output = translate_document("rapport.docx", &config).await?;
/// for file in &output.files {
///     println!("{}", file.path.display());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn translate_document(
    input_str: impl AsRef<str>,
    config: &TranslationConfig,
) -> Result<TranslationOutput, DocTranslateError> {
    let targets: Vec<(DocumentFormat, PathBuf)> = config
        .output_formats
        .iter()
        .map(|&format| (format, config.output_path(format)))
        .collect();
    run(input_str.as_ref(), config, &targets).await
}

/// Synchronous wrapper around [`translate_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn translate_document_sync(
    input_str: impl AsRef<str>,
    config: &TranslationConfig,
) -> Result<TranslationOutput, DocTranslateError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocTranslateError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(translate_document(input_str, config))
}

/// Translate a document and write it to exactly `output_path`.
///
/// The output format follows the path's extension (`.docx` or `.pdf`);
/// `config.output_formats`, `output_dir` and `output_stem` are ignored.
pub async fn translate_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &TranslationConfig,
) -> Result<TranslationStats, DocTranslateError> {
    let path = output_path.as_ref();
    let format = DocumentFormat::from_path(path)?;
    let output = run(input_str.as_ref(), config, &[(format, path.to_path_buf())]).await?;
    Ok(output.stats)
}

/// Translate an in-memory document of the given format.
///
/// The bytes are spilled to a managed temporary file that is removed when
/// the call returns. `format` takes precedence over `config.declared_mime`.
pub async fn translate_bytes(
    bytes: &[u8],
    format: DocumentFormat,
    config: &TranslationConfig,
) -> Result<TranslationOutput, DocTranslateError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(&format!(".{}", format.extension()))
        .tempfile()
        .map_err(|e| DocTranslateError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| DocTranslateError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    let mut config = config.clone();
    config.declared_mime = Some(format.mime().to_string());
    // `tmp` is dropped (and the file deleted) after the run
    translate_document(&path, &config).await
}

/// Read a document's paragraphs without translating anything.
///
/// Does not require a translator backend.
pub async fn extract(
    input_str: impl AsRef<str>,
    config: &TranslationConfig,
) -> Result<Vec<String>, DocTranslateError> {
    let resolved = input::resolve_input(
        input_str.as_ref(),
        config.declared_mime.as_deref(),
        config.download_timeout_secs,
    )
    .await?;
    read::read_paragraphs(resolved.path(), resolved.format(), config.empty_page_policy).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run(
    input_str: &str,
    config: &TranslationConfig,
    targets: &[(DocumentFormat, PathBuf)],
) -> Result<TranslationOutput, DocTranslateError> {
    let total_start = Instant::now();
    info!("Starting translation: {}", input_str);
    let pair = config.language_pair()?;

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(
        input_str,
        config.declared_mime.as_deref(),
        config.download_timeout_secs,
    )
    .await?;
    let format = resolved.format();

    // ── Step 2: Read paragraphs ──────────────────────────────────────────
    let read_start = Instant::now();
    let source =
        read::read_paragraphs(resolved.path(), format, config.empty_page_policy).await?;
    let read_duration_ms = read_start.elapsed().as_millis() as u64;
    info!(
        "Read {} paragraphs from {} document in {}ms",
        source.len(),
        format,
        read_duration_ms
    );

    // ── Step 3: Translate ────────────────────────────────────────────────
    let translator = resolve_translator(config)?;
    let translate_start = Instant::now();
    let batch_run = translate::translate_paragraphs(translator.as_ref(), &source, pair, config).await?;
    let translate_duration_ms = translate_start.elapsed().as_millis() as u64;
    info!(
        "Translated {} paragraphs in {} batches in {}ms",
        batch_run.translated.len(),
        batch_run.batches,
        translate_duration_ms
    );

    // ── Step 4: Write outputs ────────────────────────────────────────────
    let write_start = Instant::now();
    write::write_outputs(&batch_run.translated, targets).await?;
    let write_duration_ms = write_start.elapsed().as_millis() as u64;

    let files: Vec<OutputFile> = targets
        .iter()
        .map(|(format, path)| OutputFile {
            format: *format,
            path: path.clone(),
        })
        .collect();

    let stats = TranslationStats {
        paragraphs: source.len(),
        batches: batch_run.batches,
        model_calls: batch_run.batches + batch_run.retries as usize,
        truncated_paragraphs: batch_run.truncated,
        retries: batch_run.retries as usize,
        read_duration_ms,
        translate_duration_ms,
        write_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Translation complete: {} files written, {}ms total",
        files.len(),
        stats.total_duration_ms
    );

    Ok(TranslationOutput {
        format,
        source,
        translated: batch_run.translated,
        files,
        stats,
    })
}
