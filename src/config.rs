//! Configuration types for document translation.
//!
//! All run behaviour is controlled through [`TranslationConfig`], built via
//! its [`TranslationConfigBuilder`]. One struct replaces what would otherwise
//! be several near-identical pipelines that differ only in batch size,
//! truncation, and output formats.

use crate::document::DocumentFormat;
use crate::error::DocTranslateError;
use crate::language::{Language, LanguagePair, DEFAULT_MODEL_PROVIDER};
use crate::progress::ProgressCallback;
use crate::translator::Translator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default base URL of the Marian inference endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api-inference.huggingface.co/models";

/// File stem shared by every output document.
pub const DEFAULT_OUTPUT_STEM: &str = "document_traduit";

/// Default cap on characters per paragraph sent to the model.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 1500;

/// Configuration for a document translation run.
///
/// Built via [`TranslationConfig::builder()`] or using
/// [`TranslationConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_doctranslate::{DocumentFormat, Language, TranslationConfig};
///
/// let config = TranslationConfig::builder()
///     .languages(Language::Fr, Language::En)
///     .batch_size(1)
///     .output_formats(vec![DocumentFormat::Docx])
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct TranslationConfig {
    /// Language of the input document. Default: French.
    pub source_lang: Language,

    /// Language of the output documents. Default: English.
    pub target_lang: Language,

    /// Paragraphs per model call. Default: 5. Minimum: 1.
    pub batch_size: usize,

    /// Longest paragraph (in characters) sent to the model. Default: 1500.
    ///
    /// Marian checkpoints accept 512 tokens. The character cap is a heuristic:
    /// at the usual 3 to 4 characters per SentencePiece token, 1500 characters
    /// fits that window for the supported languages. Longer paragraphs are cut,
    /// never rejected. `None` sends paragraphs untouched.
    pub max_input_chars: Option<usize>,

    /// Formats to write. Default: Word and PDF.
    pub output_formats: Vec<DocumentFormat>,

    /// Directory receiving the output documents. Default: current directory.
    pub output_dir: PathBuf,

    /// File stem of the output documents. Default: `document_traduit`.
    pub output_stem: String,

    /// Declared MIME type of the input. Overrides the type inferred from the
    /// URL response or file extension.
    pub declared_mime: Option<String>,

    /// What to do with a PDF page that yields no text. Default: skip it.
    pub empty_page_policy: EmptyPagePolicy,

    /// Translation backend. Ignored when `translator` is set.
    pub backend: TranslatorBackend,

    /// Organisation prefix of the Marian model name. Default: `Helsinki-NLP`.
    pub model_provider: String,

    /// Base URL of the Marian inference endpoint.
    pub endpoint: String,

    /// Bearer token for the Marian endpoint.
    pub api_token: Option<String>,

    /// LLM provider name for [`TranslatorBackend::Llm`] (e.g. "openai").
    /// If None, auto-detected from the environment.
    pub llm_provider_name: Option<String>,

    /// LLM model identifier for [`TranslatorBackend::Llm`].
    pub llm_model: Option<String>,

    /// LLM sampling temperature. Default: 0.0.
    pub temperature: f32,

    /// LLM output token budget per batch. Default: 4096.
    pub max_tokens: usize,

    /// Pre-constructed translator. Takes precedence over `backend`.
    pub translator: Option<Arc<dyn Translator>>,

    /// Retries per failed batch. Default: 0 (first failure aborts the run).
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call timeout of the translation backend in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Receives per-batch progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_lang: Language::Fr,
            target_lang: Language::En,
            batch_size: 5,
            max_input_chars: Some(DEFAULT_MAX_INPUT_CHARS),
            output_formats: vec![DocumentFormat::Docx, DocumentFormat::Pdf],
            output_dir: PathBuf::from("."),
            output_stem: DEFAULT_OUTPUT_STEM.to_string(),
            declared_mime: None,
            empty_page_policy: EmptyPagePolicy::default(),
            backend: TranslatorBackend::default(),
            model_provider: DEFAULT_MODEL_PROVIDER.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_token: None,
            llm_provider_name: None,
            llm_model: None,
            temperature: 0.0,
            max_tokens: 4096,
            translator: None,
            max_retries: 0,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for TranslationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationConfig")
            .field("source_lang", &self.source_lang)
            .field("target_lang", &self.target_lang)
            .field("batch_size", &self.batch_size)
            .field("max_input_chars", &self.max_input_chars)
            .field("output_formats", &self.output_formats)
            .field("output_dir", &self.output_dir)
            .field("output_stem", &self.output_stem)
            .field("declared_mime", &self.declared_mime)
            .field("empty_page_policy", &self.empty_page_policy)
            .field("backend", &self.backend)
            .field("model_provider", &self.model_provider)
            .field("endpoint", &self.endpoint)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("llm_provider_name", &self.llm_provider_name)
            .field("llm_model", &self.llm_model)
            .field("translator", &self.translator.as_ref().map(|t| t.name().to_string()))
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl TranslationConfig {
    /// Create a new builder for `TranslationConfig`.
    pub fn builder() -> TranslationConfigBuilder {
        TranslationConfigBuilder {
            config: Self::default(),
        }
    }

    /// The validated source → target pair.
    pub fn language_pair(&self) -> Result<LanguagePair, DocTranslateError> {
        LanguagePair::new(self.source_lang, self.target_lang)
    }

    /// Path of the output document for `format`.
    pub fn output_path(&self, format: DocumentFormat) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.output_stem, format.extension()))
    }
}

/// Builder for [`TranslationConfig`].
#[derive(Debug)]
pub struct TranslationConfigBuilder {
    config: TranslationConfig,
}

impl TranslationConfigBuilder {
    pub fn source_lang(mut self, lang: Language) -> Self {
        self.config.source_lang = lang;
        self
    }

    pub fn target_lang(mut self, lang: Language) -> Self {
        self.config.target_lang = lang;
        self
    }

    pub fn languages(self, source: Language, target: Language) -> Self {
        self.source_lang(source).target_lang(target)
    }

    pub fn batch_size(mut self, n: usize) -> Self {
        self.config.batch_size = n.max(1);
        self
    }

    pub fn max_input_chars(mut self, n: Option<usize>) -> Self {
        self.config.max_input_chars = n;
        self
    }

    pub fn output_formats(mut self, formats: Vec<DocumentFormat>) -> Self {
        self.config.output_formats = formats;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn output_stem(mut self, stem: impl Into<String>) -> Self {
        self.config.output_stem = stem.into();
        self
    }

    pub fn declared_mime(mut self, mime: impl Into<String>) -> Self {
        self.config.declared_mime = Some(mime.into());
        self
    }

    pub fn empty_page_policy(mut self, policy: EmptyPagePolicy) -> Self {
        self.config.empty_page_policy = policy;
        self
    }

    pub fn backend(mut self, backend: TranslatorBackend) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn model_provider(mut self, provider: impl Into<String>) -> Self {
        self.config.model_provider = provider.into();
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.config.api_token = Some(token.into());
        self
    }

    pub fn llm_provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.llm_provider_name = Some(name.into());
        self
    }

    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.config.llm_model = Some(model.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.config.translator = Some(translator);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<TranslationConfig, DocTranslateError> {
        self.config.language_pair()?;

        let c = &mut self.config;
        if c.batch_size == 0 {
            return Err(DocTranslateError::InvalidConfig(
                "Batch size must be ≥ 1".into(),
            ));
        }
        if c.max_input_chars == Some(0) {
            return Err(DocTranslateError::InvalidConfig(
                "max_input_chars must be ≥ 1 (use None to disable truncation)".into(),
            ));
        }

        let mut seen = Vec::with_capacity(c.output_formats.len());
        c.output_formats.retain(|f| {
            let fresh = !seen.contains(f);
            seen.push(*f);
            fresh
        });
        if c.output_formats.is_empty() {
            return Err(DocTranslateError::InvalidConfig(
                "At least one output format is required".into(),
            ));
        }
        if c.output_stem.trim().is_empty() {
            return Err(DocTranslateError::InvalidConfig(
                "Output file stem must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Handling of PDF pages that yield no extractable text (scanned images).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPagePolicy {
    /// Log and continue with the next page. (default)
    #[default]
    Skip,
    /// Abort with [`DocTranslateError::EmptyPage`].
    Fail,
}

/// Which external model performs the translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslatorBackend {
    /// Pretrained `opus-mt` Marian model behind an HTTP inference endpoint. (default)
    #[default]
    Marian,
    /// General-purpose LLM through `edgequake-llm`.
    Llm,
}
