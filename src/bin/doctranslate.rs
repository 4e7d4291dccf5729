//! CLI binary for edgequake-doctranslate.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `TranslationConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_doctranslate::{
    extract, translate_document, DocumentFormat, EmptyPagePolicy, Language, ProgressCallback,
    DEFAULT_MAX_INPUT_CHARS,
    TranslationConfig, TranslationProgressCallback, TranslatorBackend,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while the document is read, then a
/// paragraph-count bar advanced after every batch.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Batches that failed (at most one, since a failure aborts the run).
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose bar length is set by `on_translation_start`.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading document…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} paragraphs  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Translating");
        self.bar.reset_eta();
    }

    /// Remove the spinner or bar when the run stops before completing.
    fn clear(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl TranslationProgressCallback for CliProgressCallback {
    fn on_translation_start(&self, total_paragraphs: usize, total_batches: usize) {
        self.activate_bar(total_paragraphs);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Translating {total_paragraphs} paragraphs in {total_batches} batches…"
            ))
        ));
    }

    fn on_progress(&self, _fraction: f32, done: usize, _total: usize) {
        self.bar.set_position(done as u64);
    }

    fn on_batch_error(&self, batch: usize, total_batches: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Batch {:>3}/{:<3}  {}",
            red("✗"),
            batch,
            total_batches,
            red(&msg),
        ));
        self.bar.abandon();
    }

    fn on_translation_complete(&self, total_paragraphs: usize) {
        self.bar.finish_and_clear();
        if self.errors.load(Ordering::SeqCst) == 0 {
            eprintln!(
                "{} {} paragraphs translated",
                green("✔"),
                bold(&total_paragraphs.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # French Word document to English (writes document_traduit.docx/.pdf)
  doctranslate rapport.docx --from fr --to en

  # One paragraph per model call, PDF output only
  doctranslate rapport.pdf --batch-size 1 --format pdf

  # Write into another directory
  doctranslate rapport.docx -o translated/

  # Translate with a chat model instead of Marian
  doctranslate rapport.docx --backend llm --provider openai --model gpt-4.1-mini

  # Translate a document from a URL
  doctranslate https://example.org/rapport.pdf --to de

  # Print the paragraphs that would be translated (no model needed)
  doctranslate --extract-only rapport.pdf

  # JSON output with stats
  doctranslate --json rapport.docx > result.json

LANGUAGES:
  fr French   en English   es Spanish   de German   it Italian

MARIAN BACKEND:
  Batches are POSTed to {endpoint}/Helsinki-NLP/opus-mt-<from>-<to> using
  the Hugging Face inference wire format. Point --endpoint at a self-hosted
  server to keep documents on your network.

ENVIRONMENT VARIABLES:
  DOCTRANSLATE_*          Every flag, e.g. DOCTRANSLATE_BATCH_SIZE=1
  HF_API_TOKEN            Bearer token for the Marian endpoint
  OPENAI_API_KEY          OpenAI API key (llm backend)
  ANTHROPIC_API_KEY       Anthropic API key (llm backend)
  RUST_LOG                Overrides --log-level
"#;

/// Translate Word and PDF documents with a machine translation model.
#[derive(Parser, Debug)]
#[command(
    name = "doctranslate",
    version,
    about = "Translate Word and PDF documents with a machine translation model",
    long_about = "Translate Word (.docx) and PDF documents (local files or URLs) paragraph by \
paragraph using pretrained Marian opus-mt models or any chat model supported by edgequake-llm, \
and write the translation as Word and PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local .docx/.pdf file path or HTTP/HTTPS URL.
    input: String,

    /// Source language: fr, en, es, de, it.
    #[arg(long, env = "DOCTRANSLATE_FROM", default_value = "fr")]
    from: Language,

    /// Target language: fr, en, es, de, it.
    #[arg(long, env = "DOCTRANSLATE_TO", default_value = "en")]
    to: Language,

    /// Paragraphs per model call.
    #[arg(short, long, env = "DOCTRANSLATE_BATCH_SIZE", default_value_t = 5,
          value_parser = clap::value_parser!(u64).range(1..))]
    batch_size: u64,

    /// Cut paragraphs longer than this many characters before sending.
    #[arg(long, env = "DOCTRANSLATE_MAX_INPUT_CHARS", default_value_t = DEFAULT_MAX_INPUT_CHARS as u64,
          value_parser = clap::value_parser!(u64).range(1..))]
    max_input_chars: u64,

    /// Send paragraphs untouched, whatever their length.
    #[arg(long, env = "DOCTRANSLATE_NO_TRUNCATE", conflicts_with = "max_input_chars")]
    no_truncate: bool,

    /// Output format(s) to write.
    #[arg(short, long, env = "DOCTRANSLATE_FORMAT", value_enum, default_value = "both")]
    format: FormatArg,

    /// Directory for document_traduit.docx / document_traduit.pdf.
    #[arg(short, long, env = "DOCTRANSLATE_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Translation backend.
    #[arg(long, env = "DOCTRANSLATE_BACKEND", value_enum, default_value = "marian")]
    backend: BackendArg,

    /// Marian inference endpoint (model id is appended).
    #[arg(long, env = "DOCTRANSLATE_ENDPOINT")]
    endpoint: Option<String>,

    /// Bearer token for the Marian endpoint.
    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// LLM provider for --backend llm: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "DOCTRANSLATE_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID for --backend llm (default: gpt-4.1-nano).
    #[arg(long, env = "DOCTRANSLATE_MODEL")]
    model: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "DOCTRANSLATE_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Max LLM output tokens per batch.
    #[arg(long, env = "DOCTRANSLATE_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// What to do with PDF pages that have no extractable text.
    #[arg(long, env = "DOCTRANSLATE_ON_EMPTY_PAGE", value_enum, default_value = "skip")]
    on_empty_page: EmptyPageArg,

    /// Retries per batch on translator failure.
    #[arg(long, env = "DOCTRANSLATE_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Declared MIME type of the input, overriding extension and Content-Type.
    #[arg(long, env = "DOCTRANSLATE_MIME")]
    mime: Option<String>,

    /// Print the extracted paragraphs only, no translation.
    #[arg(long)]
    extract_only: bool,

    /// Output structured JSON (TranslationOutput) on stdout.
    #[arg(long, env = "DOCTRANSLATE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCTRANSLATE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCTRANSLATE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCTRANSLATE_QUIET")]
    quiet: bool,

    /// Log level: error, warn, info, debug, trace.
    #[arg(long, env = "DOCTRANSLATE_LOG_LEVEL",
          value_parser = ["error", "warn", "info", "debug", "trace"])]
    log_level: Option<String>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOCTRANSLATE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-batch translator timeout in seconds.
    #[arg(long, env = "DOCTRANSLATE_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Docx,
    Pdf,
    Both,
}

impl From<FormatArg> for Vec<DocumentFormat> {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Docx => vec![DocumentFormat::Docx],
            FormatArg::Pdf => vec![DocumentFormat::Pdf],
            FormatArg::Both => vec![DocumentFormat::Docx, DocumentFormat::Pdf],
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Marian,
    Llm,
}

impl From<BackendArg> for TranslatorBackend {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Marian => TranslatorBackend::Marian,
            BackendArg::Llm => TranslatorBackend::Llm,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EmptyPageArg {
    Skip,
    Fail,
}

impl From<EmptyPageArg> for EmptyPagePolicy {
    fn from(v: EmptyPageArg) -> Self {
        match v {
            EmptyPageArg::Skip => EmptyPagePolicy::Skip,
            EmptyPageArg::Fail => EmptyPagePolicy::Fail,
        }
    }
}

/// Log filter when `RUST_LOG` is unset. While the progress bar is drawn only
/// errors are logged unless a level was asked for explicitly.
fn log_filter(cli: &Cli, show_progress: bool) -> &str {
    if let Some(ref level) = cli.log_level {
        return level;
    }
    if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.extract_only;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter(&cli, show_progress))),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let cli_progress = show_progress.then(CliProgressCallback::new_dynamic);
    let clear_progress = || {
        if let Some(cb) = &cli_progress {
            cb.clear();
        }
    };
    let progress_cb: Option<ProgressCallback> = cli_progress
        .clone()
        .map(|cb| cb as Arc<dyn TranslationProgressCallback>);

    let config = build_config(&cli, progress_cb).inspect_err(|_| clear_progress())?;

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let paragraphs = extract(&cli.input, &config)
            .await
            .context("Failed to read document")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&paragraphs).context("Failed to serialise paragraphs")?
            );
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            for p in &paragraphs {
                writeln!(handle, "{p}").context("Failed to write to stdout")?;
            }
        }
        return Ok(());
    }

    // ── Run translation ──────────────────────────────────────────────────
    // the bar is only cleared by the library once translation completes
    let output = translate_document(&cli.input, &config)
        .await
        .inspect_err(|_| clear_progress())
        .context("Translation failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {} paragraphs  {} model calls  {}ms",
            green("✔"),
            stats.paragraphs,
            stats.model_calls,
            stats.total_duration_ms,
        );
        if stats.truncated_paragraphs > 0 || stats.retries > 0 {
            eprintln!(
                "   {} truncated  /  {} retries",
                dim(&stats.truncated_paragraphs.to_string()),
                dim(&stats.retries.to_string()),
            );
        }
        for file in &output.files {
            eprintln!("   →  {}", bold(&file.path.display().to_string()));
        }
    }

    Ok(())
}

/// Map CLI args to `TranslationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<TranslationConfig> {
    let max_input_chars = if cli.no_truncate {
        None
    } else {
        Some(cli.max_input_chars as usize)
    };

    let mut builder = TranslationConfig::builder()
        .languages(cli.from, cli.to)
        .batch_size(cli.batch_size as usize)
        .max_input_chars(max_input_chars)
        .output_formats(cli.format.into())
        .output_dir(&cli.output_dir)
        .backend(cli.backend.into())
        .empty_page_policy(cli.on_empty_page.into())
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint);
    }
    if let Some(ref token) = cli.api_token {
        builder = builder.api_token(token);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.llm_provider_name(provider);
    }
    if let Some(ref model) = cli.model {
        builder = builder.llm_model(model);
    }
    if let Some(ref mime) = cli.mime {
        builder = builder.declared_mime(mime);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
