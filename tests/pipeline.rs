//! Integration tests for the full read → translate → write pipeline.
//!
//! Every test injects a stub [`Translator`], so no network access or model
//! is needed.

use async_trait::async_trait;
use edgequake_doctranslate::pipeline::read::{docx_paragraphs, read_pdf};
use edgequake_doctranslate::pipeline::write::{docx_bytes, pdf_bytes};
use edgequake_doctranslate::{
    translate_document, BatchError, DocTranslateError, DocumentFormat, EmptyPagePolicy, Language,
    LanguagePair, TranslationConfig, TranslationProgressCallback, Translator,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Route library logs through the test harness; `RUST_LOG=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Dictionary translator that records every batch it receives.
#[derive(Default)]
struct Dictionary {
    entries: HashMap<String, String>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl Dictionary {
    fn fr_en() -> Self {
        let entries = [
            ("Bonjour le monde", "Hello world"),
            ("Ceci est un test", "This is a test"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            entries,
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for Dictionary {
    fn name(&self) -> &str {
        "dictionary"
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _pair: LanguagePair,
    ) -> Result<Vec<String>, BatchError> {
        self.calls.lock().unwrap().push(texts.to_vec());
        Ok(texts
            .iter()
            .map(|t| self.entries.get(t).cloned().unwrap_or_else(|| t.clone()))
            .collect())
    }
}

/// Fails on the given call (1-based), succeeds otherwise.
struct FailOn {
    call: usize,
    seen: AtomicUsize,
}

#[async_trait]
impl Translator for FailOn {
    fn name(&self) -> &str {
        "fail-on"
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _pair: LanguagePair,
    ) -> Result<Vec<String>, BatchError> {
        let n = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.call {
            return Err(BatchError::Request {
                detail: "model unavailable".into(),
            });
        }
        Ok(texts.to_vec())
    }
}

fn write_docx(dir: &Path, name: &str, paragraphs: &[&str]) -> PathBuf {
    let owned: Vec<String> = paragraphs.iter().map(|s| s.to_string()).collect();
    let path = dir.join(name);
    std::fs::write(&path, docx_bytes(&owned).unwrap()).unwrap();
    path
}

fn config_with(translator: Arc<dyn Translator>, out: &Path, batch_size: usize) -> TranslationConfig {
    TranslationConfig::builder()
        .languages(Language::Fr, Language::En)
        .batch_size(batch_size)
        .translator(translator)
        .output_dir(out)
        .build()
        .unwrap()
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn french_docx_to_english_one_paragraph_per_call() {
    init_tracing();
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let input = write_docx(src.path(), "rapport.docx", &["Bonjour le monde", "", "Ceci est un test"]);

    let translator = Arc::new(Dictionary::fr_en());
    let config = config_with(translator.clone(), out.path(), 1);
    let output = translate_document(input.to_str().unwrap(), &config)
        .await
        .unwrap();

    assert_eq!(output.source, vec!["Bonjour le monde", "Ceci est un test"]);
    assert_eq!(output.translated, vec!["Hello world", "This is a test"]);
    assert_eq!(translator.calls().len(), 2);
    assert_eq!(output.stats.model_calls, 2);
    assert_eq!(output.format, DocumentFormat::Docx);

    assert_eq!(
        files_in(out.path()),
        vec!["document_traduit.docx", "document_traduit.pdf"]
    );
    let written = std::fs::read(out.path().join("document_traduit.docx")).unwrap();
    assert_eq!(
        docx_paragraphs(&written).unwrap(),
        vec!["Hello world", "This is a test"]
    );
}

#[tokio::test]
async fn batch_size_does_not_change_the_result() {
    let src = tempfile::tempdir().unwrap();
    let paragraphs: Vec<String> = (1..=7).map(|i| format!("Paragraphe {i}")).collect();
    let refs: Vec<&str> = paragraphs.iter().map(String::as_str).collect();
    let input = write_docx(src.path(), "long.docx", &refs);

    let mut results = Vec::new();
    for batch_size in [1, 3, 7, 50] {
        let out = tempfile::tempdir().unwrap();
        let translator = Arc::new(Dictionary::default());
        let config = config_with(translator.clone(), out.path(), batch_size);
        let output = translate_document(input.to_str().unwrap(), &config)
            .await
            .unwrap();
        assert_eq!(translator.calls().len(), paragraphs.len().div_ceil(batch_size));
        assert!(translator.calls().iter().all(|b| b.len() <= batch_size));
        results.push(output.translated);
    }
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(results[0], paragraphs);
}

#[tokio::test]
async fn pdf_input_is_translated_to_both_formats() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let input = src.path().join("rapport.pdf");
    std::fs::write(
        &input,
        pdf_bytes(&["Bonjour le monde".to_string(), "Ceci est un test".to_string()]).unwrap(),
    )
    .unwrap();

    let translator = Arc::new(Dictionary::fr_en());
    let config = config_with(translator, out.path(), 5);
    let output = translate_document(input.to_str().unwrap(), &config)
        .await
        .unwrap();

    assert_eq!(output.format, DocumentFormat::Pdf);
    assert_eq!(output.translated, vec!["Hello world", "This is a test"]);

    let pdf_lines = read_pdf(&out.path().join("document_traduit.pdf"), EmptyPagePolicy::Skip).unwrap();
    let text = pdf_lines.join(" ");
    let a = text.find("Hello world").unwrap();
    let b = text.find("This is a test").unwrap();
    assert!(a < b);
}

#[tokio::test]
async fn unsupported_format_writes_nothing_and_calls_nobody() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let input = src.path().join("notes.txt");
    std::fs::write(&input, "Bonjour").unwrap();

    let translator = Arc::new(Dictionary::default());
    let config = config_with(translator.clone(), out.path(), 5);
    let err = translate_document(input.to_str().unwrap(), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, DocTranslateError::UnsupportedFormat { .. }));
    assert!(translator.calls().is_empty());
    assert!(files_in(out.path()).is_empty());
}

#[tokio::test]
async fn failing_batch_aborts_without_output() {
    init_tracing();
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let input = write_docx(src.path(), "rapport.docx", &["un", "deux", "trois", "quatre"]);

    let translator = Arc::new(FailOn {
        call: 2,
        seen: AtomicUsize::new(0),
    });
    let config = config_with(translator, out.path(), 2);
    let err = translate_document(input.to_str().unwrap(), &config)
        .await
        .unwrap_err();

    match err {
        DocTranslateError::TranslationFailed {
            batch,
            total_batches,
            ..
        } => {
            assert_eq!(batch, 2);
            assert_eq!(total_batches, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(files_in(out.path()).is_empty());
}

#[tokio::test]
async fn empty_document_still_produces_documents() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let input = write_docx(src.path(), "vide.docx", &[]);

    #[derive(Default)]
    struct Progress {
        last: Mutex<Option<f32>>,
        completed: AtomicUsize,
    }
    impl TranslationProgressCallback for Progress {
        fn on_progress(&self, fraction: f32, _done: usize, _total: usize) {
            *self.last.lock().unwrap() = Some(fraction);
        }
        fn on_translation_complete(&self, _total: usize) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    let translator = Arc::new(Dictionary::default());
    let progress = Arc::new(Progress::default());
    let config = TranslationConfig::builder()
        .translator(translator.clone())
        .output_dir(out.path())
        .progress_callback(progress.clone())
        .build()
        .unwrap();

    let output = translate_document(input.to_str().unwrap(), &config)
        .await
        .unwrap();

    assert!(output.translated.is_empty());
    assert!(translator.calls().is_empty());
    assert_eq!(*progress.last.lock().unwrap(), Some(1.0));
    assert_eq!(progress.completed.load(Ordering::SeqCst), 1);
    assert_eq!(output.files.len(), 2);
    for file in &output.files {
        assert!(file.path.exists());
    }
}

#[tokio::test]
async fn output_is_json_serialisable() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let input = write_docx(src.path(), "rapport.docx", &["Bonjour le monde"]);

    let config = config_with(Arc::new(Dictionary::fr_en()), out.path(), 5);
    let output = translate_document(input.to_str().unwrap(), &config)
        .await
        .unwrap();

    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["format"], "docx");
    assert_eq!(json["translated"][0], "Hello world");
    assert_eq!(json["stats"]["paragraphs"], 1);
}
