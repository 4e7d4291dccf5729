//! Batch orchestration of translator calls.
//!
//! ## Algorithm
//!
//! ```text
//! paragraphs ──chunks(batch_size)──▶ batch 1 ─▶ translator ─▶ append ─▶ progress
//!                                    batch 2 ─▶ translator ─▶ append ─▶ progress
//!                                    …
//! ```
//!
//! Batches are sent strictly one after another; the output has exactly the
//! input's length and order. Each paragraph is cut to
//! [`TranslationConfig::max_input_chars`] before it is sent, so an overlong
//! paragraph never fails a call. A batch that still fails after
//! `max_retries` aborts the whole run; nothing translated so far is returned.
//!
//! ## Retry Strategy
//!
//! Off by default. When enabled, attempt `n` waits
//! `retry_backoff_ms * 2^(n-1)`, capped at one minute, before resending the
//! same batch.

use crate::config::TranslationConfig;
use crate::error::{BatchError, DocTranslateError};
use crate::language::LanguagePair;
use crate::progress::fraction;
use crate::translator::Translator;
use std::borrow::Cow;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Longest wait between two attempts of the same batch.
const MAX_BACKOFF_MS: u64 = 60_000;

/// Outcome of a successful orchestration.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRun {
    /// One translation per input paragraph, in input order.
    pub translated: Vec<String>,
    /// Number of batches (= successful translator calls).
    pub batches: usize,
    /// Paragraphs cut to `max_input_chars` before sending.
    pub truncated: usize,
    /// Retries spent across all batches.
    pub retries: u32,
}

/// Translate `paragraphs` batch by batch.
///
/// Empty input returns immediately without calling the translator; progress
/// is still reported as complete.
pub async fn translate_paragraphs(
    translator: &dyn Translator,
    paragraphs: &[String],
    pair: LanguagePair,
    config: &TranslationConfig,
) -> Result<BatchRun, DocTranslateError> {
    let total = paragraphs.len();
    let batch_size = config.batch_size.max(1);
    let total_batches = total.div_ceil(batch_size);
    let cb = config.progress_callback.as_ref();

    info!(
        "Translating {} paragraphs {} in {} batches of ≤{} via {}",
        total,
        pair,
        total_batches,
        batch_size,
        translator.name()
    );
    if let Some(cb) = cb {
        cb.on_translation_start(total, total_batches);
    }

    let mut translated = Vec::with_capacity(total);
    let mut truncated = 0usize;
    let mut retries = 0u32;

    for (i, chunk) in paragraphs.chunks(batch_size).enumerate() {
        let batch_num = i + 1;

        let batch: Vec<String> = chunk
            .iter()
            .map(|p| match truncate_chars(p, config.max_input_chars) {
                Cow::Borrowed(s) => s.to_string(),
                Cow::Owned(s) => {
                    truncated += 1;
                    warn!(
                        "Batch {}: paragraph of {} chars truncated to {}",
                        batch_num,
                        p.chars().count(),
                        s.chars().count()
                    );
                    s
                }
            })
            .collect();

        let (out, attempts) = match translate_with_retry(translator, &batch, pair, batch_num, config).await {
            Ok(ok) => ok,
            Err(source) => {
                if let Some(cb) = cb {
                    cb.on_batch_error(batch_num, total_batches, &source.to_string());
                }
                return Err(DocTranslateError::TranslationFailed {
                    batch: batch_num,
                    total_batches,
                    source,
                });
            }
        };
        retries += attempts;
        translated.extend(out);

        let done = translated.len();
        debug!("Batch {}/{} done ({}/{} paragraphs)", batch_num, total_batches, done, total);
        if let Some(cb) = cb {
            cb.on_progress(fraction(done, total), done, total);
        }
    }

    if let Some(cb) = cb {
        if total == 0 {
            cb.on_progress(1.0, 0, 0);
        }
        cb.on_translation_complete(total);
    }

    Ok(BatchRun {
        translated,
        batches: total_batches,
        truncated,
        retries,
    })
}

/// Send one batch, retrying with exponential backoff. Returns the
/// translations and the number of retries spent.
async fn translate_with_retry(
    translator: &dyn Translator,
    batch: &[String],
    pair: LanguagePair,
    batch_num: usize,
    config: &TranslationConfig,
) -> Result<(Vec<String>, u32), BatchError> {
    let mut last_err: Option<BatchError> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "Batch {}: retry {}/{} after {}ms",
                batch_num, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let result = translator
            .translate_batch(batch, pair)
            .await
            .and_then(|out| {
                if out.len() == batch.len() {
                    Ok(out)
                } else {
                    Err(BatchError::CountMismatch {
                        expected: batch.len(),
                        got: out.len(),
                    })
                }
            });

        match result {
            Ok(out) => return Ok((out, attempt)),
            Err(e) => {
                warn!("Batch {}: attempt {} failed — {}", batch_num, attempt + 1, e);
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or(BatchError::Request {
        detail: "no attempt was made".into(),
    }))
}

/// Delay before retry `attempt` (1-based): `base * 2^(attempt-1)`, capped.
fn backoff_ms(base: u64, attempt: u32) -> u64 {
    2u64.checked_pow(attempt.saturating_sub(1))
        .and_then(|m| base.checked_mul(m))
        .unwrap_or(MAX_BACKOFF_MS)
        .min(MAX_BACKOFF_MS)
}

/// Cut `text` to at most `max` characters, on a char boundary.
pub fn truncate_chars(text: &str, max: Option<usize>) -> Cow<'_, str> {
    match max {
        Some(max) => match text.char_indices().nth(max) {
            Some((byte_idx, _)) => Cow::Owned(text[..byte_idx].to_string()),
            None => Cow::Borrowed(text),
        },
        None => Cow::Borrowed(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Upper-cases its input and counts calls.
    #[derive(Default)]
    struct Upper {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        async fn translate_batch(
            &self,
            texts: &[String],
            _pair: LanguagePair,
        ) -> Result<Vec<String>, BatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| t.to_uppercase()).collect())
        }
    }

    /// Fails the first `failures` calls, then echoes.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn translate_batch(
            &self,
            texts: &[String],
            _pair: LanguagePair,
        ) -> Result<Vec<String>, BatchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(BatchError::Request {
                    detail: "HTTP 503".into(),
                })
            } else {
                Ok(texts.to_vec())
            }
        }
    }

    fn pair() -> LanguagePair {
        LanguagePair::new(Language::Fr, Language::En).unwrap()
    }

    fn paragraphs(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("paragraphe {i}")).collect()
    }

    fn config(batch_size: usize) -> TranslationConfig {
        TranslationConfig::builder()
            .batch_size(batch_size)
            .retry_backoff_ms(1)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn preserves_length_and_order_for_any_batch_size() {
        let input = paragraphs(7);
        for b in 1..=9 {
            let t = Upper::default();
            let run = translate_paragraphs(&t, &input, pair(), &config(b))
                .await
                .unwrap();
            let expected: Vec<String> = input.iter().map(|p| p.to_uppercase()).collect();
            assert_eq!(run.translated, expected, "batch size {b}");
            assert_eq!(run.batches, 7usize.div_ceil(b));
            assert_eq!(t.calls.load(Ordering::SeqCst), run.batches);
        }
    }

    #[test]
    fn empty_input_makes_no_calls() {
        let t = Upper::default();
        let run = tokio_test::block_on(translate_paragraphs(&t, &[], pair(), &config(5))).unwrap();
        assert!(run.translated.is_empty());
        assert_eq!(run.batches, 0);
        assert_eq!(t.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn overlong_paragraphs_are_truncated_before_sending() {
        let t = Upper::default();
        let config = TranslationConfig::builder()
            .max_input_chars(Some(4))
            .build()
            .unwrap();
        let input = vec!["éléphant".to_string(), "chat".to_string()];
        let run = translate_paragraphs(&t, &input, pair(), &config).await.unwrap();
        assert_eq!(run.translated, vec!["ÉLÉP", "CHAT"]);
        assert_eq!(run.truncated, 1);
    }

    #[tokio::test]
    async fn failure_aborts_without_retry_by_default() {
        let t = Flaky {
            failures: 1,
            calls: AtomicUsize::new(0),
        };
        let err = translate_paragraphs(&t, &paragraphs(3), pair(), &config(1))
            .await
            .unwrap_err();
        match err {
            DocTranslateError::TranslationFailed {
                batch,
                total_batches,
                ..
            } => {
                assert_eq!(batch, 1);
                assert_eq!(total_batches, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(t.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_recover_transient_failures() {
        let t = Flaky {
            failures: 2,
            calls: AtomicUsize::new(0),
        };
        let config = TranslationConfig::builder()
            .batch_size(2)
            .max_retries(2)
            .retry_backoff_ms(1)
            .build()
            .unwrap();
        let run = translate_paragraphs(&t, &paragraphs(3), pair(), &config)
            .await
            .unwrap();
        assert_eq!(run.translated, paragraphs(3));
        assert_eq!(run.retries, 2);
    }

    #[tokio::test]
    async fn count_mismatch_is_a_failed_batch() {
        struct Dropper;

        #[async_trait]
        impl Translator for Dropper {
            fn name(&self) -> &str {
                "dropper"
            }

            async fn translate_batch(
                &self,
                texts: &[String],
                _pair: LanguagePair,
            ) -> Result<Vec<String>, BatchError> {
                Ok(texts.iter().skip(1).cloned().collect())
            }
        }

        let err = translate_paragraphs(&Dropper, &paragraphs(2), pair(), &config(2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DocTranslateError::TranslationFailed {
                source: BatchError::CountMismatch { expected: 2, got: 1 },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_ends_at_one() {
        use crate::progress::TranslationProgressCallback;
        use std::sync::Mutex;

        #[derive(Default)]
        struct Recorder {
            fractions: Mutex<Vec<f32>>,
            complete: AtomicUsize,
        }

        impl TranslationProgressCallback for Recorder {
            fn on_progress(&self, fraction: f32, _done: usize, _total: usize) {
                self.fractions.lock().unwrap().push(fraction);
            }

            fn on_translation_complete(&self, _total: usize) {
                self.complete.fetch_add(1, Ordering::SeqCst);
            }
        }

        let rec = Arc::new(Recorder::default());
        let config = TranslationConfig::builder()
            .batch_size(3)
            .progress_callback(rec.clone())
            .build()
            .unwrap();
        translate_paragraphs(&Upper::default(), &paragraphs(7), pair(), &config)
            .await
            .unwrap();

        let fractions = rec.fractions.lock().unwrap().clone();
        assert_eq!(fractions.len(), 3);
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*fractions.last().unwrap(), 1.0);
        assert_eq!(rec.complete.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("bonjour", None), "bonjour");
        assert_eq!(truncate_chars("bonjour", Some(7)), "bonjour");
        assert_eq!(truncate_chars("bonjour", Some(3)), "bon");
        assert_eq!(truncate_chars("ça va", Some(2)), "ça");
        assert!(matches!(truncate_chars("abc", Some(10)), Cow::Borrowed(_)));
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 3), 2000);
        assert_eq!(backoff_ms(0, 70), 0);
        assert_eq!(backoff_ms(500, 70), MAX_BACKOFF_MS);
        assert_eq!(backoff_ms(u64::MAX, 2), MAX_BACKOFF_MS);
    }

    #[tokio::test]
    async fn many_retries_exhaust_without_overflow() {
        let t = Flaky {
            failures: usize::MAX,
            calls: AtomicUsize::new(0),
        };
        let config = TranslationConfig::builder()
            .max_retries(70)
            .retry_backoff_ms(0)
            .build()
            .unwrap();
        let err = translate_paragraphs(&t, &paragraphs(1), pair(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, DocTranslateError::TranslationFailed { batch: 1, .. }));
        assert_eq!(t.calls.load(Ordering::SeqCst), 71);
    }

    #[tokio::test]
    async fn batch_error_is_reported_before_abort() {
        use crate::progress::TranslationProgressCallback;
        use std::sync::Mutex;

        #[derive(Default)]
        struct Recorder {
            errors: Mutex<Vec<(usize, usize)>>,
            complete: AtomicUsize,
        }

        impl TranslationProgressCallback for Recorder {
            fn on_batch_error(&self, batch: usize, total_batches: usize, _error: &str) {
                self.errors.lock().unwrap().push((batch, total_batches));
            }

            fn on_translation_complete(&self, _total: usize) {
                self.complete.fetch_add(1, Ordering::SeqCst);
            }
        }

        let rec = Arc::new(Recorder::default());
        let config = TranslationConfig::builder()
            .batch_size(2)
            .progress_callback(rec.clone())
            .build()
            .unwrap();
        let t = Flaky {
            failures: 1,
            calls: AtomicUsize::new(0),
        };
        translate_paragraphs(&t, &paragraphs(5), pair(), &config)
            .await
            .unwrap_err();

        assert_eq!(*rec.errors.lock().unwrap(), vec![(1, 3)]);
        assert_eq!(rec.complete.load(Ordering::SeqCst), 0);
    }
}
