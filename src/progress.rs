//! Progress-callback trait for batch translation events.
//!
//! Inject an [`Arc<dyn TranslationProgressCallback>`] via
//! [`crate::config::TranslationConfigBuilder::progress_callback`] to receive
//! events while the orchestrator works through the paragraph batches.
//!
//! The orchestrator knows nothing about terminals or UI toolkits: it reports
//! a completion fraction after each batch and a final "done" event, and the
//! host decides how to display them. The CLI forwards them to an
//! [indicatif](https://docs.rs/indicatif) bar; tests record them.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doctranslate::{TranslationConfig, TranslationProgressCallback};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Recorder {
//!     fractions: Mutex<Vec<f32>>,
//! }
//!
//! impl TranslationProgressCallback for Recorder {
//!     fn on_progress(&self, fraction: f32, _done: usize, _total: usize) {
//!         self.fractions.lock().unwrap().push(fraction);
//!     }
//! }
//!
//! let config = TranslationConfig::builder()
//!     .progress_callback(Arc::new(Recorder::default()))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it translates a paragraph sequence.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Batches are translated one after another, so calls
/// never overlap, but implementations must still be `Send + Sync` because the
/// callback lives inside a shareable config.
pub trait TranslationProgressCallback: Send + Sync {
    /// Called once before the first batch.
    ///
    /// # Arguments
    /// * `total_paragraphs` — paragraphs that will be translated
    /// * `total_batches`    — model calls that will be made (0 for empty input)
    fn on_translation_start(&self, total_paragraphs: usize, total_batches: usize) {
        let _ = (total_paragraphs, total_batches);
    }

    /// Called after each successful batch, and once with `1.0` for empty input.
    ///
    /// # Arguments
    /// * `fraction` — paragraphs processed / total, clamped to at most 1.0
    /// * `done`     — paragraphs processed so far
    /// * `total`    — total paragraphs
    fn on_progress(&self, fraction: f32, done: usize, total: usize) {
        let _ = (fraction, done, total);
    }

    /// Called when a batch fails after all retries, just before the error
    /// aborts the run.
    fn on_batch_error(&self, batch: usize, total_batches: usize, error: &str) {
        let _ = (batch, total_batches, error);
    }

    /// Called once after the last batch; the progress indicator should be
    /// cleared here.
    fn on_translation_complete(&self, total_paragraphs: usize) {
        let _ = total_paragraphs;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl TranslationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::TranslationConfig`].
pub type ProgressCallback = Arc<dyn TranslationProgressCallback>;

/// `done / total`, clamped to `[0.0, 1.0]`; an empty run is complete.
pub fn fraction(done: usize, total: usize) -> f32 {
    if total == 0 {
        return 1.0;
    }
    (done as f32 / total as f32).min(1.0)
}
