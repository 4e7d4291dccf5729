//! The external translation model, behind one trait.
//!
//! The orchestrator only ever sees [`Translator`]: a batch of source texts
//! goes in, the same number of target texts comes out, in order. Backends:
//!
//! - [`marian`] — pretrained `opus-mt` checkpoints served over HTTP
//!   (Hugging Face inference wire format). The default.
//! - [`llm`]    — any chat model `edgequake-llm` can reach.
//!
//! Tests and embedders can inject their own implementation through
//! [`crate::config::TranslationConfigBuilder::translator`].

pub mod llm;
pub mod marian;

use crate::config::{TranslationConfig, TranslatorBackend};
use crate::error::{BatchError, DocTranslateError};
use crate::language::LanguagePair;
use async_trait::async_trait;
use std::sync::Arc;

pub use llm::LlmTranslator;
pub use marian::MarianTranslator;

/// Maps a batch of source texts to target texts.
///
/// Implementations must return exactly one text per input, in input order.
/// The orchestrator checks the count and treats a mismatch as a failed batch.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Translate `texts` from `pair.source` to `pair.target`.
    async fn translate_batch(
        &self,
        texts: &[String],
        pair: LanguagePair,
    ) -> Result<Vec<String>, BatchError>;
}

/// Resolve the translator for a run, from most-specific to least-specific.
///
/// 1. **Pre-built translator** (`config.translator`) — used as-is.
/// 2. **Configured backend** (`config.backend`) — Marian over HTTP, or an
///    LLM provider resolved by [`LlmTranslator::from_config`].
pub fn resolve_translator(
    config: &TranslationConfig,
) -> Result<Arc<dyn Translator>, DocTranslateError> {
    if let Some(ref translator) = config.translator {
        return Ok(Arc::clone(translator));
    }

    match config.backend {
        TranslatorBackend::Marian => Ok(Arc::new(MarianTranslator::from_config(config)?)),
        TranslatorBackend::Llm => Ok(Arc::new(LlmTranslator::from_config(config)?)),
    }
}
