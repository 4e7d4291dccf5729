//! Translation through a general-purpose chat model.
//!
//! The batch travels as a JSON array in the user message and the model must
//! answer with a JSON array of the same length (see [`crate::prompts`]).
//! Models occasionally wrap the array in a Markdown fence or add a sentence
//! around it, so the reply goes through [`parse_reply`] before the count check.

use crate::config::TranslationConfig;
use crate::error::{BatchError, DocTranslateError};
use crate::language::LanguagePair;
use crate::prompts::{batch_message, system_prompt};
use crate::translator::Translator;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

const DEFAULT_LLM_MODEL: &str = "gpt-4.1-nano";

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n(.*?)\n?\s*```\s*$").unwrap());

/// Translator backed by an `edgequake-llm` provider.
pub struct LlmTranslator {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl LlmTranslator {
    /// Wrap an already-configured provider.
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }

    /// Resolve the provider named in `config`, or auto-detect one from the
    /// API keys present in the environment.
    pub fn from_config(config: &TranslationConfig) -> Result<Self, DocTranslateError> {
        let provider = match config.llm_provider_name {
            Some(ref name) => {
                let model = config.llm_model.as_deref().unwrap_or(DEFAULT_LLM_MODEL);
                ProviderFactory::create_llm_provider(name, model).map_err(|e| {
                    DocTranslateError::TranslatorNotConfigured {
                        backend: format!("llm:{name}"),
                        hint: format!("{e}"),
                    }
                })?
            }
            None => {
                let (llm_provider, _embedding) = ProviderFactory::from_env().map_err(|e| {
                    DocTranslateError::TranslatorNotConfigured {
                        backend: "llm:auto".to_string(),
                        hint: format!(
                            "No LLM provider could be auto-detected from environment.\n\
                            Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                            Error: {e}"
                        ),
                    }
                })?;
                llm_provider
            }
        };
        Ok(Self::new(provider, config.temperature, config.max_tokens))
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    fn name(&self) -> &str {
        "llm"
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        pair: LanguagePair,
    ) -> Result<Vec<String>, BatchError> {
        let messages = vec![
            ChatMessage::system(system_prompt(pair)),
            ChatMessage::user(batch_message(texts)),
        ];

        let response = self
            .provider
            .chat(&messages, Some(&self.options()))
            .await
            .map_err(|e| BatchError::Request {
                detail: e.to_string(),
            })?;

        debug!(
            "{} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        let out = parse_reply(&response.content)?;
        if out.len() != texts.len() {
            return Err(BatchError::CountMismatch {
                expected: texts.len(),
                got: out.len(),
            });
        }
        Ok(out)
    }
}

/// Extract the JSON array of translations from a model reply.
pub fn parse_reply(reply: &str) -> Result<Vec<String>, BatchError> {
    let body = match FENCE.captures(reply) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => reply,
    };

    if let Ok(v) = serde_json::from_str::<Vec<String>>(body.trim()) {
        return Ok(v);
    }

    // Fall back to the outermost [...] when the model added prose around it.
    let array = match (body.find('['), body.rfind(']')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => {
            return Err(BatchError::InvalidResponse {
                detail: "reply contains no JSON array".into(),
            })
        }
    };
    serde_json::from_str::<Vec<String>>(array).map_err(|e| BatchError::InvalidResponse {
        detail: format!("reply is not a JSON array of strings: {e}"),
    })
}
