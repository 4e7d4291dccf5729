//! Marian (`opus-mt`) translation over an HTTP inference endpoint.
//!
//! The pretrained checkpoint is addressed by name, `<provider>/opus-mt-<src>-<tgt>`,
//! and served by a Hugging Face compatible inference endpoint:
//!
//! ```text
//! POST {endpoint}/Helsinki-NLP/opus-mt-fr-en
//! {"inputs": ["Bonjour le monde", ...], "options": {"wait_for_model": true}}
//!
//! 200 [{"translation_text": "Hello world"}, ...]
//! ```
//!
//! Loading and caching the model weights is the endpoint's business; this
//! client only needs the base URL and an optional bearer token.

use crate::config::TranslationConfig;
use crate::error::{BatchError, DocTranslateError};
use crate::language::LanguagePair;
use crate::translator::Translator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// HTTP client for one Marian inference endpoint.
pub struct MarianTranslator {
    client: reqwest::Client,
    endpoint: String,
    model_provider: String,
    api_token: Option<String>,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a [String],
    options: InferenceOptions,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Deserialize)]
struct TranslationItem {
    translation_text: String,
}

impl MarianTranslator {
    /// Build a client from the endpoint, model provider, token and timeout
    /// in `config`.
    pub fn from_config(config: &TranslationConfig) -> Result<Self, DocTranslateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| DocTranslateError::TranslatorNotConfigured {
                backend: "marian".into(),
                hint: format!("HTTP client could not be built: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model_provider: config.model_provider.clone(),
            api_token: config.api_token.clone(),
            timeout_secs: config.api_timeout_secs,
        })
    }

    /// Full URL of the model serving `pair`.
    pub fn model_url(&self, pair: LanguagePair) -> String {
        format!("{}/{}", self.endpoint, pair.model_id(&self.model_provider))
    }
}

#[async_trait]
impl Translator for MarianTranslator {
    fn name(&self) -> &str {
        "marian"
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        pair: LanguagePair,
    ) -> Result<Vec<String>, BatchError> {
        let url = self.model_url(pair);
        debug!("POST {} ({} texts)", url, texts.len());

        let mut request = self.client.post(&url).json(&InferenceRequest {
            inputs: texts,
            options: InferenceOptions {
                wait_for_model: true,
            },
        });
        if let Some(ref token) = self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BatchError::Timeout {
                    secs: self.timeout_secs,
                }
            } else {
                BatchError::Request {
                    detail: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| BatchError::Request {
            detail: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(BatchError::Request {
                detail: format!("HTTP {}: {}", status, body.trim()),
            });
        }

        parse_response(&body, texts.len())
    }
}

/// Decode an inference response body into exactly `expected` texts.
fn parse_response(body: &str, expected: usize) -> Result<Vec<String>, BatchError> {
    let items: Vec<TranslationItem> =
        serde_json::from_str(body).map_err(|e| BatchError::InvalidResponse {
            detail: format!("{e}: {}", snippet(body)),
        })?;

    if items.len() != expected {
        return Err(BatchError::CountMismatch {
            expected,
            got: items.len(),
        });
    }
    Ok(items.into_iter().map(|i| i.translation_text).collect())
}

fn snippet(body: &str) -> String {
    let s: String = body.chars().take(120).collect();
    if s.len() < body.len() {
        format!("{s}…")
    } else {
        s
    }
}
