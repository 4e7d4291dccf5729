//! The fixed set of languages the translation models cover.
//!
//! Pretrained `opus-mt` models exist per ordered pair, so a run is described
//! by a [`LanguagePair`] and the model resource name is derived from it.

use crate::error::DocTranslateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default organisation publishing the `opus-mt` checkpoints.
pub const DEFAULT_MODEL_PROVIDER: &str = "Helsinki-NLP";

/// A supported document language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Fr,
    En,
    Es,
    De,
    It,
}

impl Language {
    /// Every supported language, in menu order.
    pub const ALL: [Language; 5] = [
        Language::Fr,
        Language::En,
        Language::Es,
        Language::De,
        Language::It,
    ];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::En => "en",
            Language::Es => "es",
            Language::De => "de",
            Language::It => "it",
        }
    }

    /// English display name, used in LLM prompts.
    pub fn english_name(self) -> &'static str {
        match self {
            Language::Fr => "French",
            Language::En => "English",
            Language::Es => "Spanish",
            Language::De => "German",
            Language::It => "Italian",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = DocTranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|l| l.code() == code)
            .ok_or_else(|| {
                DocTranslateError::InvalidConfig(format!(
                    "unsupported language '{s}' (expected one of: fr, en, es, de, it)"
                ))
            })
    }
}

/// Ordered source → target pair selecting one pretrained model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: Language,
    pub target: Language,
}

impl LanguagePair {
    /// Build a pair, rejecting identical source and target.
    pub fn new(source: Language, target: Language) -> Result<Self, DocTranslateError> {
        if source == target {
            return Err(DocTranslateError::InvalidConfig(format!(
                "source and target language are both '{source}'"
            )));
        }
        Ok(Self { source, target })
    }

    /// Model resource name, e.g. `Helsinki-NLP/opus-mt-fr-en`.
    pub fn model_id(&self, provider: &str) -> String {
        format!("{}/opus-mt-{}-{}", provider, self.source, self.target)
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}→{}", self.source, self.target)
    }
}
