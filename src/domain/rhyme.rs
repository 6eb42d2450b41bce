//! Rhyme generation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::options::{GenerationOptions, Length, Style, Tone};

/// Metadata attached to every generation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RhymeMetadata {
    pub style: Style,
    pub length: Length,
    pub tone: Tone,
    pub word_count: usize,
    pub generated_at: DateTime<Utc>,
}

impl RhymeMetadata {
    pub fn new(options: &GenerationOptions, word_count: usize) -> Self {
        Self {
            style: options.style,
            length: options.length,
            tone: options.tone,
            word_count,
            generated_at: Utc::now(),
        }
    }
}

/// Outcome of a rhyme generation.
///
/// On success `rhyme` holds the cleaned text. On failure `rhyme` is empty,
/// `error` says why, and `fallback` carries a locally templated rhyme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RhymeResult {
    pub success: bool,

    #[serde(default)]
    pub rhyme: String,

    pub metadata: RhymeMetadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl RhymeResult {
    pub fn success(rhyme: String, options: &GenerationOptions) -> Self {
        let word_count = super::content::word_count(&rhyme);
        Self {
            success: true,
            rhyme,
            metadata: RhymeMetadata::new(options, word_count),
            error: None,
            fallback: None,
        }
    }

    pub fn failure(error: impl Into<String>, fallback: String, options: &GenerationOptions) -> Self {
        let word_count = super::content::word_count(&fallback);
        Self {
            success: false,
            rhyme: String::new(),
            metadata: RhymeMetadata::new(options, word_count),
            error: Some(error.into()),
            fallback: Some(fallback),
        }
    }

    /// The text to show: the rhyme on success, otherwise the fallback
    pub fn text(&self) -> &str {
        if self.success {
            &self.rhyme
        } else {
            self.fallback.as_deref().unwrap_or_default()
        }
    }
}
