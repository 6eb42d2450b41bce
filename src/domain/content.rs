//! Extracted page content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Readable text scraped from a page, plus metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContent {
    /// Cleaned, truncated page text
    pub content: String,

    /// Page title
    pub title: String,

    /// Source URL
    pub url: String,

    /// Number of whitespace-delimited words in `content`
    pub word_count: usize,

    /// When the extraction ran
    pub extracted_at: DateTime<Utc>,
}

impl ExtractedContent {
    pub fn new(content: String, title: impl Into<String>, url: impl Into<String>) -> Self {
        let word_count = word_count(&content);
        Self {
            content,
            title: title.into(),
            url: url.into(),
            word_count,
            extracted_at: Utc::now(),
        }
    }
}

/// Count non-empty whitespace-delimited tokens
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
