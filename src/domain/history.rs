//! History entries for past transformations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::options::GenerationOptions;

/// One saved transformation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: Uuid,

    /// The rhyme text (or the fallback when generation failed)
    pub rhyme: String,

    /// Page title
    pub title: String,

    /// Page URL
    pub url: String,

    /// Options the rhyme was generated with
    pub settings: GenerationOptions,

    /// Wall time of the transformation in milliseconds
    pub generation_time: u64,

    pub created_at: DateTime<Utc>,
}

impl HistoryItem {
    pub fn new(
        rhyme: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        settings: GenerationOptions,
        generation_time: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            rhyme: rhyme.into(),
            title: title.into(),
            url: url.into(),
            settings,
            generation_time,
            created_at: Utc::now(),
        }
    }
}
