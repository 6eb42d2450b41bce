//! User settings: API keys, preferences, theme and audio service.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{get_typed, keys, set_typed, Storage};
use crate::domain::{AudioService, Gender, GenerationOptions, Length, Style, Tone, VoiceOptions};
use crate::error::{Error, Result};

/// Providers that take an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiProvider {
    Gemini,
    ElevenLabs,
    GoogleTts,
    Azure,
}

impl ApiProvider {
    pub const ALL: [ApiProvider; 4] = [
        ApiProvider::Gemini,
        ApiProvider::ElevenLabs,
        ApiProvider::GoogleTts,
        ApiProvider::Azure,
    ];

    pub fn storage_key(&self) -> &'static str {
        match self {
            ApiProvider::Gemini => keys::GEMINI_API_KEY,
            ApiProvider::ElevenLabs => keys::ELEVENLABS_API_KEY,
            ApiProvider::GoogleTts => keys::GOOGLE_TTS_API_KEY,
            ApiProvider::Azure => keys::AZURE_TTS_KEY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiProvider::Gemini => "gemini",
            ApiProvider::ElevenLabs => "elevenlabs",
            ApiProvider::GoogleTts => "google",
            ApiProvider::Azure => "azure",
        }
    }
}

impl fmt::Display for ApiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiProvider {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(ApiProvider::Gemini),
            "elevenlabs" | "eleven-labs" => Ok(ApiProvider::ElevenLabs),
            "google" | "google-tts" => Ok(ApiProvider::GoogleTts),
            "azure" | "azure-tts" => Ok(ApiProvider::Azure),
            _ => Err(Error::Config(format!("Unknown provider: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(Error::Config(format!("Unknown theme: {}", s))),
        }
    }
}

/// Saved generation and voice preferences
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub style: Style,
    pub length: Length,
    pub tone: Tone,
    pub custom_instructions: String,
    pub voice_gender: Gender,
}

impl Preferences {
    pub fn generation_options(&self, title: impl Into<String>) -> GenerationOptions {
        GenerationOptions::new(self.style, self.length, self.tone)
            .with_title(title)
            .with_instructions(self.custom_instructions.clone())
    }

    pub fn voice_options(&self) -> VoiceOptions {
        VoiceOptions::new(self.voice_gender)
    }
}

/// Typed access to persisted settings
#[derive(Clone)]
pub struct SettingsStore {
    storage: Arc<dyn Storage>,
}

impl SettingsStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn api_key(&self, provider: ApiProvider) -> Result<Option<String>> {
        let key: Option<String> = get_typed(self.storage.as_ref(), provider.storage_key()).await?;
        Ok(key.filter(|k| !k.trim().is_empty()))
    }

    /// Save a key; a blank key removes it
    pub async fn set_api_key(&self, provider: ApiProvider, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return self.remove_api_key(provider).await;
        }
        set_typed(self.storage.as_ref(), provider.storage_key(), &key).await
    }

    pub async fn remove_api_key(&self, provider: ApiProvider) -> Result<()> {
        self.storage.remove(&[provider.storage_key()]).await
    }

    pub async fn azure_region(&self) -> Result<Option<String>> {
        get_typed(self.storage.as_ref(), keys::AZURE_REGION).await
    }

    pub async fn set_azure_region(&self, region: &str) -> Result<()> {
        set_typed(self.storage.as_ref(), keys::AZURE_REGION, &region.trim()).await
    }

    pub async fn preferences(&self) -> Result<Preferences> {
        Ok(get_typed(self.storage.as_ref(), keys::PREFERENCES)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_preferences(&self, preferences: &Preferences) -> Result<()> {
        set_typed(self.storage.as_ref(), keys::PREFERENCES, preferences).await
    }

    pub async fn theme(&self) -> Result<Theme> {
        Ok(get_typed(self.storage.as_ref(), keys::THEME)
            .await?
            .unwrap_or_default())
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<()> {
        set_typed(self.storage.as_ref(), keys::THEME, &theme).await
    }

    pub async fn audio_service(&self) -> Result<Option<AudioService>> {
        get_typed(self.storage.as_ref(), keys::AUDIO_SERVICE).await
    }

    pub async fn set_audio_service(&self, service: AudioService) -> Result<()> {
        set_typed(self.storage.as_ref(), keys::AUDIO_SERVICE, &service).await
    }
}
