//! Google Cloud text-to-speech.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::profiles::google_voice;
use super::{estimate_duration, SpeechBackend};
use crate::adapters::gemini;
use crate::domain::{AudioClip, AudioResult, AudioService, Style, VoiceOptions};
use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://texttospeech.googleapis.com";

const PROVIDER: &str = "Google TTS";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f32,
    pitch: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

pub struct GoogleBackend {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl GoogleBackend {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn decode_audio(body: &str) -> Result<Vec<u8>> {
        let response: SynthesizeResponse = serde_json::from_str(body)?;
        let encoded = response
            .audio_content
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::MalformedResponse("response has no audioContent".to_string()))?;

        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| Error::MalformedResponse(format!("audioContent is not base64: {}", e)))
    }
}

#[async_trait]
impl SpeechBackend for GoogleBackend {
    fn service(&self) -> AudioService {
        AudioService::Google
    }

    async fn synthesize(
        &self,
        text: &str,
        style: Style,
        options: &VoiceOptions,
    ) -> Result<AudioResult> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::missing_key(PROVIDER))?;
        let voice = google_voice(style, options.gender);

        let body = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: "en-US",
                name: voice.name,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: voice.speaking_rate,
                pitch: voice.pitch,
            },
        };

        debug!(voice = voice.name, "Google text:synthesize");

        let response = self
            .client
            .post(format!("{}/v1/text:synthesize", self.base_url))
            .header(gemini::API_KEY_HEADER, key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text_body = response.text().await?;
        if !status.is_success() {
            return Err(Error::from_status(PROVIDER, status.as_u16(), text_body));
        }

        let audio = Self::decode_audio(&text_body)?;

        Ok(AudioResult::clip(
            AudioService::Google,
            AudioClip::new(audio, "audio/mpeg"),
            voice.name,
            estimate_duration(text, voice.speaking_rate),
        ))
    }
}
