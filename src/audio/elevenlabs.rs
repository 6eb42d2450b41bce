//! ElevenLabs text-to-speech.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::profiles::elevenlabs_voice;
use super::{estimate_duration, SpeechBackend};
use crate::domain::{AudioClip, AudioResult, AudioService, Style, VoiceOptions};
use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
pub const MODEL_ID: &str = "eleven_monolingual_v1";

const PROVIDER: &str = "ElevenLabs";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'static str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

pub struct ElevenLabsBackend {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl ElevenLabsBackend {
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
}

#[async_trait]
impl SpeechBackend for ElevenLabsBackend {
    fn service(&self) -> AudioService {
        AudioService::ElevenLabs
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
        let voice = elevenlabs_voice(style, options.gender);

        let body = SpeechRequest {
            text,
            model_id: MODEL_ID,
            voice_settings: VoiceSettings {
                stability: voice.stability,
                similarity_boost: voice.similarity_boost,
                style: voice.style,
                use_speaker_boost: true,
            },
        };

        debug!(voice = voice.name, "ElevenLabs text-to-speech");

        let response = self
            .client
            .post(format!("{}/v1/text-to-speech/{}", self.base_url, voice.voice_id))
            .header("xi-api-key", key)
            .header("Accept", "audio/mpeg")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::from_status(PROVIDER, status.as_u16(), message));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(Error::MalformedResponse("empty audio body".to_string()));
        }

        Ok(AudioResult::clip(
            AudioService::ElevenLabs,
            AudioClip::new(bytes.to_vec(), "audio/mpeg"),
            voice.name,
            estimate_duration(text, 1.0),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Gender;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_synthesize_posts_voice_settings() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/VR6AewLTigWG4xSOukaG"))
            .and(header("xi-api-key", "secret"))
            .and(body_partial_json(serde_json::json!({
                "text": "yo yo",
                "model_id": "eleven_monolingual_v1",
                "voice_settings": { "use_speaker_boost": true }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xFB, 0x90]))
            .expect(1)
            .mount(&server)
            .await;

        let backend = ElevenLabsBackend::new(Some("secret".into())).with_base_url(server.uri());
        let result = backend
            .synthesize("yo yo", Style::Rap, &VoiceOptions::new(Gender::Male))
            .await
            .unwrap();

        assert_eq!(result.service, AudioService::ElevenLabs);
        assert_eq!(result.voice, "Arnold");
        assert!(!result.play_directly());
    }

    #[tokio::test]
    async fn test_rejected_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let backend = ElevenLabsBackend::new(Some("bad".into())).with_base_url(server.uri());
        let err = backend
            .synthesize("hi", Style::Pop, &VoiceOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidApiKey { .. }));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let backend = ElevenLabsBackend::new(None);
        let err = backend
            .synthesize("hi", Style::Pop, &VoiceOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingApiKey { .. }));
    }
}
