//! Azure Cognitive Services text-to-speech (SSML).

use async_trait::async_trait;
use quick_xml::escape::escape;
use tracing::debug;

use super::profiles::{azure_voice, AzureVoice};
use super::{estimate_duration, SpeechBackend};
use crate::domain::{AudioClip, AudioResult, AudioService, Style, VoiceOptions};
use crate::error::{Error, Result};

pub const DEFAULT_REGION: &str = "eastus";
pub const OUTPUT_FORMAT: &str = "audio-16khz-128kbitrate-mono-mp3";

const PROVIDER: &str = "Azure TTS";

/// Render the SSML document for `text`
pub fn build_ssml(text: &str, voice: &AzureVoice) -> String {
    format!(
        "<speak version=\"1.0\" xmlns=\"http://www.w3.org/2001/10/synthesis\" xml:lang=\"en-US\">\
<voice name=\"{}\"><prosody rate=\"{}\" pitch=\"{}\">{}</prosody></voice></speak>",
        voice.name,
        voice.rate_attr(),
        voice.pitch_attr(),
        escape(text)
    )
}

pub struct AzureBackend {
    api_key: Option<String>,
    region: String,
    endpoint: Option<String>,
    client: reqwest::Client,
}

impl AzureBackend {
    pub fn new(api_key: Option<String>, region: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            region: region
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint: None,
            client: reqwest::Client::new(),
        }
    }

    /// Override the region-derived endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn endpoint(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| {
            format!(
                "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
                self.region
            )
        })
    }
}

#[async_trait]
impl SpeechBackend for AzureBackend {
    fn service(&self) -> AudioService {
        AudioService::Azure
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
        let voice = azure_voice(style, options.gender);

        debug!(voice = voice.name, region = %self.region, "Azure synthesis");

        let response = self
            .client
            .post(self.endpoint())
            .header("Ocp-Apim-Subscription-Key", key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .header("User-Agent", "pagesong")
            .body(build_ssml(text, &voice))
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
            AudioService::Azure,
            AudioClip::new(bytes.to_vec(), "audio/mpeg"),
            voice.name,
            estimate_duration(text, voice.rate),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Gender;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_ssml_escapes_text() {
        let voice = azure_voice(Style::Rap, Gender::Male);
        let ssml = build_ssml("Rock & <roll>", &voice);

        assert!(ssml.contains("<voice name=\"en-US-DavisNeural\">"));
        assert!(ssml.contains("<prosody rate=\"+10%\" pitch=\"-5%\">"));
        assert!(ssml.contains("Rock &amp; &lt;roll&gt;"));
    }

    #[test]
    fn test_region_endpoint() {
        let backend = AzureBackend::new(Some("k".into()), Some("westeurope".into()));
        assert_eq!(
            backend.endpoint(),
            "https://westeurope.tts.speech.microsoft.com/cognitiveservices/v1"
        );

        let backend = AzureBackend::new(Some("k".into()), None);
        assert!(backend.endpoint().starts_with("https://eastus."));
    }

    #[tokio::test]
    async fn test_synthesize() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cognitiveservices/v1"))
            .and(header("Ocp-Apim-Subscription-Key", "akey"))
            .and(header("X-Microsoft-OutputFormat", OUTPUT_FORMAT))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .expect(1)
            .mount(&server)
            .await;

        let backend = AzureBackend::new(Some("akey".into()), None)
            .with_endpoint(format!("{}/cognitiveservices/v1", server.uri()));
        let result = backend
            .synthesize("slow song", Style::Ballad, &VoiceOptions::default())
            .await
            .unwrap();

        assert_eq!(result.service, AudioService::Azure);
        assert_eq!(result.voice, "en-US-SaraNeural");
    }
}
