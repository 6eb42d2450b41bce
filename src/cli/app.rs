//! Wiring from resolved configuration and saved settings to components.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::adapters::{GeminiBackend, ProxyBackend, TextBackend};
use crate::audio::{
    AudioGenerator, AzureBackend, ElevenLabsBackend, EspeakPlatform, GoogleBackend,
    LocalSynthesis, SpeechBackend, SpeechPlatform,
};
use crate::config::{self, paths, ResolvedConfig, TextBackendKind};
use crate::core::{MessageRouter, Orchestrator};
use crate::domain::AudioService;
use crate::generate::RhymeGenerator;
use crate::player::{command_output, AudioPlayer};
use crate::store::{ApiProvider, HistoryStore, JsonFileStorage, SettingsStore, Storage};

/// Components shared by the CLI commands
pub struct App {
    pub config: ResolvedConfig,
    pub settings: SettingsStore,
    pub history: HistoryStore,
    platform: Arc<EspeakPlatform>,
}

impl App {
    /// Load configuration and open the storage file under the home directory
    pub fn load() -> Result<Self> {
        let config = config::config()?.clone();
        let storage: Arc<dyn Storage> = Arc::new(JsonFileStorage::new(paths::storage_file()?));
        Ok(Self::new(config, storage))
    }

    pub fn new(config: ResolvedConfig, storage: Arc<dyn Storage>) -> Self {
        let platform = Arc::new(EspeakPlatform::with_binary_path(
            config.audio.espeak_binary.clone(),
        ));
        Self {
            settings: SettingsStore::new(Arc::clone(&storage)),
            history: HistoryStore::new(storage).with_max_items(config.history.max_items),
            config,
            platform,
        }
    }

    /// Key from the environment, else the saved one
    pub async fn api_key(&self, provider: ApiProvider) -> Result<Option<String>> {
        if let Some(key) = self.env_key(provider) {
            return Ok(Some(key.to_string()));
        }
        Ok(self.settings.api_key(provider).await?)
    }

    pub fn env_key(&self, provider: ApiProvider) -> Option<&str> {
        let keys = &self.config.api_keys;
        match provider {
            ApiProvider::Gemini => keys.gemini.as_deref(),
            ApiProvider::ElevenLabs => keys.elevenlabs.as_deref(),
            ApiProvider::GoogleTts => keys.google_tts.as_deref(),
            ApiProvider::Azure => keys.azure.as_deref(),
        }
    }

    pub async fn text_backend(&self) -> Result<Arc<dyn TextBackend>> {
        let generation = &self.config.generation;
        match generation.backend {
            TextBackendKind::Proxy => {
                let url = generation
                    .proxy_url
                    .clone()
                    .context("Proxy backend selected but no proxy URL configured")?;
                debug!(%url, "Using proxy backend");
                Ok(Arc::new(ProxyBackend::new(url)))
            }
            TextBackendKind::Gemini => {
                let key = self.api_key(ApiProvider::Gemini).await?;
                Ok(Arc::new(
                    GeminiBackend::new(key).with_model(generation.model.clone()),
                ))
            }
        }
    }

    pub async fn generator(&self) -> Result<Arc<RhymeGenerator>> {
        let generator = RhymeGenerator::new(self.text_backend().await?)
            .with_retry_policy(self.config.generation.retry.clone());
        Ok(Arc::new(generator))
    }

    pub fn platform(&self) -> Arc<dyn SpeechPlatform> {
        self.platform.clone()
    }

    /// Explicit choice, then the config file, then the saved setting
    pub async fn audio_service(&self, requested: Option<AudioService>) -> Result<AudioService> {
        if let Some(service) = requested.or(self.config.audio.service) {
            return Ok(service);
        }
        Ok(self.settings.audio_service().await?.unwrap_or_default())
    }

    pub async fn audio_generator(&self, requested: Option<AudioService>) -> Result<Arc<AudioGenerator>> {
        let local: Arc<dyn SpeechBackend> = Arc::new(LocalSynthesis::new(self.platform()));

        let primary: Arc<dyn SpeechBackend> = match self.audio_service(requested).await? {
            AudioService::Browser => Arc::clone(&local),
            AudioService::ElevenLabs => Arc::new(ElevenLabsBackend::new(
                self.api_key(ApiProvider::ElevenLabs).await?,
            )),
            AudioService::Google => Arc::new(GoogleBackend::new(
                self.api_key(ApiProvider::GoogleTts).await?,
            )),
            AudioService::Azure => {
                let region = match &self.config.audio.azure_region {
                    Some(region) => Some(region.clone()),
                    None => self.settings.azure_region().await?,
                };
                Arc::new(AzureBackend::new(self.api_key(ApiProvider::Azure).await?, region))
            }
        };

        debug!(service = %primary.service(), "Audio backend selected");
        Ok(Arc::new(
            AudioGenerator::new(primary, local).with_cache_size(self.config.audio.cache_size),
        ))
    }

    pub async fn orchestrator(&self, audio: Option<AudioService>, with_audio: bool) -> Result<Orchestrator> {
        let orchestrator = Orchestrator::new(self.generator().await?, self.history.clone());
        if !with_audio {
            return Ok(orchestrator);
        }
        Ok(orchestrator.with_audio(self.audio_generator(audio).await?))
    }

    pub async fn router(&self) -> Result<MessageRouter> {
        Ok(MessageRouter::new(self.generator().await?, self.settings.clone())
            .with_env_key(self.config.api_keys.gemini.clone())
            .with_gemini(
                self.config.generation.model.clone(),
                crate::adapters::gemini::DEFAULT_BASE_URL,
            ))
    }

    /// Player with local speech for direct results and the configured
    /// external command for clips
    pub fn player(&self) -> Result<AudioPlayer> {
        let mut command = self.config.audio.player_command.iter().cloned();
        let program = command.next().context("audio.player_command is empty")?;
        let output = command_output(program, command.collect(), paths::player_dir()?);

        Ok(AudioPlayer::new()
            .with_platform(self.platform())
            .with_clip_output(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKeys, AudioSettings, GenerationSettings, HistorySettings};
    use crate::store::MemoryStorage;
    use std::path::PathBuf;

    fn resolved(api_keys: ApiKeys) -> ResolvedConfig {
        ResolvedConfig {
            home: PathBuf::from("/tmp/pagesong-test"),
            config_file: None,
            api_keys,
            generation: GenerationSettings::default(),
            audio: AudioSettings::default(),
            history: HistorySettings::default(),
        }
    }

    #[tokio::test]
    async fn test_env_key_wins_over_saved() {
        let app = App::new(
            resolved(ApiKeys {
                gemini: Some("from-env".into()),
                ..Default::default()
            }),
            Arc::new(MemoryStorage::new()),
        );
        app.settings
            .set_api_key(ApiProvider::Gemini, "saved")
            .await
            .unwrap();
        app.settings
            .set_api_key(ApiProvider::Azure, "saved-azure")
            .await
            .unwrap();

        assert_eq!(
            app.api_key(ApiProvider::Gemini).await.unwrap().as_deref(),
            Some("from-env")
        );
        assert_eq!(
            app.api_key(ApiProvider::Azure).await.unwrap().as_deref(),
            Some("saved-azure")
        );
        assert_eq!(app.api_key(ApiProvider::GoogleTts).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_audio_service_precedence() {
        let mut config = resolved(ApiKeys::default());
        let app = App::new(config.clone(), Arc::new(MemoryStorage::new()));
        assert_eq!(app.audio_service(None).await.unwrap(), AudioService::Browser);

        app.settings.set_audio_service(AudioService::Google).await.unwrap();
        assert_eq!(app.audio_service(None).await.unwrap(), AudioService::Google);
        assert_eq!(
            app.audio_service(Some(AudioService::Azure)).await.unwrap(),
            AudioService::Azure
        );

        config.audio.service = Some(AudioService::ElevenLabs);
        let app = App::new(config, Arc::new(MemoryStorage::new()));
        app.settings.set_audio_service(AudioService::Google).await.unwrap();
        assert_eq!(app.audio_service(None).await.unwrap(), AudioService::ElevenLabs);
    }

    #[tokio::test]
    async fn test_backend_selection() {
        let app = App::new(resolved(ApiKeys::default()), Arc::new(MemoryStorage::new()));
        assert_eq!(app.text_backend().await.unwrap().name(), "gemini");

        let mut config = resolved(ApiKeys::default());
        config.generation.backend = TextBackendKind::Proxy;
        config.generation.proxy_url = Some("http://localhost:3000".into());
        let app = App::new(config, Arc::new(MemoryStorage::new()));
        assert_eq!(app.text_backend().await.unwrap().name(), "proxy");

        let generator = app.audio_generator(Some(AudioService::Azure)).await.unwrap();
        assert_eq!(generator.service(), AudioService::Azure);
    }
}
