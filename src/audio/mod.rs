//! Text-to-speech for generated rhymes.
//!
//! [`AudioGenerator`] fronts one configured [`SpeechBackend`] with a FIFO
//! cache and falls back to local synthesis when a remote provider fails.

pub mod azure;
pub mod cache;
pub mod elevenlabs;
pub mod espeak;
pub mod google;
pub mod local;
pub mod process;
pub mod profiles;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::domain::{word_count, AudioResult, AudioService, Style, VoiceOptions};
use crate::error::Result;

pub use azure::AzureBackend;
pub use cache::{cache_key, text_hash, AudioCache, DEFAULT_CACHE_SIZE};
pub use elevenlabs::ElevenLabsBackend;
pub use espeak::EspeakPlatform;
pub use google::GoogleBackend;
pub use local::{select_voice, LocalSynthesis, SpeechJob, SpeechPlatform, VoiceInfo};
pub use process::ProcessJob;

/// Speaking rate used by the duration heuristic
pub const WORDS_PER_MINUTE: f64 = 150.0;

/// Trait for speech backends
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Which service this backend implements
    fn service(&self) -> AudioService;

    /// Synthesize `text` with the voice profile for `style`
    async fn synthesize(
        &self,
        text: &str,
        style: Style,
        options: &VoiceOptions,
    ) -> Result<AudioResult>;
}

/// Estimated playback length in seconds: `words / 150 * 60 / rate`
pub fn estimate_duration(text: &str, rate: f32) -> f64 {
    let rate = if rate > 0.0 { rate as f64 } else { 1.0 };
    word_count(text) as f64 / WORDS_PER_MINUTE * 60.0 / rate
}

/// Cached audio generation over a primary backend and local synthesis
pub struct AudioGenerator {
    primary: Arc<dyn SpeechBackend>,
    local: Arc<dyn SpeechBackend>,
    cache: Mutex<AudioCache>,
}

impl AudioGenerator {
    /// `primary` is the configured service; `local` is the fallback.
    /// Pass the same backend twice when local synthesis is the primary.
    pub fn new(primary: Arc<dyn SpeechBackend>, local: Arc<dyn SpeechBackend>) -> Self {
        Self {
            primary,
            local,
            cache: Mutex::new(AudioCache::default()),
        }
    }

    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache = Mutex::new(AudioCache::new(size));
        self
    }

    pub fn service(&self) -> AudioService {
        self.primary.service()
    }

    /// Number of cached results
    pub async fn cached(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }

    /// Synthesize `text`, serving repeated requests from the cache.
    #[instrument(skip(self, text), fields(service = %self.primary.service(), style = %style))]
    pub async fn generate_audio(
        &self,
        text: &str,
        style: Style,
        options: VoiceOptions,
    ) -> Result<AudioResult> {
        let key = cache_key(style, options.gender, text);

        if let Some(hit) = self.cache.lock().await.get(&key) {
            debug!(key = %key, "Audio cache hit");
            return Ok(hit.clone());
        }

        let result = match self.primary.synthesize(text, style, &options).await {
            Ok(result) => result,
            Err(e) if self.primary.service() != AudioService::Browser => {
                warn!(error = %e, "Speech backend failed, falling back to local synthesis");
                self.local.synthesize(text, style, &options).await?
            }
            Err(e) => return Err(e),
        };

        info!(
            service = %result.service,
            voice = %result.voice,
            duration = result.duration,
            "Audio generated"
        );

        self.cache.lock().await.insert(key, result.clone());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AudioClip, Gender};
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBackend {
        service: AudioService,
        fail: bool,
        calls: AtomicUsize,
    }

    impl CountingBackend {
        fn new(service: AudioService, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                service,
                fail,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SpeechBackend for CountingBackend {
        fn service(&self) -> AudioService {
            self.service
        }

        async fn synthesize(
            &self,
            text: &str,
            _style: Style,
            _options: &VoiceOptions,
        ) -> Result<AudioResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Network("connection reset".into()));
            }
            Ok(AudioResult::clip(
                self.service,
                AudioClip::new(text.as_bytes().to_vec(), "audio/mpeg"),
                "test-voice",
                estimate_duration(text, 1.0),
            ))
        }
    }

    #[test]
    fn test_estimate_duration() {
        let text = vec!["word"; 150].join(" ");
        assert!((estimate_duration(&text, 1.0) - 60.0).abs() < 1e-9);
        assert!((estimate_duration(&text, 2.0) - 30.0).abs() < 1e-9);
        assert_eq!(estimate_duration("", 1.0), 0.0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_backend() {
        let primary = CountingBackend::new(AudioService::Google, false);
        let local = CountingBackend::new(AudioService::Browser, false);
        let generator = AudioGenerator::new(primary.clone(), local.clone());

        let options = VoiceOptions::new(Gender::Female);
        let first = generator.generate_audio("la la la", Style::Pop, options).await.unwrap();
        let second = generator.generate_audio("la la la", Style::Pop, options).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(primary.calls(), 1);
        assert_eq!(generator.cached().await, 1);
    }

    #[tokio::test]
    async fn test_gender_is_part_of_key() {
        let primary = CountingBackend::new(AudioService::Google, false);
        let generator = AudioGenerator::new(primary.clone(), primary.clone());

        generator
            .generate_audio("la", Style::Pop, VoiceOptions::new(Gender::Female))
            .await
            .unwrap();
        generator
            .generate_audio("la", Style::Pop, VoiceOptions::new(Gender::Male))
            .await
            .unwrap();

        assert_eq!(primary.calls(), 2);
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_to_local() {
        let primary = CountingBackend::new(AudioService::ElevenLabs, true);
        let local = CountingBackend::new(AudioService::Browser, false);
        let generator = AudioGenerator::new(primary.clone(), local.clone());

        let result = generator
            .generate_audio("hello there", Style::Rap, VoiceOptions::default())
            .await
            .unwrap();

        assert_eq!(result.service, AudioService::Browser);
        assert_eq!(primary.calls(), 1);
        assert_eq!(local.calls(), 1);
    }

    #[tokio::test]
    async fn test_local_failure_propagates() {
        let local = CountingBackend::new(AudioService::Browser, true);
        let generator = AudioGenerator::new(local.clone(), local.clone());

        let err = generator
            .generate_audio("hello", Style::Ballad, VoiceOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Network(_)));
        assert_eq!(local.calls(), 1);
        assert_eq!(generator.cached().await, 0);
    }
}
