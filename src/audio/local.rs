//! Local speech synthesis over a platform speech engine.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::profiles::{gender_voice_keywords, local_settings, style_voice_keywords};
use super::{estimate_duration, SpeechBackend};
use crate::domain::{AudioClip, AudioResult, AudioService, Gender, Style, Utterance, VoiceOptions};
use crate::error::Result;

/// A voice offered by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: String,
    pub lang: String,
    pub gender: Option<Gender>,
}

/// An utterance being spoken by the platform
pub trait SpeechJob: Send {
    fn pause(&mut self) -> Result<()>;
    fn resume(&mut self) -> Result<()>;
    fn cancel(&mut self) -> Result<()>;
    fn is_finished(&mut self) -> bool;
}

/// The machine's speech engine
#[async_trait]
pub trait SpeechPlatform: Send + Sync {
    fn name(&self) -> &str;

    /// Installed voices
    async fn voices(&self) -> Result<Vec<VoiceInfo>>;

    /// Render an utterance to encoded audio.
    ///
    /// `Ok(None)` means the engine can only speak directly.
    async fn capture(&self, utterance: &Utterance) -> Result<Option<AudioClip>>;

    /// Start speaking an utterance straight to the output device
    fn speak(&self, utterance: &Utterance) -> Result<Box<dyn SpeechJob>>;
}

fn matches_gender(voice: &VoiceInfo, gender: Gender) -> bool {
    match voice.gender {
        Some(declared) => declared == gender,
        None => {
            let name = voice.name.to_lowercase();
            // "female" contains "male"
            if gender == Gender::Male && (name.contains("female") || name.contains("woman")) {
                return false;
            }
            gender_voice_keywords(gender).iter().any(|k| name.contains(k))
        }
    }
}

/// Pick a voice: style keywords first, then gender, else the first voice.
pub fn select_voice(voices: &[VoiceInfo], style: Style, gender: Gender) -> Option<&VoiceInfo> {
    let compatible = |voice: &VoiceInfo| voice.gender.map_or(true, |g| g == gender);

    for keyword in style_voice_keywords(style) {
        let hit = voices
            .iter()
            .find(|v| compatible(v) && v.name.to_lowercase().contains(keyword));
        if hit.is_some() {
            return hit;
        }
    }

    voices
        .iter()
        .find(|v| matches_gender(v, gender))
        .or_else(|| voices.first())
}

/// Speech backend that uses the local platform engine
pub struct LocalSynthesis {
    platform: Arc<dyn SpeechPlatform>,
}

impl LocalSynthesis {
    pub fn new(platform: Arc<dyn SpeechPlatform>) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> Arc<dyn SpeechPlatform> {
        Arc::clone(&self.platform)
    }
}

#[async_trait]
impl SpeechBackend for LocalSynthesis {
    fn service(&self) -> AudioService {
        AudioService::Browser
    }

    async fn synthesize(
        &self,
        text: &str,
        style: Style,
        options: &VoiceOptions,
    ) -> Result<AudioResult> {
        let settings = local_settings(style);
        let voices = self.platform.voices().await?;
        let voice = select_voice(&voices, style, options.gender).map(|v| v.name.clone());

        debug!(platform = self.platform.name(), voice = ?voice, "Local synthesis");

        let utterance = Utterance {
            text: text.to_string(),
            voice: voice.clone(),
            rate: settings.rate,
            pitch: settings.pitch,
            volume: settings.volume,
        };
        let voice_name = voice.unwrap_or_else(|| "default".to_string());
        let duration = estimate_duration(text, settings.rate);

        match self.platform.capture(&utterance).await {
            Ok(Some(clip)) => Ok(AudioResult::clip(
                AudioService::Browser,
                clip,
                voice_name,
                duration,
            )),
            Ok(None) => Ok(AudioResult::direct(
                AudioService::Browser,
                utterance,
                voice_name,
                duration,
            )),
            Err(e) => {
                warn!(error = %e, "Audio capture failed, playing directly");
                Ok(AudioResult::direct(
                    AudioService::Browser,
                    utterance,
                    voice_name,
                    duration,
                ))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::Playable;
    use crate::error::Error;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    pub(crate) fn voice(name: &str, gender: Option<Gender>) -> VoiceInfo {
        VoiceInfo {
            name: name.to_string(),
            lang: "en-US".to_string(),
            gender,
        }
    }

    /// Speech job that finishes after a fixed number of polls
    pub(crate) struct FakeJob {
        pub polls_left: usize,
        pub paused: Arc<AtomicBool>,
        pub cancelled: Arc<AtomicBool>,
    }

    impl SpeechJob for FakeJob {
        fn pause(&mut self) -> Result<()> {
            self.paused.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn resume(&mut self) -> Result<()> {
            self.paused.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn cancel(&mut self) -> Result<()> {
            self.cancelled.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn is_finished(&mut self) -> bool {
            if self.cancelled.load(Ordering::SeqCst) {
                return true;
            }
            if self.polls_left == 0 {
                return true;
            }
            self.polls_left -= 1;
            false
        }
    }

    pub(crate) enum CaptureMode {
        Clip,
        Unsupported,
        Fails,
    }

    pub(crate) struct FakePlatform {
        pub voices: Vec<VoiceInfo>,
        pub mode: CaptureMode,
        pub spoken: AtomicUsize,
        pub paused: Arc<AtomicBool>,
        pub cancelled: Arc<AtomicBool>,
    }

    impl FakePlatform {
        pub(crate) fn new(mode: CaptureMode) -> Self {
            Self {
                voices: vec![voice("Samantha", Some(Gender::Female)), voice("Daniel", Some(Gender::Male))],
                mode,
                spoken: AtomicUsize::new(0),
                paused: Arc::new(AtomicBool::new(false)),
                cancelled: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl SpeechPlatform for FakePlatform {
        fn name(&self) -> &str {
            "fake"
        }

        async fn voices(&self) -> Result<Vec<VoiceInfo>> {
            Ok(self.voices.clone())
        }

        async fn capture(&self, utterance: &Utterance) -> Result<Option<AudioClip>> {
            match self.mode {
                CaptureMode::Clip => Ok(Some(AudioClip::new(
                    utterance.text.as_bytes().to_vec(),
                    "audio/wav",
                ))),
                CaptureMode::Unsupported => Ok(None),
                CaptureMode::Fails => Err(Error::Unsupported("no capture device".into())),
            }
        }

        fn speak(&self, _utterance: &Utterance) -> Result<Box<dyn SpeechJob>> {
            self.spoken.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeJob {
                polls_left: 2,
                paused: Arc::clone(&self.paused),
                cancelled: Arc::clone(&self.cancelled),
            }))
        }
    }

    #[test]
    fn test_style_keyword_wins() {
        let voices = vec![
            voice("Alex", Some(Gender::Male)),
            voice("Karen", Some(Gender::Female)),
            voice("Samantha", Some(Gender::Female)),
        ];
        // "samantha" precedes "karen" in the pop preferences
        let chosen = select_voice(&voices, Style::Pop, Gender::Female).unwrap();
        assert_eq!(chosen.name, "Samantha");
    }

    #[test]
    fn test_style_keyword_respects_declared_gender() {
        let voices = vec![voice("Samantha", Some(Gender::Female)), voice("Bruce", Some(Gender::Male))];
        let chosen = select_voice(&voices, Style::Pop, Gender::Male).unwrap();
        assert_eq!(chosen.name, "Bruce");
    }

    #[test]
    fn test_gender_keyword_fallback() {
        let voices = vec![voice("Robot", None), voice("English Female", None)];
        let chosen = select_voice(&voices, Style::Country, Gender::Female).unwrap();
        assert_eq!(chosen.name, "English Female");
    }

    #[test]
    fn test_male_does_not_match_female_names() {
        let voices = vec![voice("English Female", None), voice("English Male", None)];
        let chosen = select_voice(&voices, Style::Country, Gender::Male).unwrap();
        assert_eq!(chosen.name, "English Male");
    }

    #[test]
    fn test_first_voice_fallback() {
        let voices = vec![voice("Robot", None), voice("Other", None)];
        let chosen = select_voice(&voices, Style::Rap, Gender::Male).unwrap();
        assert_eq!(chosen.name, "Robot");
        assert!(select_voice(&[], Style::Rap, Gender::Male).is_none());
    }

    #[tokio::test]
    async fn test_captured_clip() {
        let backend = LocalSynthesis::new(Arc::new(FakePlatform::new(CaptureMode::Clip)));
        let result = backend
            .synthesize("one two three", Style::Nursery, &VoiceOptions::default())
            .await
            .unwrap();

        assert!(!result.play_directly());
        assert_eq!(result.service, AudioService::Browser);
        assert_eq!(result.voice, "Samantha");
        assert!((result.duration - estimate_duration("one two three", 0.85)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_uncapturable_plays_directly() {
        let backend = LocalSynthesis::new(Arc::new(FakePlatform::new(CaptureMode::Unsupported)));
        let result = backend
            .synthesize("hello", Style::Rap, &VoiceOptions::new(Gender::Male))
            .await
            .unwrap();

        assert!(result.play_directly());
        match result.playable {
            Playable::Direct(utterance) => {
                assert_eq!(utterance.voice.as_deref(), Some("Daniel"));
                assert_eq!(utterance.rate, 1.1);
            }
            Playable::Clip(_) => panic!("expected a direct utterance"),
        }
    }

    #[tokio::test]
    async fn test_capture_error_plays_directly() {
        let backend = LocalSynthesis::new(Arc::new(FakePlatform::new(CaptureMode::Fails)));
        let result = backend
            .synthesize("hello", Style::Pop, &VoiceOptions::default())
            .await
            .unwrap();
        assert!(result.play_directly());
    }
}
