//! Audio generation results and voice options.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Text-to-speech service selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioService {
    /// Local speech synthesis on this machine
    #[default]
    Browser,
    ElevenLabs,
    Google,
    Azure,
}

impl AudioService {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioService::Browser => "browser",
            AudioService::ElevenLabs => "elevenlabs",
            AudioService::Google => "google",
            AudioService::Azure => "azure",
        }
    }
}

impl fmt::Display for AudioService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioService {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "browser" | "local" => Ok(AudioService::Browser),
            "elevenlabs" | "eleven-labs" => Ok(AudioService::ElevenLabs),
            "google" => Ok(AudioService::Google),
            "azure" => Ok(AudioService::Azure),
            _ => Err(Error::Config(format!("Unknown audio service: {}", s))),
        }
    }
}

/// Voice gender preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Female,
    Male,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "female" | "f" => Ok(Gender::Female),
            "male" | "m" => Ok(Gender::Male),
            _ => Err(Error::Config(format!("Unknown voice gender: {}", s))),
        }
    }
}

/// Options for a single synthesis request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoiceOptions {
    pub gender: Gender,
}

impl VoiceOptions {
    pub fn new(gender: Gender) -> Self {
        Self { gender }
    }
}

/// Encoded audio that can be replayed and seeked
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub data: Arc<Vec<u8>>,
    pub mime_type: String,
}

impl AudioClip {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data: Arc::new(data),
            mime_type: mime_type.into(),
        }
    }

    /// File extension matching the MIME type
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "audio/wav" | "audio/x-wav" => "wav",
            "audio/ogg" => "ogg",
            _ => "mp3",
        }
    }
}

/// A synthesis instruction played by the platform rather than from bytes
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<String>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Something the player can play
#[derive(Debug, Clone, PartialEq)]
pub enum Playable {
    /// Replayable audio with a timeline
    Clip(AudioClip),
    /// Direct-playback handle with no timeline
    Direct(Utterance),
}

/// Result of an audio generation
#[derive(Debug, Clone, PartialEq)]
pub struct AudioResult {
    pub success: bool,
    pub service: AudioService,
    pub playable: Playable,
    pub voice: String,
    /// Estimated duration in seconds
    pub duration: f64,
}

impl AudioResult {
    pub fn clip(service: AudioService, clip: AudioClip, voice: impl Into<String>, duration: f64) -> Self {
        Self {
            success: true,
            service,
            playable: Playable::Clip(clip),
            voice: voice.into(),
            duration,
        }
    }

    pub fn direct(service: AudioService, utterance: Utterance, voice: impl Into<String>, duration: f64) -> Self {
        Self {
            success: true,
            service,
            playable: Playable::Direct(utterance),
            voice: voice.into(),
            duration,
        }
    }

    /// True when the result must be played by the platform directly
    pub fn play_directly(&self) -> bool {
        matches!(self.playable, Playable::Direct(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_round_trip_names() {
        for name in ["browser", "elevenlabs", "google", "azure"] {
            let service: AudioService = name.parse().unwrap();
            assert_eq!(service.as_str(), name);
        }
        assert!("polly".parse::<AudioService>().is_err());
    }

    #[test]
    fn test_play_directly_follows_variant() {
        let clip = AudioResult::clip(
            AudioService::Google,
            AudioClip::new(vec![1, 2, 3], "audio/mpeg"),
            "en-US-Neural2-F",
            4.0,
        );
        assert!(!clip.play_directly());

        let direct = AudioResult::direct(
            AudioService::Browser,
            Utterance {
                text: "hi".into(),
                voice: None,
                rate: 1.0,
                pitch: 1.0,
                volume: 1.0,
            },
            "default",
            0.4,
        );
        assert!(direct.play_directly());
    }

    #[test]
    fn test_clip_extension() {
        assert_eq!(AudioClip::new(vec![], "audio/wav").extension(), "wav");
        assert_eq!(AudioClip::new(vec![], "audio/mpeg").extension(), "mp3");
    }
}
