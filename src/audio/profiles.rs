//! Per-style voice tables for every speech backend.

use crate::domain::{Gender, Style};

/// Prosody for local synthesis (1.0 = platform default)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalVoiceSettings {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

pub fn local_settings(style: Style) -> LocalVoiceSettings {
    let (rate, pitch, volume) = match style {
        Style::Rap => (1.1, 0.9, 1.0),
        Style::Pop => (1.0, 1.2, 1.0),
        Style::Nursery => (0.85, 1.3, 1.0),
        Style::Ballad => (0.8, 1.0, 0.9),
        Style::Country => (0.9, 0.95, 1.0),
    };
    LocalVoiceSettings {
        rate,
        pitch,
        volume,
    }
}

/// Voice-name keywords preferred for a style, most preferred first
pub fn style_voice_keywords(style: Style) -> &'static [&'static str] {
    match style {
        Style::Rap => &["daniel", "alex", "fred", "david"],
        Style::Pop => &["samantha", "karen", "zira", "victoria"],
        Style::Nursery => &["victoria", "kathy", "princess", "fiona"],
        Style::Ballad => &["moira", "tessa", "serena", "daniel"],
        Style::Country => &["tom", "fred", "ralph", "allison"],
    }
}

/// Voice-name keywords hinting at a gender
pub fn gender_voice_keywords(gender: Gender) -> &'static [&'static str] {
    match gender {
        Gender::Female => &[
            "female", "woman", "samantha", "victoria", "karen", "zira", "moira", "tessa", "fiona",
        ],
        Gender::Male => &["male", "man", "daniel", "alex", "david", "fred", "tom", "ralph"],
    }
}

/// ElevenLabs voice and settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevenLabsVoice {
    pub voice_id: &'static str,
    pub name: &'static str,
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
}

pub fn elevenlabs_voice(style: Style, gender: Gender) -> ElevenLabsVoice {
    let (voice_id, name) = match (style, gender) {
        (Style::Rap, Gender::Female) => ("AZnzlk1XvdvUeBnXmlld", "Domi"),
        (Style::Rap, Gender::Male) => ("VR6AewLTigWG4xSOukaG", "Arnold"),
        (Style::Pop, Gender::Female) => ("EXAVITQu4vr4xnSDxMaL", "Bella"),
        (Style::Pop, Gender::Male) => ("ErXwobaYiN019PkySvjV", "Antoni"),
        (Style::Nursery, Gender::Female) => ("MF3mGyEYCl7XYWbV9V6O", "Elli"),
        (Style::Nursery, Gender::Male) => ("TxGEqnHWrfWFTfGW9XjX", "Josh"),
        (Style::Ballad, Gender::Female) => ("21m00Tcm4TlvDq8ikWAM", "Rachel"),
        (Style::Ballad, Gender::Male) => ("pNInz6obpgDQGcFmaJgB", "Adam"),
        (Style::Country, Gender::Female) => ("ThT5KcBeYPX3keUQqHPh", "Dorothy"),
        (Style::Country, Gender::Male) => ("yoZ06aMxZJJ28mfd3POQ", "Sam"),
    };
    let (stability, similarity_boost, style_strength) = match style {
        Style::Rap => (0.35, 0.8, 0.7),
        Style::Pop => (0.5, 0.75, 0.6),
        Style::Nursery => (0.7, 0.8, 0.4),
        Style::Ballad => (0.6, 0.85, 0.5),
        Style::Country => (0.55, 0.75, 0.5),
    };
    ElevenLabsVoice {
        voice_id,
        name,
        stability,
        similarity_boost,
        style: style_strength,
    }
}

/// Google Cloud TTS voice and audio config
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoogleVoice {
    pub name: &'static str,
    pub speaking_rate: f32,
    /// Semitones, -20.0..=20.0
    pub pitch: f32,
}

pub fn google_voice(style: Style, gender: Gender) -> GoogleVoice {
    let name = match (style, gender) {
        (Style::Rap, Gender::Female) => "en-US-Neural2-H",
        (Style::Rap, Gender::Male) => "en-US-Neural2-J",
        (Style::Pop, Gender::Female) => "en-US-Neural2-F",
        (Style::Pop, Gender::Male) => "en-US-Neural2-A",
        (Style::Nursery, Gender::Female) => "en-US-Neural2-G",
        (Style::Nursery, Gender::Male) => "en-US-Neural2-I",
        (Style::Ballad, Gender::Female) => "en-US-Neural2-C",
        (Style::Ballad, Gender::Male) => "en-US-Neural2-D",
        (Style::Country, Gender::Female) => "en-US-Neural2-E",
        (Style::Country, Gender::Male) => "en-US-Wavenet-B",
    };
    let (speaking_rate, pitch) = match style {
        Style::Rap => (1.15, -2.0),
        Style::Pop => (1.05, 2.0),
        Style::Nursery => (0.9, 4.0),
        Style::Ballad => (0.85, 0.0),
        Style::Country => (0.95, -1.0),
    };
    GoogleVoice {
        name,
        speaking_rate,
        pitch,
    }
}

/// Azure neural voice and prosody
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AzureVoice {
    pub name: &'static str,
    /// Relative rate, e.g. 1.1 renders as "+10%"
    pub rate: f32,
    /// Relative pitch in percent
    pub pitch_percent: i32,
}

impl AzureVoice {
    pub fn rate_attr(&self) -> String {
        format!("{:+}%", ((self.rate - 1.0) * 100.0).round() as i32)
    }

    pub fn pitch_attr(&self) -> String {
        format!("{:+}%", self.pitch_percent)
    }
}

pub fn azure_voice(style: Style, gender: Gender) -> AzureVoice {
    let name = match (style, gender) {
        (Style::Rap, Gender::Female) => "en-US-AriaNeural",
        (Style::Rap, Gender::Male) => "en-US-DavisNeural",
        (Style::Pop, Gender::Female) => "en-US-JennyNeural",
        (Style::Pop, Gender::Male) => "en-US-GuyNeural",
        (Style::Nursery, Gender::Female) => "en-US-AnaNeural",
        (Style::Nursery, Gender::Male) => "en-US-BrandonNeural",
        (Style::Ballad, Gender::Female) => "en-US-SaraNeural",
        (Style::Ballad, Gender::Male) => "en-US-ChristopherNeural",
        (Style::Country, Gender::Female) => "en-US-JaneNeural",
        (Style::Country, Gender::Male) => "en-US-TonyNeural",
    };
    let (rate, pitch_percent) = match style {
        Style::Rap => (1.1, -5),
        Style::Pop => (1.0, 5),
        Style::Nursery => (0.9, 10),
        Style::Ballad => (0.85, 0),
        Style::Country => (0.95, -2),
    };
    AzureVoice {
        name,
        rate,
        pitch_percent,
    }
}
