//! Generation options: style, length and tone.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Musical style of the generated rhyme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Rap,
    #[default]
    Pop,
    Nursery,
    Ballad,
    Country,
}

impl Style {
    pub const ALL: [Style; 5] = [
        Style::Rap,
        Style::Pop,
        Style::Nursery,
        Style::Ballad,
        Style::Country,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Rap => "rap",
            Style::Pop => "pop",
            Style::Nursery => "nursery",
            Style::Ballad => "ballad",
            Style::Country => "country",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Style {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rap" | "hiphop" | "hip-hop" => Ok(Style::Rap),
            "pop" => Ok(Style::Pop),
            "nursery" | "nursery-rhyme" => Ok(Style::Nursery),
            "ballad" => Ok(Style::Ballad),
            "country" => Ok(Style::Country),
            _ => Err(Error::Config(format!("Unknown style: {}", s))),
        }
    }
}

/// Target length of the generated rhyme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Length {
    Short,
    #[default]
    Medium,
    Long,
}

impl Length {
    pub const ALL: [Length; 3] = [Length::Short, Length::Medium, Length::Long];

    pub fn as_str(&self) -> &'static str {
        match self {
            Length::Short => "short",
            Length::Medium => "medium",
            Length::Long => "long",
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Length {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(Length::Short),
            "medium" => Ok(Length::Medium),
            "long" => Ok(Length::Long),
            _ => Err(Error::Config(format!("Unknown length: {}", s))),
        }
    }
}

/// Emotional tone of the generated rhyme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Fun,
    Educational,
    Humorous,
    Dramatic,
    Chill,
}

impl Tone {
    pub const ALL: [Tone; 5] = [
        Tone::Fun,
        Tone::Educational,
        Tone::Humorous,
        Tone::Dramatic,
        Tone::Chill,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Fun => "fun",
            Tone::Educational => "educational",
            Tone::Humorous => "humorous",
            Tone::Dramatic => "dramatic",
            Tone::Chill => "chill",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fun" => Ok(Tone::Fun),
            "educational" => Ok(Tone::Educational),
            "humorous" | "funny" => Ok(Tone::Humorous),
            "dramatic" => Ok(Tone::Dramatic),
            "chill" => Ok(Tone::Chill),
            _ => Err(Error::Config(format!("Unknown tone: {}", s))),
        }
    }
}

/// Per-request generation options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationOptions {
    pub style: Style,
    pub length: Length,
    pub tone: Tone,
    pub title: String,
    pub custom_instructions: String,
}

impl GenerationOptions {
    pub fn new(style: Style, length: Length, tone: Tone) -> Self {
        Self {
            style,
            length,
            tone,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.custom_instructions = instructions.into();
        self
    }
}
