//! Domain types for pagesong.
//!
//! This module contains the core data structures:
//! - ExtractedContent: page text and metadata
//! - GenerationOptions / RhymeResult: rhyme requests and outcomes
//! - AudioResult / Playable: synthesized speech
//! - HistoryItem: saved transformations

pub mod audio;
pub mod content;
pub mod history;
pub mod options;
pub mod rhyme;

// Re-export commonly used types
pub use audio::{AudioClip, AudioResult, AudioService, Gender, Playable, Utterance, VoiceOptions};
pub use content::{word_count, ExtractedContent};
pub use history::HistoryItem;
pub use options::{GenerationOptions, Length, Style, Tone};
pub use rhyme::{RhymeMetadata, RhymeResult};
