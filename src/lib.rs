//! pagesong - turn web pages into songs
//!
//! Scrapes the readable text of a page, asks a generative-text API for a
//! rhyme in the chosen style, and optionally speaks it.
//!
//! # Architecture
//!
//! The pipeline runs leaves first:
//! - Extraction picks the main content through an ordered fallback chain
//! - Generation calls a text backend with bounded retry and always
//!   produces a result, falling back to a templated rhyme
//! - Audio synthesis goes through one configured speech backend with a
//!   FIFO cache and local synthesis as the fallback
//! - The orchestrator saves each transformation to history
//!
//! # Modules
//!
//! - `adapters`: Text backends (Gemini, proxy relay)
//! - `audio`: Speech backends and the audio cache
//! - `core`: Orchestrator and message router
//! - `domain`: Data structures (ExtractedContent, RhymeResult, AudioResult)
//! - `extract`: HTML content extraction
//! - `generate`: Prompt building, retry and fallback rhymes
//! - `player`: Transport controls for generated audio
//! - `store`: Persisted settings and history
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Turn a page into a rap and play it
//! pagesong transform https://example.com --style rap --play
//!
//! # Show recent songs
//! pagesong history --limit 5
//! ```

pub mod adapters;
pub mod audio;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod extract;
pub mod generate;
pub mod player;
pub mod store;

// Re-export main types at crate root for convenience
pub use core::{MessageRouter, Orchestrator, TransformOutcome, TransformRequest};
pub use domain::{AudioResult, ExtractedContent, GenerationOptions, HistoryItem, RhymeResult};
pub use error::{Error, Result};
pub use extract::ContentExtractor;
pub use generate::RhymeGenerator;
pub use player::AudioPlayer;
