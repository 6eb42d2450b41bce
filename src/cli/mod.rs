//! Command-line interface for pagesong.
//!
//! Provides commands for transforming pages into songs, inspecting
//! extraction, managing saved keys and history, and dispatching raw
//! message actions.

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use url::Url;
use uuid::Uuid;

use crate::audio::select_voice;
use crate::core::{Request, Stage, TransformRequest};
use crate::domain::{AudioResult, AudioService, Gender, Length, Playable, Style, Tone};
use crate::extract::ContentExtractor;
use crate::player::PlayerState;
use crate::store::ApiProvider;

pub mod app;

pub use app::App;

const USER_AGENT: &str = concat!("pagesong/", env!("CARGO_PKG_VERSION"));

/// pagesong - turn any web page into a song
#[derive(Parser, Debug)]
#[command(name = "pagesong")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Turn a page into a rhyme, with optional audio
    Transform {
        /// URL or path to an HTML file
        source: String,

        /// Song style (rap, pop, nursery, ballad, country)
        #[arg(short, long)]
        style: Option<Style>,

        /// Song length (short, medium, long)
        #[arg(short, long)]
        length: Option<Length>,

        /// Tone (fun, educational, humorous, dramatic, chill)
        #[arg(short, long)]
        tone: Option<Tone>,

        /// Song title (defaults to the page title)
        #[arg(long)]
        title: Option<String>,

        /// Extra instructions for the songwriter
        #[arg(short, long)]
        instructions: Option<String>,

        /// Voice gender (female, male)
        #[arg(short, long)]
        gender: Option<Gender>,

        /// Speech service (browser, elevenlabs, google, azure)
        #[arg(short, long)]
        audio_service: Option<AudioService>,

        /// Skip audio generation
        #[arg(long)]
        no_audio: bool,

        /// Write the audio clip to this file
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Play the audio when done
        #[arg(short, long)]
        play: bool,
    },

    /// Show the content that would be sent to the songwriter
    Extract {
        /// URL or path to an HTML file
        source: String,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List, show or clear saved songs
    History {
        /// Maximum number of entries to show
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Show one entry in full
        #[arg(long)]
        show: Option<String>,

        /// Delete all entries
        #[arg(long)]
        clear: bool,
    },

    /// Save an API key (an empty key removes it)
    SetKey {
        /// Provider (gemini, elevenlabs, google, azure)
        provider: ApiProvider,

        /// The key
        key: String,

        /// Azure region for the speech endpoint
        #[arg(long)]
        region: Option<String>,
    },

    /// Show which API keys are configured
    CheckKey,

    /// Verify a Gemini key, or the configured text backend
    TestKey {
        /// Key to test instead of the configured one
        key: Option<String>,
    },

    /// List local speech voices
    Voices,

    /// Show resolved configuration (debug)
    Config,

    /// Dispatch a raw JSON message (reads stdin if omitted)
    Message {
        /// Message such as {"action":"checkApiKey"}
        json: Option<String>,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Transform {
                source,
                style,
                length,
                tone,
                title,
                instructions,
                gender,
                audio_service,
                no_audio,
                out,
                play,
            } => {
                let args = TransformArgs {
                    style,
                    length,
                    tone,
                    title,
                    instructions,
                    gender,
                    audio_service,
                    with_audio: !no_audio,
                    out,
                    play,
                };
                transform(&source, args).await
            }
            Commands::Extract { source, json } => extract(&source, json).await,
            Commands::History { limit, show, clear } => history(limit, show, clear).await,
            Commands::SetKey {
                provider,
                key,
                region,
            } => set_key(provider, &key, region).await,
            Commands::CheckKey => check_keys().await,
            Commands::TestKey { key } => test_key(key).await,
            Commands::Voices => list_voices().await,
            Commands::Config => show_config(),
            Commands::Message { json } => message(json).await,
        }
    }
}

struct TransformArgs {
    style: Option<Style>,
    length: Option<Length>,
    tone: Option<Tone>,
    title: Option<String>,
    instructions: Option<String>,
    gender: Option<Gender>,
    audio_service: Option<AudioService>,
    with_audio: bool,
    out: Option<PathBuf>,
    play: bool,
}

/// Transform a page and print the song
async fn transform(source: &str, args: TransformArgs) -> Result<()> {
    let app = App::load()?;
    let (html, url) = load_source(source).await?;

    // Flags override saved preferences
    let mut prefs = app.settings.preferences().await?;
    if let Some(style) = args.style {
        prefs.style = style;
    }
    if let Some(length) = args.length {
        prefs.length = length;
    }
    if let Some(tone) = args.tone {
        prefs.tone = tone;
    }
    if let Some(instructions) = args.instructions {
        prefs.custom_instructions = instructions;
    }
    if let Some(gender) = args.gender {
        prefs.voice_gender = gender;
    }

    let options = prefs.generation_options(args.title.unwrap_or_default());
    let mut request =
        TransformRequest::new(html, url, options).with_voice(prefs.voice_options());
    if !args.with_audio {
        request = request.without_audio();
    }

    let orchestrator = app
        .orchestrator(args.audio_service, args.with_audio)
        .await?
        .with_status_listener(Arc::new(|stage: Stage| eprintln!("{}", stage.message())));

    let outcome = orchestrator.transform(request).await?;

    println!("{}", outcome.rhyme.text());
    eprintln!();
    for notice in &outcome.notices {
        eprintln!("[{}]", notice);
    }
    if let Some(item) = &outcome.history_item {
        eprintln!(
            "[Saved {} in {:.1}s: {} / {} / {}]",
            item.id,
            outcome.elapsed_ms as f64 / 1000.0,
            item.settings.style,
            item.settings.length,
            item.settings.tone
        );
    }

    let Some(audio) = outcome.audio else {
        return Ok(());
    };
    eprintln!(
        "[Audio: {} voice {}, ~{:.0}s]",
        audio.service, audio.voice, audio.duration
    );

    if let Some(path) = &args.out {
        write_clip(&audio, path)?;
    }
    if args.play {
        play(&app, &audio).await?;
    }

    Ok(())
}

fn write_clip(audio: &AudioResult, path: &Path) -> Result<()> {
    match &audio.playable {
        Playable::Clip(clip) => {
            std::fs::write(path, clip.data.as_slice())
                .with_context(|| format!("Failed to write audio: {}", path.display()))?;
            eprintln!("[Wrote {} ({})]", path.display(), clip.mime_type);
        }
        Playable::Direct(_) => {
            warn!("Audio is direct playback only; nothing written");
        }
    }
    Ok(())
}

/// Play until the track ends or Ctrl-C
async fn play(app: &App, audio: &AudioResult) -> Result<()> {
    let mut player = app.player()?;
    player.load_track(audio)?;
    player.play()?;

    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if matches!(player.tick(), PlayerState::Ended | PlayerState::Stopped) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                player.stop()?;
                eprintln!("[Stopped]");
                break;
            }
        }
    }
    Ok(())
}

/// Print the extracted content
async fn extract(source: &str, json: bool) -> Result<()> {
    let (html, url) = load_source(source).await?;
    let extraction = ContentExtractor::new().extract_with_strategy(&html, &url);

    if json {
        println!("{}", serde_json::to_string_pretty(&extraction.content)?);
        return Ok(());
    }

    let content = &extraction.content;
    println!("Title:    {}", content.title);
    println!("URL:      {}", content.url);
    println!("Words:    {}", content.word_count);
    println!("Strategy: {:?}", extraction.strategy);
    println!();
    println!("{}", content.content);
    Ok(())
}

/// List, show or clear history
async fn history(limit: usize, show: Option<String>, clear: bool) -> Result<()> {
    let app = App::load()?;

    if clear {
        app.history.clear().await?;
        println!("History cleared");
        return Ok(());
    }

    if let Some(id) = show {
        let id = Uuid::parse_str(&id).with_context(|| format!("Invalid history ID: {}", id))?;
        let item = app
            .history
            .get(id)
            .await?
            .with_context(|| format!("No history entry {}", id))?;

        println!("Title:   {}", item.title);
        println!("URL:     {}", item.url);
        println!(
            "Style:   {} / {} / {}",
            item.settings.style, item.settings.length, item.settings.tone
        );
        println!("Created: {}", item.created_at);
        println!();
        println!("{}", item.rhyme);
        return Ok(());
    }

    let items = app.history.list().await?;
    if items.is_empty() {
        println!("No saved songs");
        return Ok(());
    }

    println!("{:<38} {:<8} {:<18} {:<30}", "ID", "STYLE", "CREATED", "TITLE");
    println!("{}", "-".repeat(96));
    for item in items.iter().take(limit) {
        println!(
            "{:<38} {:<8} {:<18} {:<30}",
            item.id,
            item.settings.style,
            item.created_at.format("%Y-%m-%d %H:%M"),
            truncate(&item.title, 30)
        );
    }
    if items.len() > limit {
        println!("({} more)", items.len() - limit);
    }
    Ok(())
}

async fn set_key(provider: ApiProvider, key: &str, region: Option<String>) -> Result<()> {
    let app = App::load()?;
    app.settings.set_api_key(provider, key).await?;

    if key.trim().is_empty() {
        println!("Removed {} key", provider);
    } else {
        println!("Saved {} key", provider);
    }

    if let Some(region) = region {
        app.settings.set_azure_region(&region).await?;
        println!("Saved Azure region {}", region.trim());
    }
    if app.env_key(provider).is_some() {
        eprintln!("[Note: the environment key for {} takes precedence]", provider);
    }
    Ok(())
}

async fn check_keys() -> Result<()> {
    let app = App::load()?;

    for provider in ApiProvider::ALL {
        let source = if app.env_key(provider).is_some() {
            "environment"
        } else if app.settings.api_key(provider).await?.is_some() {
            "saved"
        } else {
            "not configured"
        };
        println!("{:<12} {}", provider, source);
    }
    Ok(())
}

async fn test_key(key: Option<String>) -> Result<()> {
    let app = App::load()?;
    let response = app.router().await?.dispatch(Request::TestApiKey { api_key: key }).await;

    if response.success {
        println!("Key OK");
        Ok(())
    } else {
        anyhow::bail!(
            "Key test failed: {}",
            response.error.unwrap_or_else(|| "unknown error".to_string())
        )
    }
}

async fn list_voices() -> Result<()> {
    let app = App::load()?;
    let platform = app.platform();
    let voices = platform
        .voices()
        .await
        .with_context(|| format!("Failed to list voices from {}", platform.name()))?;

    if voices.is_empty() {
        println!("No voices found");
        return Ok(());
    }

    println!("{:<30} {:<10} {:<8}", "NAME", "LANG", "GENDER");
    println!("{}", "-".repeat(50));
    for voice in &voices {
        let gender = voice.gender.map(|g| g.as_str()).unwrap_or("-");
        println!("{:<30} {:<10} {:<8}", voice.name, voice.lang, gender);
    }

    let prefs = app.settings.preferences().await?;
    if let Some(voice) = select_voice(&voices, prefs.style, prefs.voice_gender) {
        println!();
        println!(
            "Selected for {} / {}: {}",
            prefs.style, prefs.voice_gender, voice.name
        );
    }
    Ok(())
}

fn show_config() -> Result<()> {
    let cfg = crate::config::config()?;

    println!("pagesong configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!("Home:        {}", cfg.home.display());
    println!("Storage:     {}", crate::config::paths::storage_file()?.display());
    println!();
    println!("Generation:");
    println!("  Backend:   {:?}", cfg.generation.backend);
    println!("  Model:     {}", cfg.generation.model);
    if let Some(url) = &cfg.generation.proxy_url {
        println!("  Proxy:     {}", url);
    }
    println!(
        "  Retry:     {} attempts, {}ms backoff",
        cfg.generation.retry.max_attempts, cfg.generation.retry.delay_ms
    );
    println!();
    println!("Audio:");
    println!(
        "  Service:   {}",
        cfg.audio
            .service
            .map(|s| s.to_string())
            .unwrap_or_else(|| "(saved setting)".to_string())
    );
    println!("  Cache:     {} entries", cfg.audio.cache_size);
    println!("  Speech:    {}", cfg.audio.espeak_binary);
    println!("  Player:    {}", cfg.audio.player_command.join(" "));
    println!();
    println!("History:     {} entries max", cfg.history.max_items);
    println!();
    println!("Environment keys:");
    let keys = &cfg.api_keys;
    for (name, key) in [
        ("gemini", &keys.gemini),
        ("elevenlabs", &keys.elevenlabs),
        ("google", &keys.google_tts),
        ("azure", &keys.azure),
    ] {
        println!("  {:<11} {}", name, if key.is_some() { "set" } else { "-" });
    }

    Ok(())
}

async fn message(json: Option<String>) -> Result<()> {
    let raw = match json {
        Some(json) => json,
        None if io::stdin().is_terminal() => {
            anyhow::bail!("No message provided. Pass JSON as an argument or pipe it to stdin")
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            buffer
        }
    };

    let app = App::load()?;
    let response = app.router().await?.dispatch_json(&raw).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Fetch a URL or read an HTML file; returns the HTML and its URL
async fn load_source(source: &str) -> Result<(String, String)> {
    if let Some(url) = web_url(source) {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        let html = client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to fetch {}", url))?
            .text()
            .await
            .with_context(|| format!("Failed to read response from {}", url))?;
        return Ok((html, url.to_string()));
    }

    let path = PathBuf::from(source);
    let html = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    let absolute = std::fs::canonicalize(&path).unwrap_or(path);
    let url = Url::from_file_path(&absolute)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| absolute.display().to_string());
    Ok((html, url))
}

fn web_url(source: &str) -> Option<Url> {
    Url::parse(source)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}
