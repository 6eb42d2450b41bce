//! Configuration for pagesong.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (PAGESONG_HOME, GEMINI_API_KEY, ELEVENLABS_API_KEY,
//!    GOOGLE_TTS_API_KEY, AZURE_TTS_KEY, AZURE_TTS_REGION, PAGESONG_PROXY_URL,
//!    PAGESONG_AUDIO_SERVICE)
//! 2. Config file (.pagesong/config.yaml)
//! 3. Defaults (~/.pagesong)
//!
//! Config file discovery:
//! - Searches current directory and parents for .pagesong/config.yaml
//! - Paths in config file are relative to the .pagesong/ directory
//!
//! API keys saved with `pagesong set-key` live in the settings store;
//! a key from the environment takes precedence over a saved one.

pub mod paths;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::gemini::DEFAULT_MODEL;
use crate::audio::espeak::DEFAULT_BINARY;
use crate::audio::DEFAULT_CACHE_SIZE;
use crate::domain::AudioService;
use crate::generate::RetryPolicy;
use crate::store::DEFAULT_MAX_HISTORY;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .pagesong/)
    pub home: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationConfig {
    pub backend: Option<TextBackendKind>,
    pub model: Option<String>,
    pub proxy_url: Option<String>,
    pub retry: Option<RetryPolicy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioConfig {
    pub service: Option<AudioService>,
    pub cache_size: Option<usize>,
    pub espeak_binary: Option<String>,
    pub player_command: Option<Vec<String>>,
    pub azure_region: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryConfig {
    pub max_items: Option<usize>,
}

/// Which text backend generates rhymes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextBackendKind {
    Gemini,
    Proxy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiKeys {
    pub gemini: Option<String>,
    pub elevenlabs: Option<String>,
    pub google_tts: Option<String>,
    pub azure: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub backend: TextBackendKind,
    pub model: String,
    pub proxy_url: Option<String>,
    pub retry: RetryPolicy,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            backend: TextBackendKind::Gemini,
            model: DEFAULT_MODEL.to_string(),
            proxy_url: None,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioSettings {
    /// Explicit service; None defers to the saved setting
    pub service: Option<AudioService>,
    pub cache_size: usize,
    pub espeak_binary: String,
    /// External player for clips; `{file}` and `{start}` are substituted
    pub player_command: Vec<String>,
    pub azure_region: Option<String>,
}

pub fn default_player_command() -> Vec<String> {
    ["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet", "-ss", "{start}", "{file}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            service: None,
            cache_size: DEFAULT_CACHE_SIZE,
            espeak_binary: DEFAULT_BINARY.to_string(),
            player_command: default_player_command(),
            azure_region: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySettings {
    pub max_items: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_HISTORY,
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to pagesong home (settings, history, player scratch)
    pub home: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Keys from the environment
    pub api_keys: ApiKeys,
    pub generation: GenerationSettings,
    pub audio: AudioSettings,
    pub history: HistorySettings,
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".pagesong").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge file values, environment and defaults
fn resolve(
    config_file: Option<PathBuf>,
    file: ConfigFile,
    default_home: PathBuf,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let env = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let home = if let Some(env_home) = env("PAGESONG_HOME") {
        PathBuf::from(env_home)
    } else if let (Some(home_path), Some(config_path)) = (&file.paths.home, &config_file) {
        let pagesong_dir = config_path.parent().unwrap_or(Path::new("."));
        resolve_path(pagesong_dir, home_path)
    } else {
        default_home
    };

    let proxy_url = env("PAGESONG_PROXY_URL").or(file.generation.proxy_url);
    let backend = match (file.generation.backend, &proxy_url) {
        (Some(kind), _) => kind,
        (None, Some(_)) => TextBackendKind::Proxy,
        (None, None) => TextBackendKind::Gemini,
    };
    if backend == TextBackendKind::Proxy && proxy_url.is_none() {
        anyhow::bail!("generation.backend is proxy but no proxy_url is configured");
    }

    let generation = GenerationSettings {
        backend,
        model: file.generation.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        proxy_url,
        retry: file.generation.retry.unwrap_or_default(),
    };

    let service = match env("PAGESONG_AUDIO_SERVICE") {
        Some(name) => Some(
            name.parse::<AudioService>()
                .with_context(|| format!("Invalid PAGESONG_AUDIO_SERVICE: {}", name))?,
        ),
        None => file.audio.service,
    };

    let defaults = AudioSettings::default();
    let audio = AudioSettings {
        service,
        cache_size: file.audio.cache_size.unwrap_or(defaults.cache_size),
        espeak_binary: file.audio.espeak_binary.unwrap_or(defaults.espeak_binary),
        player_command: file
            .audio
            .player_command
            .filter(|c| !c.is_empty())
            .unwrap_or(defaults.player_command),
        azure_region: env("AZURE_TTS_REGION").or(file.audio.azure_region),
    };

    let history = HistorySettings {
        max_items: file.history.max_items.unwrap_or(DEFAULT_MAX_HISTORY),
    };

    let api_keys = ApiKeys {
        gemini: env("GEMINI_API_KEY"),
        elevenlabs: env("ELEVENLABS_API_KEY"),
        google_tts: env("GOOGLE_TTS_API_KEY"),
        azure: env("AZURE_TTS_KEY"),
    };

    Ok(ResolvedConfig {
        home,
        config_file,
        api_keys,
        generation,
        audio,
        history,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".pagesong");

    let config_file = find_config_file();
    let file = match &config_file {
        Some(path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    resolve(config_file, file, default_home, |name| std::env::var(name).ok())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Get the pagesong home directory.
pub fn pagesong_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}
