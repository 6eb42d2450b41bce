//! Persisted key-value state.
//!
//! Everything the user configures or saves goes through a [`Storage`]
//! collaborator: a flat map of JSON values addressed by string keys.
//! [`SettingsStore`] and [`HistoryStore`] add typed access on top.

pub mod history;
pub mod settings;

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::{Error, Result};

pub use history::{HistoryStore, DEFAULT_MAX_HISTORY};
pub use settings::{ApiProvider, Preferences, SettingsStore, Theme};

/// Storage keys
pub mod keys {
    pub const GEMINI_API_KEY: &str = "geminiApiKey";
    pub const ELEVENLABS_API_KEY: &str = "elevenLabsApiKey";
    pub const GOOGLE_TTS_API_KEY: &str = "googleTtsApiKey";
    pub const AZURE_TTS_KEY: &str = "azureTtsKey";
    pub const AZURE_REGION: &str = "azureRegion";
    pub const PREFERENCES: &str = "preferences";
    pub const THEME: &str = "theme";
    pub const AUDIO_SERVICE: &str = "audioService";
    pub const HISTORY: &str = "rhymeHistory";
}

/// Trait for key-value storage backends
#[async_trait]
pub trait Storage: Send + Sync {
    /// Values for the keys that exist
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>>;

    /// Insert or overwrite entries
    async fn set(&self, entries: HashMap<String, Value>) -> Result<()>;

    async fn remove(&self, keys: &[&str]) -> Result<()>;
}

/// Read one typed value; a value that no longer parses is treated as absent.
pub(crate) async fn get_typed<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>> {
    let mut values = storage.get(&[key]).await?;
    let Some(value) = values.remove(key) else {
        return Ok(None);
    };

    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            warn!(key, error = %e, "Ignoring unreadable stored value");
            Ok(None)
        }
    }
}

pub(crate) async fn set_typed<T: Serialize>(storage: &dyn Storage, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value)
        .map_err(|e| Error::Storage(format!("failed to encode {}: {}", key, e)))?;
    storage.set(HashMap::from([(key.to_string(), value)])).await
}

/// In-process storage
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let entries = self.entries.lock().await;
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, entries: HashMap<String, Value>) -> Result<()> {
        self.entries.lock().await.extend(entries);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.entries.lock().await;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// Storage in a single JSON object file.
///
/// Every operation opens the file under an `fs2` lock (shared for reads,
/// exclusive for writes), so several processes can share one file.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(path: &Path, raw: &str) -> Result<Map<String, Value>> {
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(Error::Storage(format!(
                "{} does not contain a JSON object",
                path.display()
            ))),
            Err(e) => Err(Error::Storage(format!(
                "failed to parse {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn read_blocking(path: &Path) -> Result<Map<String, Value>> {
        let mut file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        file.lock_shared()?;
        let mut raw = String::new();
        file.read_to_string(&mut raw)?;
        // Lock is released when file is dropped
        Self::parse(path, &raw)
    }

    fn update_blocking(path: &Path, apply: impl FnOnce(&mut Map<String, Value>)) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        file.lock_exclusive()?;

        let mut raw = String::new();
        file.read_to_string(&mut raw)?;
        let mut map = Self::parse(path, &raw)?;
        apply(&mut map);

        let json = serde_json::to_string_pretty(&Value::Object(map))
            .map_err(|e| Error::Storage(e.to_string()))?;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    async fn run<T: Send + 'static>(
        &self,
        task: impl FnOnce(PathBuf) -> Result<T> + Send + 'static,
    ) -> Result<T> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || task(path))
            .await
            .map_err(|e| Error::Storage(format!("storage task failed: {}", e)))?
    }
}

#[async_trait]
impl Storage for JsonFileStorage {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        self.run(move |path| {
            let mut map = Self::read_blocking(&path)?;
            Ok(keys
                .into_iter()
                .filter_map(|k| map.remove(&k).map(|v| (k, v)))
                .collect())
        })
        .await
    }

    async fn set(&self, entries: HashMap<String, Value>) -> Result<()> {
        self.run(move |path| Self::update_blocking(&path, |map| map.extend(entries)))
            .await
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        self.run(move |path| {
            Self::update_blocking(&path, |map| {
                for key in &keys {
                    map.remove(key);
                }
            })
        })
        .await
    }
}
