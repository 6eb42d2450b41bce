//! Canonical on-disk locations under the pagesong home.

use std::path::PathBuf;

use anyhow::Result;

/// Get the pagesong home directory (~/.pagesong)
pub fn pagesong_home() -> Result<PathBuf> {
    crate::config::pagesong_home()
}

/// Settings and history storage (~/.pagesong/storage.json)
pub fn storage_file() -> Result<PathBuf> {
    Ok(pagesong_home()?.join(STORAGE_FILE))
}

/// Scratch directory for clips handed to the external player
pub fn player_dir() -> Result<PathBuf> {
    Ok(pagesong_home()?.join(PLAYER_DIR))
}

pub const STORAGE_FILE: &str = "storage.json";
pub const PLAYER_DIR: &str = "player";
