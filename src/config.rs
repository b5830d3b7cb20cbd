//! Application configuration management.
//!
//! This module loads optional settings from `config.json` in the platform
//! configuration folder. A missing or unreadable file means defaults.
//!
//! ```json
//! {"output_dir": "/home/me/reports", "checkpoint_interval": 1000}
//! ```

use anyhow::Result;
use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::scanner::{expand_home, DEFAULT_CHUNK_SIZE};

/// Name of the cache file kept in the home folder.
pub const CACHE_FILE_NAME: &str = "listdupes_cache";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder that receives output, logs and archives (default: home).
    pub output_dir: Option<PathBuf>,
    /// Location of the resume cache (default: `~/listdupes_cache`).
    pub cache_path: Option<PathBuf>,
    /// Bytes read per chunk while checksumming.
    pub chunk_size: usize,
    /// Also persist progress every this many files when resuming an archive.
    pub checkpoint_interval: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: None,
            cache_path: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            checkpoint_interval: None,
        }
    }
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    pub fn load() -> Self {
        match Self::config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load the configuration from `path`, or defaults if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but can't be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Folder for output files, and its name as shown in messages.
    ///
    /// # Errors
    ///
    /// Returns an error if no folder is configured and the home folder
    /// can't be determined.
    pub fn output_dir(&self) -> Result<(PathBuf, &'static str)> {
        match &self.output_dir {
            Some(dir) => Ok((expand_home(dir), "output folder")),
            None => Ok((home_dir()?, "home folder")),
        }
    }

    /// Location of the resume cache.
    ///
    /// # Errors
    ///
    /// Returns an error if no path is configured and the home folder
    /// can't be determined.
    pub fn cache_path(&self) -> Result<PathBuf> {
        match &self.cache_path {
            Some(path) => Ok(expand_home(path)),
            None => Ok(home_dir()?.join(CACHE_FILE_NAME)),
        }
    }

    /// Get the default platform-specific configuration path.
    fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "listdupes", "listdupes")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.json"))
    }
}

fn home_dir() -> Result<PathBuf> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("Failed to determine the home folder"))
}
