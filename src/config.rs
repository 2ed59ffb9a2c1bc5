//! Configuration file support.
//!
//! Loads settings from TOML; every field has a default so an absent or
//! partial file is fine.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_META_FILE: &str = "db_meta.json";
pub const DEFAULT_PROMPT: &str = "recstore> ";
pub const LOCAL_CONFIG_FILE: &str = "recstore.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Directory holding one `<table>.json` per table.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// The table registry document.
    #[serde(default = "default_meta_file")]
    pub meta_file: PathBuf,

    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Ask before `drop_table` and `delete`.
    #[serde(default)]
    pub confirm_destructive: bool,

    /// Report how long each command took.
    #[serde(default)]
    pub timing: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_meta_file() -> PathBuf {
    PathBuf::from(DEFAULT_META_FILE)
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            meta_file: default_meta_file(),
            prompt: default_prompt(),
            confirm_destructive: false,
            timing: false,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Looks in the following locations:
    /// 1. `./recstore.toml`
    /// 2. `<config dir>/recstore/config.toml`
    /// 3. Returns default if not found
    pub fn load_default() -> Result<Self> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(&local);
        }

        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("recstore").join("config.toml"))
    }
}
