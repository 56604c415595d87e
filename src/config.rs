use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// Top-level configuration structure loaded from `config.json`.
//
// It defines:
// - Where collected records are stored
// - Where institution feeds are fetched from
// - Optional debug configuration
//
// Every section may be omitted; missing sections fall back to
// their defaults.
//
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub source: SourceConfig,

    /// Optional debug configuration
    pub debug: Option<DebugConfig>,
}

impl Config {
    /// Whether debug-level logging was requested in the config file.
    pub fn debug_log(&self) -> bool {
        self.debug.as_ref().is_some_and(|d| d.log.unwrap_or(false))
    }
}

// ------------------------------------------------------------
// Store configuration
// ------------------------------------------------------------
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// JSON file holding every collected record
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("montanha.json"),
        }
    }
}

// ------------------------------------------------------------
// Source configuration
// ------------------------------------------------------------
//
// Feeds are requested as:
//     {base_url}/{siglum in lower case}/{feed}.json
//
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/feeds".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ------------------------------------------------------------
// Debug configuration
// ------------------------------------------------------------
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    /// Enables debug-level logging
    pub log: Option<bool>,
}

/// Reads a JSON configuration file from disk.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg = serde_json::from_str(&data)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

/// An explicit config path must exist; `default` is optional and
/// missing means built-in defaults.
pub fn resolve_config(explicit: Option<&Path>, default: &Path) -> anyhow::Result<Config> {
    match explicit {
        Some(path) => load_config(path),
        None if default.exists() => load_config(default),
        None => Ok(Config::default()),
    }
}
