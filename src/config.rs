//! Host configuration: poll cadence, fingerprint window and named pattern
//! expressions.
//!
//! Stored as JSON at `~/.config/logsieve/config.json`. A missing file means
//! defaults; a present-but-broken file is an error the host should show.

use crate::pattern::PatternTree;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Poll cadence used when neither config nor CLI overrides it.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Largest accepted fingerprint window. Beyond this the "cheap checksum"
/// premise stops holding.
const MAX_FINGERPRINT_WINDOW: u64 = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Milliseconds between polls of the monitored file.
    pub poll_interval_ms: u64,
    /// Leading bytes covered by the replacement-detection checksum.
    pub fingerprint_window: u64,
    /// Named pattern expressions, e.g. `"noise": "!(heartbeat)"`.
    pub patterns: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            fingerprint_window: crate::tail::FINGERPRINT_WINDOW,
            patterns: BTreeMap::new(),
        }
    }
}

/// Error loading or validating a config file.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading the config file.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// JSON parse error.
    Parse { path: PathBuf, message: String },
    /// Semantic error after parsing.
    Validation { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read config file {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, message } => {
                write!(f, "invalid config file {}: {}", path.display(), message)
            }
            ConfigError::Validation { path, message } => {
                write!(f, "config error in {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Default config file path: `~/.config/logsieve/config.json`.
///
/// Always under `~/.config/` regardless of platform; for a CLI tool that is
/// where people look.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("logsieve").join("config.json"))
}

/// Load and validate a config file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = serde_json::from_str(&raw).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    config.validate(path)?;
    Ok(config)
}

/// Load the default config file; a missing file yields defaults.
pub fn load_default() -> Result<Config, ConfigError> {
    match config_path() {
        Some(path) if path.exists() => load(&path),
        _ => Ok(Config::default()),
    }
}

impl Config {
    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let fail = |message: String| {
            Err(ConfigError::Validation {
                path: path.to_path_buf(),
                message,
            })
        };
        if self.poll_interval_ms == 0 {
            return fail("poll_interval_ms must be greater than zero".to_string());
        }
        if self.fingerprint_window == 0 || self.fingerprint_window > MAX_FINGERPRINT_WINDOW {
            return fail(format!(
                "fingerprint_window must be between 1 and {}",
                MAX_FINGERPRINT_WINDOW
            ));
        }
        for (name, expr) in &self.patterns {
            if let Err(err) = PatternTree::from_expression(expr) {
                return fail(format!("pattern '{}': {}", name, err));
            }
        }
        Ok(())
    }
}
