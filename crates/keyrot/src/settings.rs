use config::{Config, Environment, File};
use keyrot_keystore::{
    DEFAULT_FRESHNESS, DEFAULT_LENGTH, DEFAULT_MAX_AGE, DEFAULT_MAX_FUTURE, KeyStoreConfig,
};
use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variables starting with `KEYROT__` override file settings.
pub const ENV_PREFIX: &str = "KEYROT";

/// Custom error type for settings loading.
#[keyrot_derive::keyrot_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Deserializable form of the key store setup. Durations are whole seconds.
///
/// Only `dir` is required; every other field falls back to the key store defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub dir: PathBuf,
    #[serde(default = "default_length")]
    pub length: usize,
    #[serde(default = "default_freshness")]
    pub freshness: u64,
    #[serde(default = "default_max_age")]
    pub max_age: u64,
    #[serde(default = "default_max_future")]
    pub max_future: u64,
}

const fn default_length() -> usize {
    DEFAULT_LENGTH
}

const fn default_freshness() -> u64 {
    DEFAULT_FRESHNESS.as_secs()
}

const fn default_max_age() -> u64 {
    DEFAULT_MAX_AGE.as_secs()
}

const fn default_max_future() -> u64 {
    DEFAULT_MAX_FUTURE.as_secs()
}

impl Settings {
    /// Default settings for a key directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            length: default_length(),
            freshness: default_freshness(),
            max_age: default_max_age(),
            max_future: default_max_future(),
        }
    }

    #[must_use]
    pub const fn key_store_config(&self) -> KeyStoreConfig {
        KeyStoreConfig {
            length: self.length,
            freshness: Duration::from_secs(self.freshness),
            max_age: Duration::from_secs(self.max_age),
            max_future: Duration::from_secs(self.max_future),
        }
    }
}

/// Loads [`Settings`] from an optional file overlaid with `KEYROT__*` environment
/// variables (e.g. `KEYROT__FRESHNESS=60`, `KEYROT__DIR=/run/keys`).
///
/// Any format the `config` crate recognizes by extension works (TOML, JSON, YAML, ...).
/// Without a path, only the environment is consulted.
///
/// # Errors
/// Returns [`ConfigError::Config`] if the file is missing or unreadable, or if the
/// merged values do not form valid [`Settings`] (for example, no `dir`).
pub fn load_settings(path: Option<impl AsRef<Path>>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading key store settings");
        builder = builder.add_source(File::from(path).required(true));
    }

    let settings = builder
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
        .build()
        .context("Failed to build settings")?
        .try_deserialize::<Settings>()
        .context("Failed to deserialize settings")?;

    Ok(settings)
}
