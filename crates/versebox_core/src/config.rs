//! Application configuration.
//!
//! # Responsibility
//! - Load an optional JSON config file with per-field defaults.
//! - Derive the cache manifest and origin for the offline controller.
//!
//! # Invariants
//! - A missing config file yields `AppConfig::default()`.
//! - Every field may be omitted from the file.

use crate::logging::default_log_level;
use crate::offline::manifest::{CacheManifest, DEFAULT_SHELL};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use url::Url;

const DEFAULT_DB_FILE_NAME: &str = "versebox.sqlite3";
const DEFAULT_CACHE_DB_FILE_NAME: &str = "versebox-cache.sqlite3";
const DEFAULT_GENERATION: &str = "versebox-v1";
const DEFAULT_ORIGIN: &str = "http://localhost/";
const DEFAULT_ASSETS: &[&str] = &[
    "./",
    "index.html",
    "style.css",
    "app.js",
    "manifest.webmanifest",
    "icons/icon-192.png",
    "icons/icon-512.png",
];

/// Configuration load failure.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        message: String,
    },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "failed to parse config `{}`: {message}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Record store database file.
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute log directory; file logging is off when unset.
    pub log_dir: Option<PathBuf>,
    pub cache: CacheConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            cache: CacheConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::from_json(&text).map_err(|err| match err {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parses and validates a JSON config document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|err| ConfigError::Parse {
            path: PathBuf::new(),
            message: err.to_string(),
        })?;
        config.cache.origin_url()?;
        config
            .cache
            .manifest()
            .validate()
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        Ok(config)
    }
}

/// Offline cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Generation tag; bump it whenever any asset changes.
    pub generation: String,
    /// Origin (and scope root) the controller serves.
    pub origin: String,
    pub shell: String,
    pub assets: Vec<String>,
    /// Cache storage database file.
    pub db_path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            generation: DEFAULT_GENERATION.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            shell: DEFAULT_SHELL.to_string(),
            assets: DEFAULT_ASSETS.iter().map(|asset| asset.to_string()).collect(),
            db_path: PathBuf::from(DEFAULT_CACHE_DB_FILE_NAME),
        }
    }
}

impl CacheConfig {
    pub fn manifest(&self) -> CacheManifest {
        CacheManifest::new(self.generation.clone(), self.assets.clone())
            .with_shell(self.shell.clone())
    }

    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|err| ConfigError::Invalid(format!("cache origin `{}`: {err}", self.origin)))?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::Invalid(format!(
                "cache origin `{}` cannot resolve relative paths",
                self.origin
            )));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError};

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config =
            AppConfig::from_json(r#"{"db_path": "/tmp/v.db", "cache": {"generation": "v9"}}"#)
                .unwrap();
        assert_eq!(config.db_path.to_str(), Some("/tmp/v.db"));
        assert_eq!(config.cache.generation, "v9");
        assert_eq!(config.cache.shell, "index.html");
        assert!(config.cache.manifest().validate().is_ok());
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let err = AppConfig::from_json(r#"{"cache": {"origin": "not a url"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn parse_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("config.json"));
    }
}
