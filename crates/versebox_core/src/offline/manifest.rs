//! Precache manifest declaration and validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Entry document served when offline.
pub const DEFAULT_SHELL: &str = "index.html";

/// Fixed list of assets bound to one cache generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheManifest {
    /// Generation tag, e.g. `versebox-v3`.
    pub generation: String,
    /// Relative asset paths precached on install.
    pub assets: Vec<String>,
    /// Entry document; must also appear in `assets`.
    #[serde(default = "default_shell")]
    pub shell: String,
}

fn default_shell() -> String {
    DEFAULT_SHELL.to_string()
}

impl CacheManifest {
    pub fn new(generation: impl Into<String>, assets: Vec<String>) -> Self {
        Self {
            generation: generation.into(),
            assets,
            shell: default_shell(),
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Parses a JSON manifest and validates it.
    pub fn from_json(text: &str) -> Result<Self, ManifestValidationError> {
        let manifest: Self = serde_json::from_str(text)
            .map_err(|err| ManifestValidationError::Unparsable(err.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validates declaration-level manifest invariants.
    pub fn validate(&self) -> Result<(), ManifestValidationError> {
        if self.generation.trim().is_empty() {
            return Err(ManifestValidationError::EmptyGeneration);
        }
        if self.assets.is_empty() {
            return Err(ManifestValidationError::MissingAssets);
        }

        let mut keys = BTreeSet::new();
        for asset in &self.assets {
            if !is_relative_path(asset) {
                return Err(ManifestValidationError::NonRelativeAsset(asset.clone()));
            }
            if !keys.insert(asset_key(asset)) {
                return Err(ManifestValidationError::DuplicateAsset(asset.clone()));
            }
        }

        if !is_relative_path(&self.shell) || !keys.contains(&asset_key(&self.shell)) {
            return Err(ManifestValidationError::ShellNotPrecached(self.shell.clone()));
        }
        Ok(())
    }
}

/// Normalizes a manifest path for duplicate detection.
///
/// `"./app.js"` and `"app.js"` both map to `"/app.js"`; `"./"` maps to `"/"`.
pub fn asset_key(path: &str) -> String {
    let trimmed = path.trim();
    let without_dot = trimmed.strip_prefix("./").unwrap_or(trimmed);
    let without_slash = without_dot.trim_start_matches('/');
    format!("/{without_slash}")
}

fn is_relative_path(path: &str) -> bool {
    let trimmed = path.trim();
    !trimmed.is_empty()
        && !trimmed.starts_with('/')
        && !trimmed.contains("://")
        && !trimmed.split('/').any(|segment| segment == "..")
}

/// Manifest validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestValidationError {
    Unparsable(String),
    EmptyGeneration,
    MissingAssets,
    NonRelativeAsset(String),
    DuplicateAsset(String),
    ShellNotPrecached(String),
}

impl Display for ManifestValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unparsable(message) => write!(f, "cache manifest is not valid JSON: {message}"),
            Self::EmptyGeneration => write!(f, "cache manifest generation tag is empty"),
            Self::MissingAssets => write!(f, "cache manifest declares no assets"),
            Self::NonRelativeAsset(value) => {
                write!(f, "cache manifest asset is not a relative path: `{value}`")
            }
            Self::DuplicateAsset(value) => {
                write!(f, "cache manifest asset declared twice: `{value}`")
            }
            Self::ShellNotPrecached(value) => {
                write!(f, "offline shell `{value}` is not in the asset list")
            }
        }
    }
}

impl Error for ManifestValidationError {}

#[cfg(test)]
mod tests {
    use super::{asset_key, CacheManifest, ManifestValidationError};

    fn assets(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|path| path.to_string()).collect()
    }

    #[test]
    fn asset_key_normalizes_prefixes() {
        assert_eq!(asset_key("./app.js"), "/app.js");
        assert_eq!(asset_key("app.js"), "/app.js");
        assert_eq!(asset_key("icons/a.png"), "/icons/a.png");
        assert_eq!(asset_key("./"), "/");
    }

    #[test]
    fn validate_rejects_duplicates_after_normalization() {
        let manifest = CacheManifest::new("v1", assets(&["index.html", "./index.html"]));
        assert_eq!(
            manifest.validate(),
            Err(ManifestValidationError::DuplicateAsset(
                "./index.html".to_string()
            ))
        );
    }

    #[test]
    fn validate_rejects_absolute_urls_and_missing_shell() {
        let remote = CacheManifest::new("v1", assets(&["index.html", "https://cdn.example/x.js"]));
        assert!(matches!(
            remote.validate(),
            Err(ManifestValidationError::NonRelativeAsset(_))
        ));

        let rooted = CacheManifest::new("v1", assets(&["index.html", "/app.js"]));
        assert!(matches!(
            rooted.validate(),
            Err(ManifestValidationError::NonRelativeAsset(_))
        ));

        let no_shell = CacheManifest::new("v1", assets(&["app.js"]));
        assert!(matches!(
            no_shell.validate(),
            Err(ManifestValidationError::ShellNotPrecached(_))
        ));
    }

    #[test]
    fn from_json_defaults_shell() {
        let manifest =
            CacheManifest::from_json(r#"{"generation": "v2", "assets": ["index.html", "app.css"]}"#)
                .unwrap();
        assert_eq!(manifest.shell, "index.html");
        assert_eq!(manifest.generation, "v2");
    }
}
