//! Offline cache controller for the application's own assets.
//!
//! # Responsibility
//! - Precache a fixed manifest under a generation tag on install.
//! - Drop every other generation on activation.
//! - Answer same-origin `GET`s network-first (code) or cache-first (media).
//!
//! # Invariants
//! - Shares no state with the record store; only `CacheStorage` persists.
//! - Network failures never surface as errors; they fall back to cache, then
//!   to the offline shell for code assets.
//! - Bumping the generation tag is the only invalidation mechanism.

pub mod controller;
pub mod manifest;
pub mod request;
pub mod storage;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub use controller::{CacheController, FetchOutcome, LifecycleState, ServedFrom};
pub use manifest::{CacheManifest, ManifestValidationError};
pub use request::{AssetRequest, AssetResponse, Network, NetworkError, RequestMode};
pub use storage::{CacheStorage, MemoryCacheStorage, SqliteCacheStorage};

pub type CacheResult<T> = Result<T, CacheError>;

/// Cache controller failure.
#[derive(Debug)]
pub enum CacheError {
    /// Manifest failed validation.
    Manifest(ManifestValidationError),
    /// Cache storage backend failed.
    Storage(String),
    /// A manifest asset has neither a live nor a stored copy.
    InstallFailed { asset: String, reason: String },
    /// Origin cannot serve as a base for manifest paths.
    InvalidOrigin(String),
    /// Lifecycle call made from the wrong state.
    InvalidState {
        expected: LifecycleState,
        actual: LifecycleState,
    },
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manifest(err) => write!(f, "{err}"),
            Self::Storage(message) => write!(f, "cache storage error: {message}"),
            Self::InstallFailed { asset, reason } => {
                write!(f, "failed to precache `{asset}`: {reason}")
            }
            Self::InvalidOrigin(message) => write!(f, "invalid cache origin {message}"),
            Self::InvalidState { expected, actual } => write!(
                f,
                "cache controller is {actual:?}, expected {expected:?}"
            ),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Manifest(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ManifestValidationError> for CacheError {
    fn from(value: ManifestValidationError) -> Self {
        Self::Manifest(value)
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value.to_string())
    }
}
