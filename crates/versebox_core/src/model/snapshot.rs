//! Portable snapshot document.
//!
//! Wire shape (JSON):
//!
//! ```text
//! { "formatVersion": 1, "exportedAt": "2024-05-01T10:00:00.000Z",
//!   "authors": [ { "id", "name", "category", "createdAt" } ],
//!   "pieces":  [ { "id", "authorId", "title", "text", "favorite", "createdAt" } ] }
//! ```

use super::author::Author;
use super::piece::Piece;
use serde::{Deserialize, Deserializer, Serialize};

/// Snapshot format produced by this build.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Complete dataset copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    /// ISO-8601 UTC timestamp. Informational only on restore.
    #[serde(default)]
    pub exported_at: String,
    /// Missing or `null` reads as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub authors: Vec<Author>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub pieces: Vec<Piece>,
}

fn default_format_version() -> u32 {
    SNAPSHOT_FORMAT_VERSION
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Formats epoch milliseconds as ISO-8601 UTC with millisecond precision.
pub fn format_exported_at(epoch_ms: i64) -> String {
    match chrono::DateTime::<chrono::Utc>::from_timestamp_millis(epoch_ms) {
        Some(value) => value.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        None => String::new(),
    }
}
