//! Author records and the fixed category partition.

use super::ModelValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Store-assigned author identity.
pub type AuthorId = i64;

/// One of the two fixed partitions an author belongs to.
///
/// Assigned at creation and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[serde(alias = "Poems")]
    Poems,
    #[serde(alias = "Quotes")]
    Quotes,
}

impl Category {
    /// Storage and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poems => "poems",
            Self::Quotes => "quotes",
        }
    }

    /// Whether pieces of this category carry a title.
    pub fn has_titles(self) -> bool {
        matches!(self, Self::Poems)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ModelValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "poems" | "poem" => Ok(Self::Poems),
            "quotes" | "quote" => Ok(Self::Quotes),
            other => Err(ModelValidationError::InvalidCategory(other.to_string())),
        }
    }
}

/// Persisted author record.
///
/// Serialized field names match the snapshot document (`createdAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub category: Category,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Normalizes an author name: trims surrounding whitespace and rejects
/// blank input.
pub fn normalize_author_name(name: &str) -> Result<String, ModelValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ModelValidationError::EmptyAuthorName);
    }
    Ok(trimmed.to_string())
}

/// Case- and accent-insensitive name ordering used by category listings.
///
/// Names are compared by their collation fold (see `fold_name`). Names with
/// equal folds compare equal, leaving ties to the caller's stable sort.
pub fn compare_names(left: &str, right: &str) -> std::cmp::Ordering {
    fold_name(left).cmp(&fold_name(right))
}

/// Primary-strength collation key: canonical decomposition with combining
/// marks removed, then lowercased. `"Émile"` folds to `"emile"`.
pub fn fold_name(name: &str) -> String {
    name.nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect::<String>()
        .to_lowercase()
}
