//! Piece records: poems and quotes owned by one author.

use super::author::{AuthorId, Category};
use super::ModelValidationError;
use serde::{Deserialize, Serialize};

/// Store-assigned piece identity.
pub type PieceId = i64;

/// Persisted piece record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Piece {
    pub id: PieceId,
    /// Owning author. Validated only when the piece is created.
    pub author_id: AuthorId,
    /// Meaningful only when the owner is in `Category::Poems`.
    #[serde(default)]
    pub title: Option<String>,
    pub text: String,
    #[serde(default)]
    pub favorite: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Input for creating one piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPiece {
    pub author_id: AuthorId,
    pub title: Option<String>,
    pub text: String,
    pub favorite: bool,
}

impl NewPiece {
    /// Creates a non-favorite, untitled piece draft.
    pub fn new(author_id: AuthorId, text: impl Into<String>) -> Self {
        Self {
            author_id,
            title: None,
            text: text.into(),
            favorite: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }
}

/// Partial update; `None` fields are left unchanged.
///
/// `title: Some(None)` clears the title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PieceUpdate {
    pub title: Option<Option<String>>,
    pub text: Option<String>,
    pub favorite: Option<bool>,
}

impl PieceUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.text.is_none() && self.favorite.is_none()
    }
}

/// Trims piece text and rejects blank input.
pub fn normalize_piece_text(text: &str) -> Result<String, ModelValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ModelValidationError::EmptyPieceText);
    }
    Ok(trimmed.to_string())
}

/// Trims a title and drops it when blank or when the owner category has
/// no titles.
pub fn normalize_title(title: Option<&str>, category: Category) -> Option<String> {
    if !category.has_titles() {
        return None;
    }
    title
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
