//! Domain model for authors and the pieces they own.
//!
//! # Responsibility
//! - Define canonical record shapes shared by store, snapshot and CLI.
//! - Normalize and validate user input before it reaches persistence.
//!
//! # Invariants
//! - Identities are assigned by the store and never reused.
//! - Timestamps are Unix epoch milliseconds.

pub mod author;
pub mod piece;
pub mod snapshot;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Returns the current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Input rejected before any write is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Author name is empty after trimming.
    EmptyAuthorName,
    /// Piece text is empty after trimming.
    EmptyPieceText,
    /// Category string is neither `poems` nor `quotes`.
    InvalidCategory(String),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyAuthorName => write!(f, "author name cannot be empty"),
            Self::EmptyPieceText => write!(f, "piece text cannot be empty"),
            Self::InvalidCategory(value) => {
                write!(f, "unknown category `{value}`; expected poems|quotes")
            }
        }
    }
}

impl Error for ModelValidationError {}
