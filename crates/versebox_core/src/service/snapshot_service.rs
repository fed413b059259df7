//! Snapshot export and restore.
//!
//! # Responsibility
//! - Serialize the whole dataset into a portable JSON document.
//! - Replace the whole dataset from such a document.
//!
//! # Invariants
//! - Restore validates the complete document before the first write; a
//!   malformed document leaves the store untouched.
//! - Restore preserves original ids and field values verbatim.
//! - Export reads both record kinds inside one read transaction.
//! - Clear and re-insert commit together: a failed restore rolls back to
//!   the pre-restore dataset.

use crate::model::now_epoch_ms;
use crate::model::snapshot::{format_exported_at, SnapshotDocument, SNAPSHOT_FORMAT_VERSION};
use crate::repo::author_repo::{AuthorRepository, SqliteAuthorRepository};
use crate::repo::piece_repo::{PieceRepository, SqlitePieceRepository};
use crate::repo::RepoError;
use crate::store::{clear_all_in_tx, Store};
use log::{error, info};
use rusqlite::{Transaction, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Errors from snapshot export/restore.
#[derive(Debug)]
pub enum SnapshotError {
    /// Input is not a well-formed snapshot document.
    Malformed(String),
    /// Document declares a format newer than this build understands.
    UnsupportedFormatVersion { found: u32, supported: u32 },
    /// Reading or writing a snapshot file failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Store-level failure.
    Repo(RepoError),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(message) => write!(f, "malformed snapshot: {message}"),
            Self::UnsupportedFormatVersion { found, supported } => write!(
                f,
                "snapshot format version {found} is newer than supported {supported}"
            ),
            Self::Io { path, source } => {
                write!(f, "snapshot file `{}`: {source}", path.display())
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Repo(err) => Some(err),
            Self::Malformed(_) | Self::UnsupportedFormatVersion { .. } => None,
        }
    }
}

impl From<RepoError> for SnapshotError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for SnapshotError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Record counts applied by one restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreSummary {
    pub authors: usize,
    pub pieces: usize,
}

/// Snapshot transfer over one record store.
pub struct SnapshotService<'s> {
    store: &'s Store,
}

impl<'s> SnapshotService<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Captures the current dataset.
    pub fn export_document(&self) -> SnapshotResult<SnapshotDocument> {
        let tx = Transaction::new_unchecked(
            self.store.connection(),
            TransactionBehavior::Deferred,
        )?;
        let authors = SqliteAuthorRepository::new_unchecked(&tx).scan_authors()?;
        let pieces = SqlitePieceRepository::new_unchecked(&tx).scan_pieces()?;
        tx.commit()?;

        Ok(SnapshotDocument {
            format_version: SNAPSHOT_FORMAT_VERSION,
            exported_at: format_exported_at(now_epoch_ms()),
            authors,
            pieces,
        })
    }

    /// Serializes the current dataset into a pretty-printed JSON document.
    pub fn export_snapshot(&self) -> SnapshotResult<String> {
        let document = self.export_document()?;
        let text = serde_json::to_string_pretty(&document)
            .map_err(|err| SnapshotError::Malformed(format!("serialize failed: {err}")))?;
        info!(
            "event=snapshot_export module=snapshot status=ok authors={} pieces={} bytes={}",
            document.authors.len(),
            document.pieces.len(),
            text.len()
        );
        Ok(text)
    }

    /// Replaces the dataset with the contents of `document`.
    pub fn restore_snapshot(&self, document: &str) -> SnapshotResult<RestoreSummary> {
        let parsed = match parse_snapshot(document) {
            Ok(parsed) => parsed,
            Err(err) => {
                error!(
                    "event=snapshot_restore module=snapshot status=error error_code=malformed_snapshot error={}",
                    err
                );
                return Err(err);
            }
        };
        self.restore_document(&parsed)
    }

    /// Replaces the dataset with an already parsed document.
    pub fn restore_document(&self, document: &SnapshotDocument) -> SnapshotResult<RestoreSummary> {
        validate_document(document)?;

        let started_at = Instant::now();
        let tx = Transaction::new_unchecked(
            self.store.connection(),
            TransactionBehavior::Immediate,
        )?;
        clear_all_in_tx(&tx)?;

        let authors = SqliteAuthorRepository::new_unchecked(&tx);
        for author in &document.authors {
            authors.insert_author(author)?;
        }
        let pieces = SqlitePieceRepository::new_unchecked(&tx);
        for piece in &document.pieces {
            pieces.insert_piece(piece)?;
        }
        tx.commit()?;

        info!(
            "event=snapshot_restore module=snapshot status=ok authors={} pieces={} duration_ms={}",
            document.authors.len(),
            document.pieces.len(),
            started_at.elapsed().as_millis()
        );
        Ok(RestoreSummary {
            authors: document.authors.len(),
            pieces: document.pieces.len(),
        })
    }

    /// Exports the dataset into `path`, replacing any existing file.
    pub fn export_snapshot_to_file(&self, path: impl AsRef<Path>) -> SnapshotResult<()> {
        let path = path.as_ref();
        let text = self.export_snapshot()?;
        let io_error = |source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = fs::File::create(path).map_err(io_error)?;
        file.write_all(text.as_bytes()).map_err(io_error)?;
        file.sync_all().map_err(io_error)?;
        Ok(())
    }

    /// Restores the dataset from the snapshot file at `path`.
    pub fn restore_snapshot_from_file(
        &self,
        path: impl AsRef<Path>,
    ) -> SnapshotResult<RestoreSummary> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.restore_snapshot(&text)
    }
}

/// Parses and validates a snapshot document without touching any store.
pub fn parse_snapshot(document: &str) -> SnapshotResult<SnapshotDocument> {
    let parsed: SnapshotDocument =
        serde_json::from_str(document).map_err(|err| SnapshotError::Malformed(err.to_string()))?;
    validate_document(&parsed)?;
    Ok(parsed)
}

fn validate_document(document: &SnapshotDocument) -> SnapshotResult<()> {
    if document.format_version > SNAPSHOT_FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedFormatVersion {
            found: document.format_version,
            supported: SNAPSHOT_FORMAT_VERSION,
        });
    }

    let mut author_ids = HashSet::new();
    for author in &document.authors {
        if !author_ids.insert(author.id) {
            return Err(SnapshotError::Malformed(format!(
                "duplicate author id {}",
                author.id
            )));
        }
        if author.name.trim().is_empty() {
            return Err(SnapshotError::Malformed(format!(
                "author {} has an empty name",
                author.id
            )));
        }
    }

    let mut piece_ids = HashSet::new();
    for piece in &document.pieces {
        if !piece_ids.insert(piece.id) {
            return Err(SnapshotError::Malformed(format!(
                "duplicate piece id {}",
                piece.id
            )));
        }
        if piece.text.trim().is_empty() {
            return Err(SnapshotError::Malformed(format!(
                "piece {} has empty text",
                piece.id
            )));
        }
    }

    Ok(())
}
