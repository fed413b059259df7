//! Author/piece ownership enforcement at deletion time.
//!
//! # Responsibility
//! - Cascade author deletion to every owned piece.
//! - Find and purge pieces whose owner no longer exists.
//!
//! # Invariants
//! - After `delete_author_cascade(id)` neither the author nor any piece
//!   owned by it remains.
//! - The cascade runs in one IMMEDIATE transaction: it applies completely
//!   or not at all, and re-running it on a deleted author is a no-op.

use crate::model::author::AuthorId;
use crate::model::piece::{Piece, PieceId};
use crate::repo::author_repo::{AuthorRepository, SqliteAuthorRepository};
use crate::repo::piece_repo::{PieceRepository, SqlitePieceRepository};
use crate::repo::RepoResult;
use crate::store::Store;
use log::info;
use rusqlite::{Transaction, TransactionBehavior};
use std::time::Instant;

/// Result of one cascade run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeOutcome {
    /// Whether the author row existed and was removed.
    pub author_removed: bool,
    /// Number of owned pieces removed.
    pub pieces_removed: usize,
}

/// Integrity service over one record store.
pub struct IntegrityService<'s> {
    store: &'s Store,
}

impl<'s> IntegrityService<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Deletes an author together with all pieces it owns.
    ///
    /// Steps: list owned pieces, delete each, delete the author. An absent
    /// author with no pieces yields an all-zero outcome.
    pub fn delete_author_cascade(&self, author_id: AuthorId) -> RepoResult<CascadeOutcome> {
        let started_at = Instant::now();
        let tx = Transaction::new_unchecked(
            self.store.connection(),
            TransactionBehavior::Immediate,
        )?;
        let pieces = SqlitePieceRepository::new_unchecked(&tx);
        let authors = SqliteAuthorRepository::new_unchecked(&tx);

        let owned = pieces.list_pieces_by_author(author_id)?;
        let mut pieces_removed = 0;
        for piece in &owned {
            if pieces.delete_piece(piece.id)? {
                pieces_removed += 1;
            }
        }
        let author_removed = authors.delete_author(author_id)?;
        tx.commit()?;

        info!(
            "event=author_cascade module=integrity status=ok author_id={} author_removed={} pieces_removed={} duration_ms={}",
            author_id,
            author_removed,
            pieces_removed,
            started_at.elapsed().as_millis()
        );
        Ok(CascadeOutcome {
            author_removed,
            pieces_removed,
        })
    }

    /// Lists pieces whose `author_id` names no existing author.
    pub fn find_orphan_pieces(&self) -> RepoResult<Vec<Piece>> {
        self.store.pieces().list_orphan_pieces()
    }

    /// Deletes every orphaned piece and returns the removed ids.
    pub fn purge_orphan_pieces(&self) -> RepoResult<Vec<PieceId>> {
        let tx = Transaction::new_unchecked(
            self.store.connection(),
            TransactionBehavior::Immediate,
        )?;
        let pieces = SqlitePieceRepository::new_unchecked(&tx);
        let mut removed = Vec::new();
        for orphan in pieces.list_orphan_pieces()? {
            if pieces.delete_piece(orphan.id)? {
                removed.push(orphan.id);
            }
        }
        tx.commit()?;

        info!(
            "event=orphan_purge module=integrity status=ok pieces_removed={}",
            removed.len()
        );
        Ok(removed)
    }
}
