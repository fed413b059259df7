//! Record store handle.
//!
//! # Responsibility
//! - Own one migrated SQLite connection per store instance.
//! - Expose the author/piece operation set used by presentation callers.
//! - Provide the multi-kind `clear_all` primitive used by restore.
//!
//! # Invariants
//! - A `Store` only exists for a connection at the latest schema version.
//! - Stores never share state; each handle is an isolated dataset unless
//!   two handles open the same file.

use crate::db::{open_db, open_db_in_memory};
use crate::model::author::{Author, AuthorId, Category};
use crate::model::piece::{NewPiece, Piece, PieceId, PieceUpdate};
use crate::repo::author_repo::{AuthorRepository, SqliteAuthorRepository};
use crate::repo::piece_repo::{PieceRepository, SqlitePieceRepository};
use crate::repo::{ensure_connection_ready, RepoResult};
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;

/// Explicitly constructed record store.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (or creates) a file-backed store.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// Opens an isolated in-memory store.
    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self { conn })
    }

    /// Borrows the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn authors(&self) -> SqliteAuthorRepository<'_> {
        SqliteAuthorRepository::new_unchecked(&self.conn)
    }

    pub fn pieces(&self) -> SqlitePieceRepository<'_> {
        SqlitePieceRepository::new_unchecked(&self.conn)
    }

    pub fn create_author(&self, name: &str, category: Category) -> RepoResult<AuthorId> {
        self.authors().create_author(name, category)
    }

    pub fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>> {
        self.authors().get_author(id)
    }

    pub fn rename_author(&self, id: AuthorId, new_name: &str) -> RepoResult<()> {
        self.authors().rename_author(id, new_name)
    }

    pub fn list_authors_by_category(&self, category: Category) -> RepoResult<Vec<Author>> {
        self.authors().list_authors_by_category(category)
    }

    pub fn create_piece(&self, piece: &NewPiece) -> RepoResult<PieceId> {
        self.pieces().create_piece(piece)
    }

    pub fn get_piece(&self, id: PieceId) -> RepoResult<Option<Piece>> {
        self.pieces().get_piece(id)
    }

    pub fn update_piece(&self, id: PieceId, update: &PieceUpdate) -> RepoResult<()> {
        self.pieces().update_piece(id, update)
    }

    /// Shorthand for an update that only touches `favorite`.
    pub fn set_favorite(&self, id: PieceId, favorite: bool) -> RepoResult<()> {
        let update = PieceUpdate {
            favorite: Some(favorite),
            ..PieceUpdate::default()
        };
        self.pieces().update_piece(id, &update)
    }

    pub fn delete_piece(&self, id: PieceId) -> RepoResult<()> {
        self.pieces().delete_piece(id)?;
        Ok(())
    }

    pub fn list_pieces_by_author(&self, author_id: AuthorId) -> RepoResult<Vec<Piece>> {
        self.pieces().list_pieces_by_author(author_id)
    }

    pub fn count_pieces_by_author(&self, author_id: AuthorId) -> RepoResult<u64> {
        self.pieces().count_pieces_by_author(author_id)
    }

    pub fn list_favorites_by_category(&self, category: Category) -> RepoResult<Vec<Piece>> {
        self.pieces().list_favorites_by_category(category)
    }

    /// All authors in primary-key (creation) order.
    pub fn scan_authors(&self) -> RepoResult<Vec<Author>> {
        self.authors().scan_authors()
    }

    /// All pieces in primary-key (creation) order.
    pub fn scan_pieces(&self) -> RepoResult<Vec<Piece>> {
        self.pieces().scan_pieces()
    }

    /// Empties both record kinds in one transaction.
    pub fn clear_all(&self) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        clear_all_in_tx(&tx)?;
        tx.commit()?;
        info!("event=store_clear module=store status=ok");
        Ok(())
    }
}

/// Deletes every author and piece on an open transaction.
pub(crate) fn clear_all_in_tx(tx: &Transaction<'_>) -> RepoResult<()> {
    tx.execute("DELETE FROM pieces;", [])?;
    tx.execute("DELETE FROM authors;", [])?;
    Ok(())
}
