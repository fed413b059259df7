//! Piece repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - CRUD, per-author listing and full scan over `pieces`.
//! - Creation-time ownership check against `authors`.
//!
//! # Invariants
//! - Author listings are newest-first by `created_at`; equal timestamps put
//!   the later insertion first.
//! - Stored text is trimmed and non-empty; stored titles are trimmed and
//!   present only for poem authors.

use super::author_repo::parse_category;
use super::{bool_to_int, ensure_connection_ready, RepoError, RepoResult};
use crate::model::author::{AuthorId, Category};
use crate::model::now_epoch_ms;
use crate::model::piece::{
    normalize_piece_text, normalize_title, NewPiece, Piece, PieceId, PieceUpdate,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PIECE_SELECT_SQL: &str =
    "SELECT id, author_id, title, text, favorite, created_at FROM pieces";

/// Repository interface for piece operations.
pub trait PieceRepository {
    /// Creates one piece for an existing author.
    ///
    /// # Errors
    /// - `RepoError::AuthorNotFound` when `author_id` names no author.
    /// - `RepoError::Validation` when text is blank.
    fn create_piece(&self, piece: &NewPiece) -> RepoResult<PieceId>;
    /// Inserts a piece with its existing id and owner, unchecked
    /// (snapshot restore path).
    fn insert_piece(&self, piece: &Piece) -> RepoResult<()>;
    fn get_piece(&self, id: PieceId) -> RepoResult<Option<Piece>>;
    /// Applies a partial update; silently does nothing when `id` is absent.
    fn update_piece(&self, id: PieceId, update: &PieceUpdate) -> RepoResult<()>;
    /// Removes one piece. Returns whether a row existed.
    fn delete_piece(&self, id: PieceId) -> RepoResult<bool>;
    /// Lists one author's pieces, newest first.
    fn list_pieces_by_author(&self, author_id: AuthorId) -> RepoResult<Vec<Piece>>;
    fn count_pieces_by_author(&self, author_id: AuthorId) -> RepoResult<u64>;
    /// Lists favorite pieces whose owner is in `category`, newest first.
    fn list_favorites_by_category(&self, category: Category) -> RepoResult<Vec<Piece>>;
    /// Lists pieces whose owner no longer exists, in primary-key order.
    fn list_orphan_pieces(&self) -> RepoResult<Vec<Piece>>;
    /// Full scan in primary-key order.
    fn scan_pieces(&self) -> RepoResult<Vec<Piece>>;
}

/// SQLite-backed piece repository.
pub struct SqlitePieceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePieceRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn new_unchecked(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn owner_category(&self, author_id: AuthorId) -> RepoResult<Option<Category>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT category FROM authors WHERE id = ?1;",
                [author_id],
                |row| row.get(0),
            )
            .optional()?;
        match value {
            Some(text) => parse_category(&text).map(Some).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid category `{text}` in authors.category for id {author_id}"
                ))
            }),
            None => Ok(None),
        }
    }

    fn collect(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Piece>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut pieces = Vec::new();
        while let Some(row) = rows.next()? {
            pieces.push(parse_piece_row(row)?);
        }
        Ok(pieces)
    }
}

impl PieceRepository for SqlitePieceRepository<'_> {
    fn create_piece(&self, piece: &NewPiece) -> RepoResult<PieceId> {
        let text = normalize_piece_text(&piece.text)?;
        let category = self
            .owner_category(piece.author_id)?
            .ok_or(RepoError::AuthorNotFound(piece.author_id))?;
        let title = normalize_title(piece.title.as_deref(), category);

        self.conn.execute(
            "INSERT INTO pieces (author_id, title, text, favorite, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                piece.author_id,
                title,
                text,
                bool_to_int(piece.favorite),
                now_epoch_ms()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_piece(&self, piece: &Piece) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO pieces (id, author_id, title, text, favorite, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                piece.id,
                piece.author_id,
                piece.title.as_deref(),
                piece.text.as_str(),
                bool_to_int(piece.favorite),
                piece.created_at
            ],
        )?;
        Ok(())
    }

    fn get_piece(&self, id: PieceId) -> RepoResult<Option<Piece>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PIECE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_piece_row(row)?));
        }
        Ok(None)
    }

    fn update_piece(&self, id: PieceId, update: &PieceUpdate) -> RepoResult<()> {
        if update.is_empty() {
            return Ok(());
        }
        let Some(current) = self.get_piece(id)? else {
            return Ok(());
        };

        let text = match update.text.as_deref() {
            Some(value) => normalize_piece_text(value)?,
            None => current.text,
        };
        let title = match &update.title {
            Some(value) => {
                // Orphaned pieces keep poem semantics so the title survives.
                let category = self
                    .owner_category(current.author_id)?
                    .unwrap_or(Category::Poems);
                normalize_title(value.as_deref(), category)
            }
            None => current.title,
        };
        let favorite = update.favorite.unwrap_or(current.favorite);

        self.conn.execute(
            "UPDATE pieces SET title = ?2, text = ?3, favorite = ?4 WHERE id = ?1;",
            params![id, title, text, bool_to_int(favorite)],
        )?;
        Ok(())
    }

    fn delete_piece(&self, id: PieceId) -> RepoResult<bool> {
        let changed = self.conn.execute("DELETE FROM pieces WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn list_pieces_by_author(&self, author_id: AuthorId) -> RepoResult<Vec<Piece>> {
        let mut pieces = self.collect(
            &format!("{PIECE_SELECT_SQL} WHERE author_id = ?1;"),
            [author_id],
        )?;
        sort_newest_first(&mut pieces);
        Ok(pieces)
    }

    fn count_pieces_by_author(&self, author_id: AuthorId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pieces WHERE author_id = ?1;",
            [author_id],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative piece count {count}")))
    }

    fn list_favorites_by_category(&self, category: Category) -> RepoResult<Vec<Piece>> {
        let mut pieces = self.collect(
            "SELECT p.id, p.author_id, p.title, p.text, p.favorite, p.created_at
             FROM pieces p
             INNER JOIN authors a ON a.id = p.author_id
             WHERE a.category = ?1
               AND p.favorite = 1;",
            [category.as_str()],
        )?;
        sort_newest_first(&mut pieces);
        Ok(pieces)
    }

    fn list_orphan_pieces(&self) -> RepoResult<Vec<Piece>> {
        self.collect(
            &format!(
                "{PIECE_SELECT_SQL}
                 WHERE NOT EXISTS (SELECT 1 FROM authors a WHERE a.id = pieces.author_id)
                 ORDER BY id ASC;"
            ),
            [],
        )
    }

    fn scan_pieces(&self) -> RepoResult<Vec<Piece>> {
        self.collect(&format!("{PIECE_SELECT_SQL} ORDER BY id ASC;"), [])
    }
}

fn sort_newest_first(pieces: &mut [Piece]) {
    pieces.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| right.id.cmp(&left.id))
    });
}

fn parse_piece_row(row: &Row<'_>) -> RepoResult<Piece> {
    let id: PieceId = row.get("id")?;
    let favorite = match row.get::<_, i64>("favorite")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid favorite value `{other}` in pieces.favorite for id {id}"
            )));
        }
    };

    Ok(Piece {
        id,
        author_id: row.get("author_id")?,
        title: row.get("title")?,
        text: row.get("text")?,
        favorite,
        created_at: row.get("created_at")?,
    })
}
