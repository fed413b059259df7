//! Author repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Point lookup, rename, category listing and full scan over `authors`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Category listings are sorted case-insensitively by name; equal names
//!   keep insertion order.
//! - `rename_author` never changes `category` or `created_at`.

use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::author::{compare_names, normalize_author_name, Author, AuthorId, Category};
use crate::model::now_epoch_ms;
use rusqlite::{params, Connection, OptionalExtension, Row};

const AUTHOR_SELECT_SQL: &str = "SELECT id, name, category, created_at FROM authors";

/// Repository interface for author operations.
pub trait AuthorRepository {
    /// Creates one author and returns the store-assigned id.
    fn create_author(&self, name: &str, category: Category) -> RepoResult<AuthorId>;
    /// Inserts an author with its existing id (snapshot restore path).
    fn insert_author(&self, author: &Author) -> RepoResult<()>;
    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>>;
    /// Replaces the name; silently does nothing when `id` is absent.
    fn rename_author(&self, id: AuthorId, new_name: &str) -> RepoResult<()>;
    /// Lists one category sorted by case-insensitive name.
    fn list_authors_by_category(&self, category: Category) -> RepoResult<Vec<Author>>;
    /// Removes one author row. Returns whether a row existed.
    ///
    /// Owned pieces are untouched; see `IntegrityService::delete_author_cascade`.
    fn delete_author(&self, id: AuthorId) -> RepoResult<bool>;
    /// Full scan in primary-key order.
    fn scan_authors(&self) -> RepoResult<Vec<Author>>;
}

/// SQLite-backed author repository.
pub struct SqliteAuthorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuthorRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection already checked by the caller.
    pub(crate) fn new_unchecked(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AuthorRepository for SqliteAuthorRepository<'_> {
    fn create_author(&self, name: &str, category: Category) -> RepoResult<AuthorId> {
        let name = normalize_author_name(name)?;
        self.conn.execute(
            "INSERT INTO authors (name, category, created_at) VALUES (?1, ?2, ?3);",
            params![name, category.as_str(), now_epoch_ms()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_author(&self, author: &Author) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO authors (id, name, category, created_at) VALUES (?1, ?2, ?3, ?4);",
            params![
                author.id,
                author.name.as_str(),
                author.category.as_str(),
                author.created_at
            ],
        )?;
        Ok(())
    }

    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>> {
        let row = self
            .conn
            .query_row(
                &format!("{AUTHOR_SELECT_SQL} WHERE id = ?1;"),
                [id],
                read_author_columns,
            )
            .optional()?;
        row.map(into_author).transpose()
    }

    fn rename_author(&self, id: AuthorId, new_name: &str) -> RepoResult<()> {
        let name = normalize_author_name(new_name)?;
        self.conn.execute(
            "UPDATE authors SET name = ?2 WHERE id = ?1;",
            params![id, name],
        )?;
        Ok(())
    }

    fn list_authors_by_category(&self, category: Category) -> RepoResult<Vec<Author>> {
        let mut stmt = self.conn.prepare(&format!(
            "{AUTHOR_SELECT_SQL} WHERE category = ?1 ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([category.as_str()])?;
        let mut authors = Vec::new();
        while let Some(row) = rows.next()? {
            authors.push(into_author(read_author_columns(row)?)?);
        }

        authors.sort_by(|left, right| compare_names(&left.name, &right.name));
        Ok(authors)
    }

    fn delete_author(&self, id: AuthorId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM authors WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn scan_authors(&self) -> RepoResult<Vec<Author>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{AUTHOR_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut authors = Vec::new();
        while let Some(row) = rows.next()? {
            authors.push(into_author(read_author_columns(row)?)?);
        }
        Ok(authors)
    }
}

type AuthorColumns = (AuthorId, String, String, i64);

fn read_author_columns(row: &Row<'_>) -> rusqlite::Result<AuthorColumns> {
    Ok((
        row.get("id")?,
        row.get("name")?,
        row.get("category")?,
        row.get("created_at")?,
    ))
}

fn into_author((id, name, category_text, created_at): AuthorColumns) -> RepoResult<Author> {
    let category = parse_category(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in authors.category for id {id}"
        ))
    })?;
    Ok(Author {
        id,
        name,
        category,
        created_at,
    })
}

pub(crate) fn parse_category(value: &str) -> Option<Category> {
    match value {
        "poems" => Some(Category::Poems),
        "quotes" => Some(Category::Quotes),
        _ => None,
    }
}
