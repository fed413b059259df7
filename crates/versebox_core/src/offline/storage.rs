//! Generation-keyed cache storage backends.
//!
//! # Invariants
//! - Entries live inside exactly one generation.
//! - Deleting a generation deletes all of its entries.

use super::request::AssetResponse;
use super::{CacheError, CacheResult};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Persistent cache keyed by `(generation, key)`.
pub trait CacheStorage {
    /// Creates the generation if missing.
    fn open_generation(&self, generation: &str) -> CacheResult<()>;
    /// Lists existing generation tags in ascending order.
    fn generations(&self) -> CacheResult<Vec<String>>;
    /// Deletes one generation. Returns whether it existed.
    fn delete_generation(&self, generation: &str) -> CacheResult<bool>;
    fn get(&self, generation: &str, key: &str) -> CacheResult<Option<AssetResponse>>;
    /// Stores an entry, creating the generation if needed.
    fn put(&self, generation: &str, key: &str, response: &AssetResponse) -> CacheResult<()>;
    /// Removes one entry. Returns whether it existed.
    fn delete_entry(&self, generation: &str, key: &str) -> CacheResult<bool>;
    /// Lists keys stored in one generation in ascending order.
    fn keys(&self, generation: &str) -> CacheResult<Vec<String>>;
}

type Generations = BTreeMap<String, BTreeMap<String, AssetResponse>>;

/// Process-local cache storage.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    generations: Mutex<Generations>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_generations<T>(&self, apply: impl FnOnce(&mut Generations) -> T) -> CacheResult<T> {
        let mut guard = self
            .generations
            .lock()
            .map_err(|_| CacheError::Storage("memory cache lock poisoned".to_string()))?;
        Ok(apply(&mut guard))
    }
}

impl CacheStorage for MemoryCacheStorage {
    fn open_generation(&self, generation: &str) -> CacheResult<()> {
        self.with_generations(|all| {
            all.entry(generation.to_string()).or_default();
        })
    }

    fn generations(&self) -> CacheResult<Vec<String>> {
        self.with_generations(|all| all.keys().cloned().collect())
    }

    fn delete_generation(&self, generation: &str) -> CacheResult<bool> {
        self.with_generations(|all| all.remove(generation).is_some())
    }

    fn get(&self, generation: &str, key: &str) -> CacheResult<Option<AssetResponse>> {
        self.with_generations(|all| {
            all.get(generation)
                .and_then(|entries| entries.get(key))
                .cloned()
        })
    }

    fn put(&self, generation: &str, key: &str, response: &AssetResponse) -> CacheResult<()> {
        self.with_generations(|all| {
            all.entry(generation.to_string())
                .or_default()
                .insert(key.to_string(), response.clone());
        })
    }

    fn delete_entry(&self, generation: &str, key: &str) -> CacheResult<bool> {
        self.with_generations(|all| {
            all.get_mut(generation)
                .map(|entries| entries.remove(key).is_some())
                .unwrap_or(false)
        })
    }

    fn keys(&self, generation: &str) -> CacheResult<Vec<String>> {
        self.with_generations(|all| {
            all.get(generation)
                .map(|entries| entries.keys().cloned().collect())
                .unwrap_or_default()
        })
    }
}

const CACHE_SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS cache_generations (
    tag TEXT PRIMARY KEY NOT NULL
);
CREATE TABLE IF NOT EXISTS cache_entries (
    generation TEXT NOT NULL REFERENCES cache_generations (tag) ON DELETE CASCADE,
    key TEXT NOT NULL,
    status INTEGER NOT NULL,
    content_type TEXT,
    body BLOB NOT NULL,
    PRIMARY KEY (generation, key)
);
";

/// SQLite-backed cache storage in its own database file.
pub struct SqliteCacheStorage {
    conn: Connection,
}

impl SqliteCacheStorage {
    /// Opens (or creates) a cache database file.
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let conn = Connection::open(path)?;
        Self::bootstrap(conn, "file")
    }

    pub fn open_in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(conn, "memory")
    }

    fn bootstrap(conn: Connection, mode: &'static str) -> CacheResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        // The app and `versebox cache-status` may hold the file at once.
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(CACHE_SCHEMA_SQL)?;
        info!("event=cache_storage_open module=offline status=ok mode={mode}");
        Ok(Self { conn })
    }
}

impl CacheStorage for SqliteCacheStorage {
    fn open_generation(&self, generation: &str) -> CacheResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO cache_generations (tag) VALUES (?1);",
            [generation],
        )?;
        Ok(())
    }

    fn generations(&self) -> CacheResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT tag FROM cache_generations ORDER BY tag ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(row.get(0)?);
        }
        Ok(tags)
    }

    fn delete_generation(&self, generation: &str) -> CacheResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM cache_generations WHERE tag = ?1;",
            [generation],
        )?;
        Ok(changed > 0)
    }

    fn get(&self, generation: &str, key: &str) -> CacheResult<Option<AssetResponse>> {
        let response = self
            .conn
            .query_row(
                "SELECT status, content_type, body
                 FROM cache_entries
                 WHERE generation = ?1 AND key = ?2;",
                params![generation, key],
                |row| {
                    Ok(AssetResponse {
                        status: row.get(0)?,
                        content_type: row.get(1)?,
                        body: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(response)
    }

    fn put(&self, generation: &str, key: &str, response: &AssetResponse) -> CacheResult<()> {
        self.open_generation(generation)?;
        self.conn.execute(
            "INSERT INTO cache_entries (generation, key, status, content_type, body)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (generation, key) DO UPDATE SET
                status = excluded.status,
                content_type = excluded.content_type,
                body = excluded.body;",
            params![
                generation,
                key,
                response.status,
                response.content_type.as_deref(),
                response.body.as_slice()
            ],
        )?;
        Ok(())
    }

    fn delete_entry(&self, generation: &str, key: &str) -> CacheResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM cache_entries WHERE generation = ?1 AND key = ?2;",
            params![generation, key],
        )?;
        Ok(changed > 0)
    }

    fn keys(&self, generation: &str) -> CacheResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT key FROM cache_entries WHERE generation = ?1 ORDER BY key ASC;",
        )?;
        let mut rows = stmt.query([generation])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(row.get(0)?);
        }
        Ok(keys)
    }
}
