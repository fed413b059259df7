//! Core library for VerseBox, a local-first collection of poems and quotes.
//!
//! Components:
//! - record store (`store`, `repo`, `db`): authors and pieces over SQLite;
//! - integrity service: cascading author deletion;
//! - snapshot service: portable export/restore of the whole dataset;
//! - offline cache controller (`offline`): precached application assets.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod offline;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{AppConfig, CacheConfig, ConfigError};
pub use db::{DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::author::{Author, AuthorId, Category};
pub use model::piece::{NewPiece, Piece, PieceId, PieceUpdate};
pub use model::snapshot::{SnapshotDocument, SNAPSHOT_FORMAT_VERSION};
pub use model::ModelValidationError;
pub use repo::author_repo::{AuthorRepository, SqliteAuthorRepository};
pub use repo::piece_repo::{PieceRepository, SqlitePieceRepository};
pub use repo::{RepoError, RepoResult};
pub use service::integrity_service::{CascadeOutcome, IntegrityService};
pub use service::snapshot_service::{
    parse_snapshot, RestoreSummary, SnapshotError, SnapshotResult, SnapshotService,
};
pub use store::Store;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
