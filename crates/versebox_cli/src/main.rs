//! VerseBox CLI
//!
//! Command-line access to a local poem and quote collection.
//!
//! # Commands
//!
//! - `authors` / `add-author` / `delete-author` - manage authors
//! - `pieces` / `add-piece` - manage pieces of one author
//! - `export` / `import` - snapshot transfer
//! - `cache-status` - inspect an offline cache database

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use versebox_core::{init_logging, AppConfig, Category};

/// Local-first collection of poems and quotes.
#[derive(Parser)]
#[command(name = "versebox")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the record store database (overrides the config file)
    #[arg(global = true, long)]
    db: Option<PathBuf>,

    /// Path to a JSON config file
    #[arg(global = true, long, default_value = "versebox.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List authors of one category, sorted by name
    Authors {
        /// `poems` or `quotes`
        category: Category,
    },

    /// Create an author
    AddAuthor {
        name: String,
        /// `poems` or `quotes`
        category: Category,
    },

    /// List pieces of one author, newest first
    Pieces { author_id: i64 },

    /// Create a piece
    AddPiece {
        author_id: i64,
        text: String,

        /// Title (ignored for quote authors)
        #[arg(short, long)]
        title: Option<String>,

        /// Mark the piece as favorite
        #[arg(short, long)]
        favorite: bool,
    },

    /// Delete an author together with all of its pieces
    DeleteAuthor { author_id: i64 },

    /// Write the whole collection to a snapshot file
    Export { file: PathBuf },

    /// Replace the whole collection with a snapshot file
    Import { file: PathBuf },

    /// Show generations stored in an offline cache database
    CacheStatus {
        /// Cache database file (defaults to the configured one)
        cache_db: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(&cli.config)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }
    let db_path = cli.db.unwrap_or_else(|| config.db_path.clone());

    match cli.command {
        Commands::Authors { category } => commands::records::list_authors(&db_path, category)?,
        Commands::AddAuthor { name, category } => {
            commands::records::add_author(&db_path, &name, category)?
        }
        Commands::Pieces { author_id } => commands::records::list_pieces(&db_path, author_id)?,
        Commands::AddPiece {
            author_id,
            text,
            title,
            favorite,
        } => commands::records::add_piece(&db_path, author_id, &text, title, favorite)?,
        Commands::DeleteAuthor { author_id } => {
            commands::records::delete_author(&db_path, author_id)?
        }
        Commands::Export { file } => commands::transfer::export(&db_path, &file)?,
        Commands::Import { file } => commands::transfer::import(&db_path, &file)?,
        Commands::CacheStatus { cache_db } => {
            let cache_db = cache_db.unwrap_or_else(|| config.cache.db_path.clone());
            commands::cache::status(&cache_db, &config.cache.generation)?
        }
    }

    Ok(())
}
