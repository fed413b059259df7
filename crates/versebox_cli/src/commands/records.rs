//! Author and piece commands.

use std::path::Path;
use versebox_core::{AuthorId, Category, IntegrityService, NewPiece, Store};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub fn list_authors(db_path: &Path, category: Category) -> CommandResult {
    let store = Store::open(db_path)?;
    let authors = store.list_authors_by_category(category)?;
    if authors.is_empty() {
        println!("No {category} authors");
        return Ok(());
    }
    for author in authors {
        let count = store.count_pieces_by_author(author.id)?;
        println!("{:>6}  {}  ({count})", author.id, author.name);
    }
    Ok(())
}

pub fn add_author(db_path: &Path, name: &str, category: Category) -> CommandResult {
    let store = Store::open(db_path)?;
    let id = store.create_author(name, category)?;
    println!("Created author {id}");
    Ok(())
}

pub fn list_pieces(db_path: &Path, author_id: AuthorId) -> CommandResult {
    let store = Store::open(db_path)?;
    let Some(author) = store.get_author(author_id)? else {
        return Err(format!("author {author_id} not found").into());
    };

    println!("{} ({})", author.name, author.category);
    for piece in store.list_pieces_by_author(author_id)? {
        let marker = if piece.favorite { "*" } else { " " };
        match &piece.title {
            Some(title) => println!("{marker}{:>6}  {title}", piece.id),
            None => println!("{marker}{:>6}", piece.id),
        }
        for line in piece.text.lines() {
            println!("         {line}");
        }
    }
    Ok(())
}

pub fn add_piece(
    db_path: &Path,
    author_id: AuthorId,
    text: &str,
    title: Option<String>,
    favorite: bool,
) -> CommandResult {
    let store = Store::open(db_path)?;
    let mut piece = NewPiece::new(author_id, text).with_favorite(favorite);
    if let Some(title) = title {
        piece = piece.with_title(title);
    }
    let id = store.create_piece(&piece)?;
    println!("Created piece {id}");
    Ok(())
}

pub fn delete_author(db_path: &Path, author_id: AuthorId) -> CommandResult {
    let store = Store::open(db_path)?;
    let outcome = IntegrityService::new(&store).delete_author_cascade(author_id)?;
    if outcome.author_removed {
        println!(
            "Deleted author {author_id} and {} piece(s)",
            outcome.pieces_removed
        );
    } else {
        println!(
            "Author {author_id} not found; removed {} leftover piece(s)",
            outcome.pieces_removed
        );
    }
    Ok(())
}
