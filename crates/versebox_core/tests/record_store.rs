use versebox_core::{
    AuthorRepository, Category, ModelValidationError, NewPiece, PieceUpdate, RepoError, Store,
};

fn setup() -> Store {
    Store::open_in_memory().unwrap()
}

#[test]
fn create_and_get_author_roundtrip() {
    let store = setup();

    let id = store.create_author("  Frost  ", Category::Poems).unwrap();
    assert_eq!(id, 1);

    let author = store.get_author(id).unwrap().unwrap();
    assert_eq!(author.name, "Frost");
    assert_eq!(author.category, Category::Poems);
    assert!(author.created_at > 0);
}

#[test]
fn absent_records_are_not_errors() {
    let store = setup();

    assert!(store.get_author(42).unwrap().is_none());
    assert!(store.get_piece(42).unwrap().is_none());
    store.rename_author(42, "Nobody").unwrap();
    store.delete_piece(42).unwrap();
    store
        .update_piece(
            42,
            &PieceUpdate {
                text: Some("ghost".to_string()),
                ..PieceUpdate::default()
            },
        )
        .unwrap();
    assert!(store.scan_authors().unwrap().is_empty());
    assert!(store.scan_pieces().unwrap().is_empty());
}

#[test]
fn blank_author_name_is_rejected() {
    let store = setup();

    let err = store.create_author("   ", Category::Quotes).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::EmptyAuthorName)
    ));
}

#[test]
fn rename_preserves_category_and_created_at() {
    let store = setup();
    let id = store.create_author("Basho", Category::Poems).unwrap();
    let before = store.get_author(id).unwrap().unwrap();

    store.rename_author(id, " Matsuo Basho ").unwrap();

    let after = store.get_author(id).unwrap().unwrap();
    assert_eq!(after.name, "Matsuo Basho");
    assert_eq!(after.category, before.category);
    assert_eq!(after.created_at, before.created_at);
}

#[test]
fn authors_appear_only_in_their_category() {
    let store = setup();
    let poet = store.create_author("Rumi", Category::Poems).unwrap();
    let quoted = store.create_author("Seneca", Category::Quotes).unwrap();

    let poems: Vec<_> = store
        .list_authors_by_category(Category::Poems)
        .unwrap()
        .into_iter()
        .map(|author| author.id)
        .collect();
    let quotes: Vec<_> = store
        .list_authors_by_category(Category::Quotes)
        .unwrap()
        .into_iter()
        .map(|author| author.id)
        .collect();

    assert_eq!(poems, vec![poet]);
    assert_eq!(quotes, vec![quoted]);
}

#[test]
fn category_listing_sorts_case_insensitively_with_stable_ties() {
    let store = setup();
    for name in ["whitman", "Angelou", "blake", "Whitman", "auden"] {
        store.create_author(name, Category::Poems).unwrap();
    }

    let names: Vec<_> = store
        .list_authors_by_category(Category::Poems)
        .unwrap()
        .into_iter()
        .map(|author| author.name)
        .collect();

    assert_eq!(names, vec!["Angelou", "auden", "blake", "whitman", "Whitman"]);
}

#[test]
fn category_listing_places_accented_names_alphabetically() {
    let store = setup();
    for name in ["Zoe", "Émile", "Adam", "emile", "Ödön"] {
        store.create_author(name, Category::Quotes).unwrap();
    }

    let names: Vec<_> = store
        .list_authors_by_category(Category::Quotes)
        .unwrap()
        .into_iter()
        .map(|author| author.name)
        .collect();

    assert_eq!(names, vec!["Adam", "Émile", "emile", "Ödön", "Zoe"]);
}

#[test]
fn create_piece_requires_existing_author() {
    let store = setup();

    let err = store.create_piece(&NewPiece::new(7, "orphan")).unwrap_err();
    assert!(matches!(err, RepoError::AuthorNotFound(7)));
    assert!(store.scan_pieces().unwrap().is_empty());
}

#[test]
fn create_piece_trims_text_and_keeps_poem_titles_only() {
    let store = setup();
    let poet = store.create_author("Frost", Category::Poems).unwrap();
    let sage = store.create_author("Aurelius", Category::Quotes).unwrap();

    let poem_id = store
        .create_piece(&NewPiece::new(poet, "  Two roads diverged \n").with_title(" Road "))
        .unwrap();
    let quote_id = store
        .create_piece(&NewPiece::new(sage, "Waste no more time").with_title("ignored"))
        .unwrap();

    let poem = store.get_piece(poem_id).unwrap().unwrap();
    assert_eq!(poem.text, "Two roads diverged");
    assert_eq!(poem.title.as_deref(), Some("Road"));
    assert!(!poem.favorite);

    let quote = store.get_piece(quote_id).unwrap().unwrap();
    assert_eq!(quote.title, None);
    assert_eq!(quote.author_id, sage);
}

#[test]
fn blank_piece_text_is_rejected() {
    let store = setup();
    let poet = store.create_author("Frost", Category::Poems).unwrap();

    let err = store.create_piece(&NewPiece::new(poet, " \t ")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::EmptyPieceText)
    ));
}

#[test]
fn pieces_are_listed_newest_first_with_insertion_tiebreak() {
    let store = setup();
    let poet = store.create_author("Oliver", Category::Poems).unwrap();
    let first = store.create_piece(&NewPiece::new(poet, "first")).unwrap();
    let second = store.create_piece(&NewPiece::new(poet, "second")).unwrap();
    let third = store.create_piece(&NewPiece::new(poet, "third")).unwrap();

    // Same timestamp for two rows, older timestamp for one.
    store
        .connection()
        .execute(
            "UPDATE pieces SET created_at = 5000 WHERE id IN (?1, ?2);",
            [first, third],
        )
        .unwrap();
    store
        .connection()
        .execute("UPDATE pieces SET created_at = 1000 WHERE id = ?1;", [second])
        .unwrap();

    let order: Vec<_> = store
        .list_pieces_by_author(poet)
        .unwrap()
        .into_iter()
        .map(|piece| piece.id)
        .collect();
    assert_eq!(order, vec![third, first, second]);
}

#[test]
fn pieces_are_scoped_to_their_author() {
    let store = setup();
    let a = store.create_author("A", Category::Quotes).unwrap();
    let b = store.create_author("B", Category::Quotes).unwrap();
    store.create_piece(&NewPiece::new(a, "from a")).unwrap();
    store.create_piece(&NewPiece::new(b, "from b")).unwrap();
    store.create_piece(&NewPiece::new(b, "also b")).unwrap();

    assert_eq!(store.list_pieces_by_author(a).unwrap().len(), 1);
    assert_eq!(store.count_pieces_by_author(b).unwrap(), 2);
    assert_eq!(store.count_pieces_by_author(99).unwrap(), 0);
}

#[test]
fn update_piece_changes_only_supplied_fields() {
    let store = setup();
    let poet = store.create_author("Frost", Category::Poems).unwrap();
    let id = store
        .create_piece(&NewPiece::new(poet, "Whose woods these are").with_title("Woods"))
        .unwrap();

    store
        .update_piece(
            id,
            &PieceUpdate {
                favorite: Some(true),
                ..PieceUpdate::default()
            },
        )
        .unwrap();
    let favored = store.get_piece(id).unwrap().unwrap();
    assert!(favored.favorite);
    assert_eq!(favored.title.as_deref(), Some("Woods"));
    assert_eq!(favored.text, "Whose woods these are");

    store
        .update_piece(
            id,
            &PieceUpdate {
                title: Some(None),
                text: Some(" I think I know ".to_string()),
                favorite: None,
            },
        )
        .unwrap();
    let edited = store.get_piece(id).unwrap().unwrap();
    assert_eq!(edited.title, None);
    assert_eq!(edited.text, "I think I know");
    assert!(edited.favorite);
    assert_eq!(edited.created_at, favored.created_at);
}

#[test]
fn update_piece_rejects_blank_text_and_keeps_record() {
    let store = setup();
    let poet = store.create_author("Frost", Category::Poems).unwrap();
    let id = store.create_piece(&NewPiece::new(poet, "kept")).unwrap();

    let err = store
        .update_piece(
            id,
            &PieceUpdate {
                text: Some("   ".to_string()),
                ..PieceUpdate::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(store.get_piece(id).unwrap().unwrap().text, "kept");
}

#[test]
fn favorites_are_listed_per_category() {
    let store = setup();
    let poet = store.create_author("Frost", Category::Poems).unwrap();
    let sage = store.create_author("Seneca", Category::Quotes).unwrap();
    let poem = store
        .create_piece(&NewPiece::new(poet, "poem").with_favorite(true))
        .unwrap();
    store.create_piece(&NewPiece::new(poet, "plain")).unwrap();
    let quote = store.create_piece(&NewPiece::new(sage, "quote")).unwrap();
    store.set_favorite(quote, true).unwrap();

    let poem_favorites: Vec<_> = store
        .list_favorites_by_category(Category::Poems)
        .unwrap()
        .into_iter()
        .map(|piece| piece.id)
        .collect();
    assert_eq!(poem_favorites, vec![poem]);

    store.set_favorite(quote, false).unwrap();
    assert!(store
        .list_favorites_by_category(Category::Quotes)
        .unwrap()
        .is_empty());
}

#[test]
fn deleted_ids_are_not_reused() {
    let store = setup();
    let poet = store.create_author("Frost", Category::Poems).unwrap();
    let first = store.create_piece(&NewPiece::new(poet, "one")).unwrap();
    store.delete_piece(first).unwrap();
    let second = store.create_piece(&NewPiece::new(poet, "two")).unwrap();

    assert!(second > first);
    assert!(store.get_piece(first).unwrap().is_none());
}

#[test]
fn clear_all_empties_both_kinds() {
    let store = setup();
    let poet = store.create_author("Frost", Category::Poems).unwrap();
    store.create_piece(&NewPiece::new(poet, "one")).unwrap();

    store.clear_all().unwrap();

    assert!(store.scan_authors().unwrap().is_empty());
    assert!(store.scan_pieces().unwrap().is_empty());
}

#[test]
fn scans_follow_primary_key_order() {
    let store = setup();
    let b = store.create_author("b", Category::Quotes).unwrap();
    let a = store.create_author("a", Category::Poems).unwrap();

    let ids: Vec<_> = store
        .authors()
        .scan_authors()
        .unwrap()
        .into_iter()
        .map(|author| author.id)
        .collect();
    assert_eq!(ids, vec![b, a]);
}

#[test]
fn invalid_persisted_category_surfaces_as_invalid_data() {
    let store = setup();
    store
        .connection()
        .execute_batch("PRAGMA ignore_check_constraints = ON;")
        .unwrap();
    store
        .connection()
        .execute(
            "INSERT INTO authors (name, category, created_at) VALUES ('X', 'novels', 1);",
            [],
        )
        .unwrap();

    let err = store.scan_authors().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
