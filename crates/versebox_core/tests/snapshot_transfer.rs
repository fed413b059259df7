use serde_json::Value;
use versebox_core::{
    Category, NewPiece, SnapshotError, SnapshotService, Store, SNAPSHOT_FORMAT_VERSION,
};

fn populated_store() -> Store {
    let store = Store::open_in_memory().unwrap();
    let frost = store.create_author("Frost", Category::Poems).unwrap();
    let seneca = store.create_author("Seneca", Category::Quotes).unwrap();
    store
        .create_piece(&NewPiece::new(frost, "Two roads diverged").with_title("Road"))
        .unwrap();
    store
        .create_piece(&NewPiece::new(seneca, "Luck is preparation").with_favorite(true))
        .unwrap();
    let removed = store.create_piece(&NewPiece::new(frost, "draft")).unwrap();
    store.delete_piece(removed).unwrap();
    store
}

#[test]
fn export_uses_documented_field_names() {
    let store = populated_store();
    let text = SnapshotService::new(&store).export_snapshot().unwrap();
    let json: Value = serde_json::from_str(&text).unwrap();

    assert_eq!(json["formatVersion"], SNAPSHOT_FORMAT_VERSION);
    assert!(json["exportedAt"].as_str().unwrap().ends_with('Z'));
    assert_eq!(json["authors"][0]["name"], "Frost");
    assert_eq!(json["authors"][0]["category"], "poems");
    assert!(json["authors"][0]["createdAt"].is_i64());
    assert_eq!(json["pieces"][0]["authorId"], 1);
    assert_eq!(json["pieces"][0]["title"], "Road");
    assert_eq!(json["pieces"][1]["title"], Value::Null);
    assert_eq!(json["pieces"][1]["favorite"], true);
    assert_eq!(json["pieces"].as_array().unwrap().len(), 2);
}

#[test]
fn export_then_restore_is_observably_identical() {
    let store = populated_store();
    let service = SnapshotService::new(&store);
    let authors_before = store.scan_authors().unwrap();
    let pieces_before = store.scan_pieces().unwrap();

    let text = service.export_snapshot().unwrap();
    store.create_author("Added later", Category::Quotes).unwrap();
    let summary = service.restore_snapshot(&text).unwrap();

    assert_eq!(summary.authors, 2);
    assert_eq!(summary.pieces, 2);
    assert_eq!(store.scan_authors().unwrap(), authors_before);
    assert_eq!(store.scan_pieces().unwrap(), pieces_before);
}

#[test]
fn restore_into_fresh_store_preserves_ids() {
    let source = populated_store();
    let text = SnapshotService::new(&source).export_snapshot().unwrap();

    let target = Store::open_in_memory().unwrap();
    SnapshotService::new(&target).restore_snapshot(&text).unwrap();

    assert_eq!(target.scan_pieces().unwrap(), source.scan_pieces().unwrap());
    let seneca_pieces = target.list_pieces_by_author(2).unwrap();
    assert_eq!(seneca_pieces.len(), 1);
    assert_eq!(seneca_pieces[0].id, 2);
}

#[test]
fn restoring_same_snapshot_twice_is_idempotent() {
    let store = populated_store();
    let service = SnapshotService::new(&store);
    let text = service.export_snapshot().unwrap();

    service.restore_snapshot(&text).unwrap();
    let once = (store.scan_authors().unwrap(), store.scan_pieces().unwrap());
    service.restore_snapshot(&text).unwrap();
    let twice = (store.scan_authors().unwrap(), store.scan_pieces().unwrap());

    assert_eq!(once, twice);
}

#[test]
fn malformed_snapshot_leaves_store_untouched() {
    let store = populated_store();
    let service = SnapshotService::new(&store);
    let before = store.scan_pieces().unwrap();

    for document in [
        "not json at all",
        r#"{"authors": "nope"}"#,
        r#"{"pieces": [{"id": 1}]}"#,
        r#"{"authors": [{"id": 1, "name": "X", "category": "novels", "createdAt": 1}]}"#,
    ] {
        let err = service.restore_snapshot(document).unwrap_err();
        assert!(
            matches!(err, SnapshotError::Malformed(_)),
            "expected malformed for {document}"
        );
    }

    assert_eq!(store.scan_pieces().unwrap(), before);
    assert_eq!(store.scan_authors().unwrap().len(), 2);
}

#[test]
fn missing_arrays_restore_as_empty_dataset() {
    let store = populated_store();

    let summary = SnapshotService::new(&store)
        .restore_snapshot(r#"{"formatVersion": 1, "exportedAt": "2024-01-01T00:00:00.000Z"}"#)
        .unwrap();

    assert_eq!(summary.authors, 0);
    assert!(store.scan_authors().unwrap().is_empty());
    assert!(store.scan_pieces().unwrap().is_empty());
}

#[test]
fn null_arrays_restore_as_empty_dataset() {
    let store = populated_store();

    let summary = SnapshotService::new(&store)
        .restore_snapshot(r#"{"formatVersion": 1, "authors": null, "pieces": null}"#)
        .unwrap();

    assert_eq!(summary.authors, 0);
    assert_eq!(summary.pieces, 0);
    assert!(store.scan_authors().unwrap().is_empty());
    assert!(store.scan_pieces().unwrap().is_empty());
}

#[test]
fn stale_owner_references_are_restored_verbatim() {
    let store = Store::open_in_memory().unwrap();
    let document = r#"{
        "formatVersion": 1,
        "exportedAt": "2024-01-01T00:00:00.000Z",
        "authors": [],
        "pieces": [{"id": 9, "authorId": 3, "title": null, "text": "stray", "favorite": false, "createdAt": 10}]
    }"#;

    SnapshotService::new(&store).restore_snapshot(document).unwrap();

    let piece = store.get_piece(9).unwrap().unwrap();
    assert_eq!(piece.author_id, 3);
    assert!(store.get_author(3).unwrap().is_none());
}

#[test]
fn snapshot_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup.json");
    let source = populated_store();
    SnapshotService::new(&source)
        .export_snapshot_to_file(&path)
        .unwrap();

    let target = Store::open(dir.path().join("restored.db")).unwrap();
    let summary = SnapshotService::new(&target)
        .restore_snapshot_from_file(&path)
        .unwrap();

    assert_eq!(summary.pieces, 2);
    assert_eq!(target.scan_authors().unwrap(), source.scan_authors().unwrap());

    let missing = SnapshotService::new(&target)
        .restore_snapshot_from_file(dir.path().join("absent.json"))
        .unwrap_err();
    assert!(matches!(missing, SnapshotError::Io { .. }));
}
