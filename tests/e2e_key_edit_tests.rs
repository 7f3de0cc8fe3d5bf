//! End-to-end tests for key edits
//!
//! Tests that key list edits keep the long store and the projection of a
//! genre in step with its keys.

mod common;

use common::*;
use std::path::Path;
use wax_config::catalog::{abbreviate_group, ValueGroup};
use wax_config::checkpoint::plain_comment;
use wax_config::{EditError, KeyClass};

/// Every work of `genre` has one long value per key, and its projection
/// entry holds the abbreviated primary values.
fn assert_genre_consistent(db: &TestDatabase, genre: &str) {
    let editor = db.open_editor();
    let keys = editor.keys(genre).unwrap();
    let projection = db.projection(genre);
    assert!(!projection.is_empty());

    for record in projection {
        let recording = db.recording(&record.uuid).unwrap();
        let work = &recording.works[&record.work];
        assert_eq!(work.genre, genre);
        assert_eq!(work.metadata.len(), keys.len());
        let expected: Vec<ValueGroup> = work.metadata[..keys.primary.len()]
            .iter()
            .map(abbreviate_group)
            .collect();
        assert_eq!(record.metadata, expected, "projection of {}", record.uuid);
    }
}

fn jazz_value(db: &TestDatabase, uuid: &str, key: &str) -> Option<ValueGroup> {
    let keys = db.open_editor().keys(JAZZ).unwrap().all_keys();
    db.recording(uuid)
        .unwrap()
        .works
        .values()
        .find(|work| work.genre == JAZZ)
        .and_then(|work| work.value_of(&keys, key).cloned())
}

#[test]
fn test_stores_follow_every_kind_of_edit() {
    let db = TestDatabase::create();
    let mut editor = db.open_editor();

    editor.add_key(JAZZ, KeyClass::Primary, Some("album")).unwrap();
    assert_genre_consistent(&db, JAZZ);

    editor.move_key(JAZZ, "year", KeyClass::Primary, 1).unwrap();
    assert_genre_consistent(&db, JAZZ);
    assert_eq!(
        editor.keys(JAZZ).unwrap().primary,
        vec!["composer", "year", "title", "album"]
    );

    editor.move_key(JAZZ, "composer", KeyClass::Secondary, 0).unwrap();
    assert_genre_consistent(&db, JAZZ);

    editor.move_key(JAZZ, "album", KeyClass::Primary, 0).unwrap();
    assert_genre_consistent(&db, JAZZ);

    editor.rename_key(JAZZ, "title", "tune").unwrap();
    assert_genre_consistent(&db, JAZZ);

    editor.delete_key(JAZZ, "year").unwrap();
    assert_genre_consistent(&db, JAZZ);

    assert_eq!(
        editor.keys(JAZZ).unwrap().all_keys(),
        vec!["album", "tune", "composer", "label"]
    );
    assert_eq!(
        jazz_value(&db, REC_3_UUID, "composer"),
        Some(ValueGroup::single("John Coltrane"))
    );
    assert_eq!(
        jazz_value(&db, REC_3_UUID, "tune"),
        Some(ValueGroup::single("Naima"))
    );
}

#[test]
fn test_deleted_value_comes_back_with_its_key() {
    let db = TestDatabase::create();
    let mut editor = db.open_editor();

    editor.delete_key(JAZZ, "label").unwrap();

    let work = db.recording(REC_1_UUID).unwrap().works[&0].clone();
    assert_eq!(work.metadata.len(), 3);
    assert_eq!(work.nonce["label"], ValueGroup::single("Columbia"));

    editor.add_key(JAZZ, KeyClass::Secondary, Some("label")).unwrap();

    let work = db.recording(REC_1_UUID).unwrap().works[&0].clone();
    assert!(work.nonce.is_empty());
    assert_eq!(
        jazz_value(&db, REC_1_UUID, "label"),
        Some(ValueGroup::single("Columbia"))
    );
    assert_eq!(
        jazz_value(&db, REC_2_UUID, "label"),
        Some(ValueGroup::single("Riverside"))
    );
}

#[test]
fn test_deleted_primary_value_comes_back_as_secondary() {
    let db = TestDatabase::create();
    let mut editor = db.open_editor();

    editor.delete_key(JAZZ, "title").unwrap();
    assert_genre_consistent(&db, JAZZ);

    editor.add_key(JAZZ, KeyClass::Secondary, Some("title")).unwrap();
    assert_genre_consistent(&db, JAZZ);
    assert_eq!(
        jazz_value(&db, REC_2_UUID, "title"),
        Some(ValueGroup::single("Peace Piece"))
    );
}

#[test]
fn test_rename_there_and_back_is_identity() {
    let db = TestDatabase::create();
    let before = db.snapshot();
    let mut editor = db.open_editor();

    assert!(editor.rename_key(JAZZ, "composer", "artist").unwrap());
    assert!(editor.rename_key(JAZZ, "artist", "composer").unwrap());

    let after = db.snapshot();
    for file in ["short/Jazz", "short/Classical"] {
        let file = Path::new(file);
        assert_eq!(before[file], after[file]);
    }
    assert_eq!(
        db.recording(REC_1_UUID).unwrap().works[&0].metadata,
        vec![
            ValueGroup::single("Miles Davis"),
            ValueGroup::single("So What"),
            ValueGroup::single("Columbia"),
            ValueGroup::single("1959"),
        ]
    );
    assert_eq!(editor.keys(JAZZ).unwrap().primary, JAZZ_PRIMARY.to_vec());
}

#[test]
fn test_rename_to_same_name_changes_nothing() {
    let db = TestDatabase::create();
    let mut editor = db.open_editor();

    assert!(!editor.rename_key(JAZZ, "label", "label").unwrap());
    assert!(!editor.can_undo().unwrap());
}

#[test]
fn test_rearrangement_in_place_takes_no_checkpoint() {
    let db = TestDatabase::create();
    let before = db.snapshot();
    let mut editor = db.open_editor();

    assert!(!editor.move_key(JAZZ, "title", KeyClass::Primary, 1).unwrap());
    assert!(!editor.move_key(JAZZ, "label", KeyClass::Secondary, 0).unwrap());

    assert!(!editor.can_undo().unwrap());
    assert_eq!(db.snapshot(), before);
}

#[test]
fn test_rejected_edits_leave_database_untouched() {
    let db = TestDatabase::create();
    let before = db.snapshot();
    let mut editor = db.open_editor();

    let err = editor
        .add_key(JAZZ, KeyClass::Secondary, Some("label"))
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<EditError>(),
        Some(&EditError::DuplicateKey {
            genre: JAZZ.to_string(),
            key: "label".to_string()
        })
    );

    let err = editor.delete_key(JAZZ, "producer").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EditError>(),
        Some(EditError::UnknownKey { .. })
    ));

    let err = editor.rename_key(JAZZ, "title", "bad key").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EditError>(),
        Some(EditError::InvalidKey(_))
    ));

    let err = editor
        .move_key(JAZZ, "label", KeyClass::Primary, 5)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EditError>(),
        Some(EditError::IndexOutOfRange { .. })
    ));

    let err = editor.delete_key("Blues", "composer").unwrap_err();
    assert_eq!(
        err.downcast_ref::<EditError>(),
        Some(&EditError::UnknownGenre("Blues".to_string()))
    );

    assert!(!editor.can_undo().unwrap());
    assert_eq!(db.snapshot(), before);
}

#[test]
fn test_last_primary_key_stays() {
    let db = TestDatabase::create();
    let mut editor = db.open_editor();

    editor.delete_key(CLASSICAL, "work").unwrap();
    let err = editor.delete_key(CLASSICAL, "composer").unwrap_err();
    assert_eq!(
        err.downcast_ref::<EditError>(),
        Some(&EditError::LastPrimaryKey(CLASSICAL.to_string()))
    );
    let err = editor
        .move_key(CLASSICAL, "composer", KeyClass::Secondary, 0)
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<EditError>(),
        Some(&EditError::LastPrimaryKey(CLASSICAL.to_string()))
    );
    assert_genre_consistent(&db, CLASSICAL);
}

#[test]
fn test_edit_leaves_other_genres_alone() {
    let db = TestDatabase::create();
    let before = db.snapshot();
    let classical_work = db.recording(REC_3_UUID).unwrap().works[&1].clone();
    let mut editor = db.open_editor();

    editor.move_key(JAZZ, "title", KeyClass::Primary, 0).unwrap();
    editor.delete_key(JAZZ, "year").unwrap();

    let after = db.snapshot();
    let classical = Path::new("short/Classical");
    assert_eq!(before[classical], after[classical]);
    assert_eq!(db.recording(REC_3_UUID).unwrap().works[&1], classical_work);
    assert_eq!(
        db.recording(REC_4_UUID).unwrap().works[&0].metadata.len(),
        CLASSICAL_PRIMARY.len()
    );
}

#[test]
fn test_new_primary_key_gets_default_value() {
    let db = TestDatabase::create();
    let mut editor = db.open_editor();

    let key = editor.add_key(CLASSICAL, KeyClass::Primary, None).unwrap();
    assert_eq!(key, "new_key");
    let second = editor.add_key(CLASSICAL, KeyClass::Primary, None).unwrap();
    assert_ne!(second, key);

    assert_genre_consistent(&db, CLASSICAL);
    assert_eq!(
        editor.columns(CLASSICAL).unwrap().len(),
        CLASSICAL_PRIMARY.len() + 2
    );
    assert_eq!(
        plain_comment(&editor.undo_comment().unwrap()),
        format!("Added key {} to primary in genre Classical", second)
    );
}
