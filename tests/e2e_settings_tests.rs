//! End-to-end tests for display settings
//!
//! Tests column layout, window geometry, track metadata keys and
//! completers.

mod common;

use common::*;
use wax_config::checkpoint::plain_comment;
use wax_config::settings::CompleterFlags;
use wax_config::{EditError, KeyClass};

#[test]
fn test_columns_follow_primary_keys() {
    let db = TestDatabase::create();
    let mut editor = db.open_editor();
    let total = |editor: &wax_config::Editor| -> u32 {
        editor.columns(JAZZ).unwrap().iter().map(|c| c.width).sum()
    };
    let before = total(&editor);

    editor.add_key(JAZZ, KeyClass::Primary, Some("album")).unwrap();
    let columns = editor.columns(JAZZ).unwrap();
    assert_eq!(columns.len(), 3);
    assert!(columns[2].width >= editor.options().layout.min_column_width);

    editor.delete_key(JAZZ, "album").unwrap();
    assert_eq!(editor.columns(JAZZ).unwrap().len(), 2);
    assert_eq!(total(&editor), before);

    editor.move_key(JAZZ, "label", KeyClass::Primary, 0).unwrap();
    assert_eq!(editor.columns(JAZZ).unwrap().len(), 3);
    assert_eq!(
        editor.columns(JAZZ).unwrap().iter().filter(|c| c.sort).count(),
        1
    );
}

#[test]
fn test_sort_and_filter_toggles() {
    let db = TestDatabase::create();
    let mut editor = db.open_editor();

    assert!(editor.toggle_sort_indicator(JAZZ, "title").unwrap());
    let columns = editor.columns(JAZZ).unwrap();
    assert!(!columns[0].sort);
    assert!(columns[1].sort);
    assert_eq!(
        plain_comment(&editor.undo_comment().unwrap()),
        "Changed sort column for key title in Jazz"
    );

    assert!(editor.toggle_filter_button(JAZZ, "composer").unwrap());
    assert!(editor.columns(JAZZ).unwrap()[0].filter);
    let err = editor.toggle_filter_button(JAZZ, "title").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EditError>(),
        Some(EditError::NoColumnLeft { .. })
    ));

    let err = editor.toggle_sort_indicator(JAZZ, "label").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EditError>(),
        Some(EditError::UnknownKey { .. })
    ));

    assert!(editor.set_column_width(JAZZ, "title", 120).unwrap());
    assert_eq!(editor.columns(JAZZ).unwrap()[1].width, 120);
    assert!(!editor.set_column_width(JAZZ, "title", 120).unwrap());
}

#[test]
fn test_geometry() {
    let db = TestDatabase::create();
    let mut editor = db.open_editor();

    assert!(!editor.restore_default_geometry().unwrap());
    assert!(editor.set_geometry("window_width", 1600).unwrap());
    assert_eq!(editor.settings().geometry.window_width, 1600);
    assert!(!editor.set_geometry("window_width", 1600).unwrap());

    let err = editor.set_geometry("zoom", 2).unwrap_err();
    assert_eq!(
        err.downcast_ref::<EditError>(),
        Some(&EditError::UnknownGeometry("zoom".to_string()))
    );

    assert!(editor.restore_default_geometry().unwrap());
    assert_ne!(editor.settings().geometry.window_width, 1600);
}

#[test]
fn test_trackmetadata_keys() {
    let db = TestDatabase::create();
    let mut editor = db.open_editor();

    let key = editor.add_trackmetadata_key(None).unwrap();
    assert_eq!(key, "new_key");
    editor.add_trackmetadata_key(Some("soloist")).unwrap();
    assert!(editor.rename_trackmetadata_key("new_key", "engineer").unwrap());
    assert_eq!(editor.trackmetadata_keys(), vec!["engineer", "soloist"]);

    let err = editor.add_trackmetadata_key(Some("soloist")).unwrap_err();
    assert_eq!(
        err.downcast_ref::<EditError>(),
        Some(&EditError::DuplicateTrackmetadataKey("soloist".to_string()))
    );

    editor.delete_trackmetadata_key("engineer").unwrap();
    assert_eq!(editor.trackmetadata_keys(), vec!["soloist"]);
    let err = editor.delete_trackmetadata_key("engineer").unwrap_err();
    assert_eq!(
        err.downcast_ref::<EditError>(),
        Some(&EditError::UnknownTrackmetadataKey("engineer".to_string()))
    );
}

#[test]
fn test_completers() {
    let db = TestDatabase::create();
    let mut editor = db.open_editor();

    let completers = editor.list_completers().unwrap();
    assert_eq!(completers.len(), 1);
    assert_eq!(completers[0].name, "composers");
    assert_eq!(completers[0].words, 3);
    assert_eq!(completers[0].flags, CompleterFlags::default());

    assert!(editor.rename_completer("composers", "artists").unwrap());
    assert!(db.paths.completer_file("artists").exists());
    assert!(!db.paths.completer_file("composers").exists());

    let flags = CompleterFlags {
        enabled: true,
        learn: false,
    };
    assert!(editor.set_completer_flags("artists", flags).unwrap());
    assert!(!editor.set_completer_flags("artists", flags).unwrap());
    assert_eq!(editor.settings().completers["artists"], flags);

    editor.add_completer(Some("labels")).unwrap();
    let err = editor.add_completer(Some("labels")).unwrap_err();
    assert_eq!(
        err.downcast_ref::<EditError>(),
        Some(&EditError::DuplicateCompleter("labels".to_string()))
    );

    editor.delete_completer("artists").unwrap();
    assert!(!db.paths.completer_file("artists").exists());
    let names: Vec<String> = editor
        .list_completers()
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["labels"]);

    editor.undo().unwrap();
    assert!(db.paths.completer_file("artists").exists());
}
