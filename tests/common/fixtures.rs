//! Test fixtures for creating recordings databases

use super::constants::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wax_config::catalog::{abbreviate_group, Recording, ValueGroup, Work};
use wax_config::projection::{ProjectionStore, ShortRecord};
use wax_config::record_store::{RecordStore, SqliteRecordStore};
use wax_config::settings::{GenreEntry, GenreKeys, SettingsService};
use wax_config::{DatabasePaths, Editor, EditorOptions};

/// A recordings database in a temporary directory.
///
/// Layout:
/// - Jazz: primary [composer, title], secondary [label, year]
/// - Classical: primary [composer, work], no secondary keys
/// - rec-1, rec-2: one Jazz work each
/// - rec-3: Jazz work at slot 0, Classical work at slot 1
/// - rec-4: one Classical work
/// - one completer, `composers`
pub struct TestDatabase {
    pub paths: DatabasePaths,
    _temp_dir: TempDir,
}

fn recording(uuid: &str, works: Vec<(u32, &str, Vec<&str>)>, props: &[(&str, &str)]) -> Recording {
    let mut recording = Recording::new();
    recording.uuid = uuid.to_string();
    for (slot, genre, values) in works {
        let metadata = values.into_iter().map(ValueGroup::single).collect();
        recording.works.insert(slot, Work::new(genre, metadata));
    }
    for (name, value) in props {
        recording.set_prop(name, ValueGroup::single(*value));
    }
    recording
}

fn short_record(recording: &Recording, slot: u32, primary: usize) -> ShortRecord {
    let metadata = recording.works[&slot]
        .metadata
        .iter()
        .take(primary)
        .map(abbreviate_group)
        .collect();
    ShortRecord::new(metadata, recording.uuid.clone(), slot)
}

impl TestDatabase {
    pub fn create() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let paths = DatabasePaths::new(temp_dir.path());
        paths.ensure_layout().expect("Failed to create metadata tree");

        let mut settings =
            SettingsService::open(paths.config_file()).expect("Failed to open settings");
        settings
            .modify(|settings| {
                settings.genre_spec = vec![
                    GenreEntry {
                        name: JAZZ.to_string(),
                        keys: GenreKeys::new(JAZZ_PRIMARY.to_vec(), JAZZ_SECONDARY.to_vec()),
                    },
                    GenreEntry {
                        name: CLASSICAL.to_string(),
                        keys: GenreKeys::new(CLASSICAL_PRIMARY.to_vec(), vec![]),
                    },
                ];
                settings.init_layout(JAZZ, JAZZ_PRIMARY.len(), 80);
                settings.init_layout(CLASSICAL, CLASSICAL_PRIMARY.len(), 80);
                settings.user_props = vec![
                    DATE_PLAYED.to_string(),
                    DATE_CREATED.to_string(),
                    TIMES_PLAYED.to_string(),
                ];
                Ok(())
            })
            .expect("Failed to write settings");

        let recordings = vec![
            recording(
                REC_1_UUID,
                vec![(0, JAZZ, vec!["Miles Davis", "So What", "Columbia", "1959"])],
                &[
                    (DATE_PLAYED, "2024 Mar 05"),
                    (DATE_CREATED, "2019 Jan 02"),
                    (TIMES_PLAYED, "12"),
                ],
            ),
            recording(
                REC_2_UUID,
                vec![(0, JAZZ, vec!["Bill Evans", "Peace Piece", "Riverside", "1958"])],
                &[
                    (DATE_PLAYED, "2025 Feb 11"),
                    (DATE_CREATED, "2020 Jun 30"),
                    (TIMES_PLAYED, "3"),
                ],
            ),
            recording(
                REC_3_UUID,
                vec![
                    (0, JAZZ, vec!["John Coltrane", "Naima", "Atlantic", "1960"]),
                    (1, CLASSICAL, vec!["Wolfgang Amadeus Mozart", "Requiem"]),
                ],
                &[(DATE_CREATED, "2021 Oct 09"), (TIMES_PLAYED, "7")],
            ),
            recording(
                REC_4_UUID,
                vec![(
                    0,
                    CLASSICAL,
                    vec!["Wolfgang Amadeus Mozart", "Piano Sonata No. 11"],
                )],
                &[],
            ),
        ];

        let mut store = SqliteRecordStore::open(paths.long_store()).expect("Failed to open store");
        for recording in &recordings {
            store.put(recording).expect("Failed to store recording");
        }
        drop(store);

        let projection = ProjectionStore::new(paths.short_dir());
        projection
            .write(
                JAZZ,
                &[
                    short_record(&recordings[0], 0, JAZZ_PRIMARY.len()),
                    short_record(&recordings[1], 0, JAZZ_PRIMARY.len()),
                    short_record(&recordings[2], 0, JAZZ_PRIMARY.len()),
                ],
            )
            .expect("Failed to write Jazz projection");
        projection
            .write(
                CLASSICAL,
                &[
                    short_record(&recordings[2], 1, CLASSICAL_PRIMARY.len()),
                    short_record(&recordings[3], 0, CLASSICAL_PRIMARY.len()),
                ],
            )
            .expect("Failed to write Classical projection");

        fs::write(
            paths.completer_file("composers"),
            "Miles Davis\nBill Evans\nJohn Coltrane\n",
        )
        .expect("Failed to write completer");
        settings
            .modify(|settings| {
                settings
                    .completers
                    .insert("composers".to_string(), Default::default());
                Ok(())
            })
            .expect("Failed to register completer");

        for dir in paths.media_dirs(REC_1_UUID) {
            fs::create_dir_all(&dir).expect("Failed to create media dir");
            fs::write(dir.join("01.flac"), b"media").expect("Failed to write media");
        }

        TestDatabase {
            paths,
            _temp_dir: temp_dir,
        }
    }

    pub fn open_editor(&self) -> Editor {
        Editor::open(self.paths.clone(), EditorOptions::default()).expect("Failed to open editor")
    }

    pub fn recording(&self, uuid: &str) -> Option<Recording> {
        SqliteRecordStore::open(self.paths.long_store())
            .expect("Failed to open store")
            .get(uuid)
            .expect("Failed to read recording")
    }

    pub fn projection(&self, genre: &str) -> Vec<ShortRecord> {
        ProjectionStore::new(self.paths.short_dir())
            .read(genre)
            .expect("Failed to read projection")
    }

    /// Every file of the metadata tree with its contents, keyed by path
    /// relative to the tree root.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        let root = self.paths.metadata();
        walkdir::WalkDir::new(&root)
            .into_iter()
            .map(|entry| entry.expect("Failed to walk metadata tree"))
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| {
                let relative = entry
                    .path()
                    .strip_prefix(&root)
                    .expect("Entry outside metadata tree")
                    .to_path_buf();
                let content = fs::read(entry.path()).expect("Failed to read file");
                (relative, content)
            })
            .collect()
    }
}
