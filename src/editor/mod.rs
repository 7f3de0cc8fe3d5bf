//! The editing session over one recordings database.
//!
//! Every mutating operation follows the same sequence: validate, skip
//! no-ops, push a checkpoint, then change settings and stores. A failure
//! after the checkpoint was pushed pops it again, so the metadata tree is
//! left as it was before the edit.

mod completers;
mod genres;
mod layout;
mod parameters;
mod properties;
mod reconcile;
mod stats;

pub use completers::CompleterInfo;
pub use layout::{normalize, recover_width, steal_width, ColumnLayout};
pub use reconcile::ConsistencyWarning;
pub use stats::{GenreCount, WorkSummary};

use crate::catalog::{DatabasePaths, Recording};
use crate::checkpoint::{CheckpointManager, CommentBuilder};
use crate::config::{AppConfig, LayoutSettings};
use crate::error::{make_unique, EditError};
use crate::evolution::{KeyClass, KeyDefaults, KeyMove, SchemaEdit, SchemaEvolutionEngine};
use crate::genre_schema::GenreSchema;
use crate::record_store::{RecordStore, SqliteRecordStore};
use crate::settings::{GenreKeys, Settings, SettingsService};
use anyhow::{Context, Result};
use tracing::{error, info, warn};

pub const DEFAULT_KEY_NAME: &str = "new_key";

#[derive(Debug, Clone, Default)]
pub struct EditorOptions {
    pub key_defaults: KeyDefaults,
    pub layout: LayoutSettings,
}

impl From<&AppConfig> for EditorOptions {
    fn from(config: &AppConfig) -> Self {
        EditorOptions {
            key_defaults: config.key_defaults.clone(),
            layout: config.layout,
        }
    }
}

pub struct Editor {
    paths: DatabasePaths,
    settings: SettingsService,
    checkpoints: CheckpointManager,
    options: EditorOptions,
}

impl Editor {
    pub fn open(paths: DatabasePaths, options: EditorOptions) -> Result<Self> {
        paths.ensure_layout()?;
        let settings = SettingsService::open(paths.config_file())?;
        let checkpoints = CheckpointManager::for_database(&paths);
        info!("Opened recordings database at {}", paths.root().display());
        Ok(Editor {
            paths,
            settings,
            checkpoints,
            options,
        })
    }

    pub fn paths(&self) -> &DatabasePaths {
        &self.paths
    }

    pub fn settings(&self) -> &Settings {
        self.settings.get()
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn keys(&self, genre: &str) -> Result<GenreKeys> {
        let entry = self
            .settings
            .get()
            .genre(genre)
            .ok_or_else(|| EditError::UnknownGenre(genre.to_string()))?;
        Ok(entry.keys.clone())
    }

    /// Starts an editing session. Without `preserve` every checkpoint left by
    /// an earlier session is dropped. Returns the comment of the top
    /// checkpoint, empty when there is nothing to undo.
    pub fn start_session(&self, preserve: bool) -> Result<String> {
        if preserve {
            let comment = self.checkpoints.peek_comment()?;
            info!(
                "Preserving {} checkpoints from a previous session",
                self.checkpoints.depth()?
            );
            Ok(comment)
        } else {
            self.checkpoints.clear()?;
            Ok(String::new())
        }
    }

    pub fn can_undo(&self) -> Result<bool> {
        Ok(self.checkpoints.depth()? > 0)
    }

    /// Comment of the edit the next undo reverts.
    pub fn undo_comment(&self) -> Result<String> {
        self.checkpoints.peek_comment()
    }

    /// Reverts the most recent edit and returns the comment of the one
    /// before it.
    pub fn undo(&mut self) -> Result<String> {
        let comment = self.checkpoints.pop()?;
        self.settings.reload()?;
        Ok(comment)
    }

    /// Runs `edit` under a fresh checkpoint, popping it if `edit` fails.
    fn checkpointed<R, F>(&mut self, comment: String, edit: F) -> Result<R>
    where
        F: FnOnce(&mut Self) -> Result<R>,
    {
        self.checkpoints.push(&comment)?;
        match edit(self) {
            Ok(result) => Ok(result),
            Err(err) => {
                warn!("Edit failed, restoring checkpoint: {:#}", err);
                if let Err(rollback) = self.rollback() {
                    error!("Failed to restore checkpoint: {:#}", rollback);
                }
                Err(err)
            }
        }
    }

    fn rollback(&mut self) -> Result<()> {
        self.checkpoints.pop()?;
        self.settings.reload()
    }

    /// Applies `change` to every stored recording in one transaction. Only
    /// recordings for which `change` returns true are written back.
    fn rewrite_recordings<F>(&self, mut change: F) -> Result<usize>
    where
        F: FnMut(&mut Recording) -> bool,
    {
        let mut store = SqliteRecordStore::open(self.paths.long_store())?;
        let mut batch = store.begin()?;
        let mut changed = 0;
        for uuid in batch.uuids()? {
            let mut recording = batch
                .get(&uuid)?
                .with_context(|| format!("Recording {} vanished during rewrite", uuid))?;
            if change(&mut recording) {
                batch.put(&recording)?;
                changed += 1;
            }
        }
        batch.commit()?;
        Ok(changed)
    }

    // =========================================================================
    // Key edits
    // =========================================================================

    /// Applies a structural key edit to `genre`. Returns false for an edit
    /// that changes nothing, in which case no checkpoint is taken.
    pub fn apply_schema_edit(&mut self, genre: &str, edit: SchemaEdit) -> Result<bool> {
        let keys_before = self.keys(genre)?;
        let keys_after = edit.apply_to_keys(genre, &keys_before)?;
        if edit.is_noop() {
            return Ok(false);
        }

        let comment = describe_edit(genre, &keys_before, &edit);
        self.checkpointed(comment, |editor| {
            GenreSchema::new(&mut editor.settings).set_keys(genre, keys_after)?;
            let layout = editor.options.layout;
            editor.settings.modify(|settings| {
                layout::update_for_edit(settings, genre, &keys_before, &edit, &layout);
                Ok(())
            })?;
            SchemaEvolutionEngine::new(&editor.paths, &editor.options.key_defaults).apply(
                genre,
                &keys_before,
                &edit,
            )?;
            Ok(true)
        })
    }

    /// Adds a key at the end of the `class` list of `genre` and returns its
    /// name. Without a name, `new_key` is made unique among the genre's keys.
    pub fn add_key(&mut self, genre: &str, class: KeyClass, name: Option<&str>) -> Result<String> {
        let key = match name {
            Some(name) => name.to_string(),
            None => make_unique(DEFAULT_KEY_NAME, &self.keys(genre)?.all_keys()),
        };
        self.apply_schema_edit(
            genre,
            SchemaEdit::AddKey {
                key: key.clone(),
                class,
            },
        )?;
        Ok(key)
    }

    pub fn delete_key(&mut self, genre: &str, key: &str) -> Result<()> {
        self.apply_schema_edit(
            genre,
            SchemaEdit::DeleteKey {
                key: key.to_string(),
            },
        )?;
        Ok(())
    }

    pub fn rename_key(&mut self, genre: &str, old_key: &str, new_key: &str) -> Result<bool> {
        if old_key == new_key {
            return Ok(false);
        }
        self.apply_schema_edit(
            genre,
            SchemaEdit::RenameKey {
                old_key: old_key.to_string(),
                new_key: new_key.to_string(),
            },
        )
    }

    /// Moves `key` to `insert_index` of the `target` list, dispatching to a
    /// rearrangement, promotion or demotion.
    pub fn move_key(
        &mut self,
        genre: &str,
        key: &str,
        target: KeyClass,
        insert_index: usize,
    ) -> Result<bool> {
        let keys = self.keys(genre)?;
        let edit = if let Some(index) = keys.primary.iter().position(|k| k == key) {
            let key_move = KeyMove::new(index, insert_index);
            match target {
                KeyClass::Primary => SchemaEdit::RearrangePrimary(key_move),
                KeyClass::Secondary => SchemaEdit::DemotePrimary(key_move),
            }
        } else if let Some(index) = keys.secondary.iter().position(|k| k == key) {
            let key_move = KeyMove::new(index, insert_index);
            match target {
                KeyClass::Primary => SchemaEdit::PromoteSecondary(key_move),
                KeyClass::Secondary => SchemaEdit::RearrangeSecondary(key_move),
            }
        } else {
            return Err(EditError::UnknownKey {
                genre: genre.to_string(),
                key: key.to_string(),
            }
            .into());
        };
        self.apply_schema_edit(genre, edit)
    }
}

fn key_at(keys: &[String], index: usize) -> &str {
    keys.get(index).map(String::as_str).unwrap_or_default()
}

fn describe_edit(genre: &str, keys: &GenreKeys, edit: &SchemaEdit) -> String {
    let comment = match edit {
        SchemaEdit::AddKey { key, class } => CommentBuilder::new("Added key")
            .data(key)
            .text("to")
            .text(class.name())
            .text("in genre")
            .data(genre),
        SchemaEdit::DeleteKey { key } => {
            let class = if keys.primary.contains(key) {
                KeyClass::Primary
            } else {
                KeyClass::Secondary
            };
            CommentBuilder::new("Deleted key")
                .data(key)
                .text("from")
                .text(class.name())
                .text("in genre")
                .data(genre)
        }
        SchemaEdit::RenameKey { old_key, new_key } => CommentBuilder::new("Renamed key")
            .data(old_key)
            .text("to")
            .data(new_key)
            .text("in genre")
            .data(genre),
        SchemaEdit::RearrangePrimary(m) => CommentBuilder::new("Moved primary key")
            .data(key_at(&keys.primary, m.from_index))
            .text("to position")
            .data(m.insert_index + 1)
            .text("in")
            .data(genre),
        SchemaEdit::RearrangeSecondary(m) => CommentBuilder::new("Moved secondary key")
            .data(key_at(&keys.secondary, m.from_index))
            .text("to position")
            .data(m.insert_index + 1)
            .text("in")
            .data(genre),
        SchemaEdit::PromoteSecondary(m) => CommentBuilder::new("Promoted key")
            .data(key_at(&keys.secondary, m.from_index))
            .text("to primary in position")
            .data(m.insert_index + 1)
            .text("in")
            .data(genre),
        SchemaEdit::DemotePrimary(m) => CommentBuilder::new("Demoted key")
            .data(key_at(&keys.primary, m.from_index))
            .text("to secondary in position")
            .data(m.insert_index + 1)
            .text("in")
            .data(genre),
    };
    comment.build()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::catalog::{ValueGroup, Work};
    use crate::projection::{ProjectionStore, ShortRecord};
    use tempfile::TempDir;

    pub struct TestEditor {
        pub editor: Editor,
        pub uuids: Vec<String>,
        _temp_dir: TempDir,
    }

    /// An editor over a database with one genre, Jazz (primary
    /// [composer, title], secondary [label]), and two recordings.
    pub fn create_test_editor() -> TestEditor {
        let temp_dir = TempDir::new().unwrap();
        let paths = DatabasePaths::new(temp_dir.path());
        let mut editor = Editor::open(paths, EditorOptions::default()).unwrap();

        editor
            .settings
            .modify(|settings| {
                settings.genre_spec.push(crate::settings::GenreEntry {
                    name: "Jazz".to_string(),
                    keys: GenreKeys::new(vec!["composer", "title"], vec!["label"]),
                });
                settings.init_layout("Jazz", 2, 80);
                settings.user_props = vec!["date played".to_string()];
                Ok(())
            })
            .unwrap();

        let mut store = SqliteRecordStore::open(editor.paths.long_store()).unwrap();
        let mut short = Vec::new();
        let mut uuids = Vec::new();
        for (composer, title, label) in [
            ("Miles Davis", "So What", "Columbia"),
            ("Bill Evans", "Peace Piece", "Riverside"),
        ] {
            let mut recording = Recording::new();
            recording.works.insert(
                0,
                Work::new("Jazz", vec![composer.into(), title.into(), label.into()]),
            );
            recording.set_prop("date played", ValueGroup::single("2024 Mar 05"));
            store.put(&recording).unwrap();
            short.push(ShortRecord::new(
                vec![
                    crate::catalog::abbreviate_group(&ValueGroup::single(composer)),
                    crate::catalog::abbreviate_group(&ValueGroup::single(title)),
                ],
                recording.uuid.clone(),
                0,
            ));
            uuids.push(recording.uuid);
        }
        ProjectionStore::new(editor.paths.short_dir())
            .write("Jazz", &short)
            .unwrap();

        TestEditor {
            editor,
            uuids,
            _temp_dir: temp_dir,
        }
    }

    pub fn stored(editor: &Editor, uuid: &str) -> Option<Recording> {
        SqliteRecordStore::open(editor.paths().long_store())
            .unwrap()
            .get(uuid)
            .unwrap()
    }
}
