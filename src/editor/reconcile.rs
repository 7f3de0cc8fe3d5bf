//! Startup repair of disagreements between the settings and the files of
//! the metadata tree.

use super::{Editor, DEFAULT_KEY_NAME};
use crate::projection::ProjectionStore;
use crate::record_store::{RecordStore, SqliteRecordStore};
use crate::settings::{CompleterFlags, GenreEntry, GenreKeys, SettingsSection};
use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyWarning {
    GenreAddedFromProjection { genre: String, keys: GenreKeys },
    ProjectionCreated(String),
    LayoutInitialised {
        genre: String,
        sections: Vec<SettingsSection>,
    },
    CompleterEntryRemoved(String),
    CompleterEntryAdded(String),
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyWarning::GenreAddedFromProjection { genre, keys } => write!(
                f,
                "genre {} has a projection but no genre spec entry; added it with keys {}",
                genre,
                keys.all_keys().join(", ")
            ),
            ConsistencyWarning::ProjectionCreated(genre) => write!(
                f,
                "genre {} has no projection file; created an empty one",
                genre
            ),
            ConsistencyWarning::LayoutInitialised { genre, sections } => {
                let names: Vec<&str> = sections.iter().map(|s| s.name()).collect();
                write!(
                    f,
                    "genre {} was missing {}; initialised",
                    genre,
                    names.join(", ")
                )
            }
            ConsistencyWarning::CompleterEntryRemoved(name) => write!(
                f,
                "completer file for {} not found; deleted its entry",
                name
            ),
            ConsistencyWarning::CompleterEntryAdded(name) => write!(
                f,
                "completer file {} had no entry; added one",
                name
            ),
        }
    }
}

/// Key lists for a genre known only from its projection: one generated
/// primary key per projected value and one secondary key per remaining
/// value of the first referenced work.
fn keys_from_projection(
    projection: &ProjectionStore,
    store: &SqliteRecordStore,
    genre: &str,
) -> Result<GenreKeys> {
    let Some(first) = projection.read(genre)?.into_iter().next() else {
        return Ok(GenreKeys::new(vec![DEFAULT_KEY_NAME], vec![]));
    };
    let primary = first.metadata.len().max(1);
    let long = store
        .get(&first.uuid)?
        .and_then(|recording| recording.works.get(&first.work).map(|w| w.metadata.len()))
        .unwrap_or(primary);
    let names: Vec<String> = (1..=long.max(primary)).map(|i| format!("key_{}", i)).collect();
    let (primary, secondary) = names.split_at(primary);
    Ok(GenreKeys::new(primary.to_vec(), secondary.to_vec()))
}

impl Editor {
    /// Brings the settings in line with the projection and completer files.
    /// Returns one warning per repair.
    pub fn reconcile(&mut self) -> Result<Vec<ConsistencyWarning>> {
        let mut warnings = Vec::new();
        let projection = ProjectionStore::new(self.paths.short_dir());
        let store = SqliteRecordStore::open(self.paths.long_store())?;

        let known = self.settings.get().genre_names();
        let mut added = Vec::new();
        for genre in projection.genres()? {
            if !known.contains(&genre) {
                let keys = keys_from_projection(&projection, &store, &genre)?;
                added.push(GenreEntry {
                    name: genre.clone(),
                    keys: keys.clone(),
                });
                warnings.push(ConsistencyWarning::GenreAddedFromProjection { genre, keys });
            }
        }
        drop(store);

        for genre in &known {
            if !projection.exists(genre) {
                projection.create_empty(genre)?;
                warnings.push(ConsistencyWarning::ProjectionCreated(genre.clone()));
            }
        }

        let completer_files = self.completer_files()?;
        let width = self.options.layout.new_genre_column_width;
        let mut repairs = self.settings.modify(|settings| {
            let mut repairs = Vec::new();
            settings.genre_spec.extend(added);

            for entry in settings.genre_spec.clone() {
                let sections = settings.missing_layout(&entry.name);
                if !sections.is_empty() {
                    settings.init_layout(&entry.name, entry.keys.primary.len(), width);
                    repairs.push(ConsistencyWarning::LayoutInitialised {
                        genre: entry.name,
                        sections,
                    });
                }
            }

            let orphaned: Vec<String> = settings
                .completers
                .keys()
                .filter(|name| !completer_files.contains(*name))
                .cloned()
                .collect();
            for name in orphaned {
                settings.completers.remove(&name);
                repairs.push(ConsistencyWarning::CompleterEntryRemoved(name));
            }
            for name in &completer_files {
                if !settings.completers.contains_key(name) {
                    settings
                        .completers
                        .insert(name.clone(), CompleterFlags::default());
                    repairs.push(ConsistencyWarning::CompleterEntryAdded(name.clone()));
                }
            }
            Ok(repairs)
        })?;
        warnings.append(&mut repairs);

        for warning in &warnings {
            warn!("Consistency repair: {}", warning);
        }
        if warnings.is_empty() {
            info!("Settings and metadata files are consistent");
        }
        Ok(warnings)
    }

    fn completer_files(&self) -> Result<Vec<String>> {
        let dir = self.paths.completers_dir();
        let mut names = Vec::new();
        for entry in
            fs::read_dir(&dir).with_context(|| format!("Failed to list {}", dir.display()))?
        {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_file() && !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
