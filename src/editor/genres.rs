use super::{Editor, DEFAULT_KEY_NAME};
use crate::checkpoint::CommentBuilder;
use crate::error::{is_valid_file_name, make_unique, EditError};
use crate::genre_schema::GenreSchema;
use crate::projection::ProjectionStore;
use crate::record_store::{RecordStore, SqliteRecordStore};
use anyhow::{bail, Context, Result};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

pub const DEFAULT_GENRE_NAME: &str = "New_genre";

impl Editor {
    pub fn genres(&self) -> Vec<String> {
        self.settings.get().genre_names()
    }

    fn projection(&self) -> ProjectionStore {
        ProjectionStore::new(self.paths.short_dir())
    }

    fn check_new_genre_name(&self, genre: &str) -> Result<(), EditError> {
        if !is_valid_file_name(genre) {
            return Err(EditError::InvalidGenreName(genre.to_string()));
        }
        if self.settings.get().genre(genre).is_some() || self.projection().exists(genre) {
            return Err(EditError::DuplicateGenre(genre.to_string()));
        }
        Ok(())
    }

    fn check_genre(&self, genre: &str) -> Result<(), EditError> {
        match self.settings.get().genre(genre) {
            Some(_) => Ok(()),
            None => Err(EditError::UnknownGenre(genre.to_string())),
        }
    }

    /// Adds a genre with a single primary key and an empty projection.
    /// Returns its name.
    pub fn add_genre(&mut self, name: Option<&str>) -> Result<String> {
        let genre = match name {
            Some(name) => name.to_string(),
            None => make_unique(DEFAULT_GENRE_NAME, &self.genres()),
        };
        self.check_new_genre_name(&genre)?;

        let comment = CommentBuilder::new("Added genre").data(&genre).build();
        self.checkpointed(comment, |editor| {
            GenreSchema::new(&mut editor.settings).add_genre(&genre, DEFAULT_KEY_NAME)?;
            let width = editor.options.layout.new_genre_column_width;
            editor.settings.modify(|settings| {
                settings.init_layout(&genre, 1, width);
                Ok(())
            })?;
            editor.projection().create_empty(&genre)
        })?;
        info!("Added genre {}", genre);
        Ok(genre)
    }

    /// Renames a genre in the schema, the layout, the projection file name
    /// and every work of the genre.
    pub fn rename_genre(&mut self, old_genre: &str, new_genre: &str) -> Result<bool> {
        if old_genre == new_genre {
            return Ok(false);
        }
        self.check_genre(old_genre)?;
        self.check_new_genre_name(new_genre)?;

        let comment = CommentBuilder::new("Renamed genre")
            .data(old_genre)
            .text("to")
            .data(new_genre)
            .build();
        self.checkpointed(comment, |editor| {
            GenreSchema::new(&mut editor.settings).rename_genre(old_genre, new_genre)?;
            editor.settings.modify(|settings| {
                settings.rename_layout(old_genre, new_genre);
                Ok(())
            })?;
            let works = editor.rewrite_recordings(|recording| {
                let mut changed = false;
                for work in recording.works.values_mut() {
                    if work.genre == old_genre {
                        work.genre = new_genre.to_string();
                        changed = true;
                    }
                }
                changed
            })?;
            let projection = editor.projection();
            if projection.exists(old_genre) {
                projection.rename(old_genre, new_genre)?;
            } else {
                projection.create_empty(new_genre)?;
            }
            info!(
                "Renamed genre {} to {} ({} recordings)",
                old_genre, new_genre, works
            );
            Ok(())
        })?;
        Ok(true)
    }

    /// Deletes a genre with every work in it.
    ///
    /// Works left in a recording are renumbered from 0 and projection
    /// records of other genres follow their work to its new number.
    /// Recordings left without works are removed, and so are their media
    /// directories once the stores are committed.
    pub fn delete_genre(&mut self, genre: &str) -> Result<()> {
        self.check_genre(genre)?;

        let comment = CommentBuilder::new("Deleted genre").data(genre).build();
        let removed = self.checkpointed(comment, |editor| {
            GenreSchema::new(&mut editor.settings).delete_genre(genre)?;
            editor.settings.modify(|settings| {
                settings.remove_layout(genre);
                Ok(())
            })?;
            editor.delete_genre_works(genre)
        })?;

        for uuid in &removed {
            for dir in self.paths.media_dirs(uuid) {
                if dir.exists() {
                    if let Err(err) = std::fs::remove_dir_all(&dir) {
                        warn!("Failed to remove {}: {}", dir.display(), err);
                    }
                }
            }
        }
        info!(
            "Deleted genre {} ({} recordings removed)",
            genre,
            removed.len()
        );
        Ok(())
    }

    /// Returns the uuids of the recordings that were removed.
    fn delete_genre_works(&self, genre: &str) -> Result<Vec<String>> {
        let projection = self.projection();
        let mut store = SqliteRecordStore::open(self.paths.long_store())?;
        let mut batch = store.begin()?;

        let mut renumbered: HashMap<String, BTreeMap<u32, u32>> = HashMap::new();
        let mut removed = Vec::new();
        for uuid in batch.uuids()? {
            let mut recording = batch
                .get(&uuid)?
                .with_context(|| format!("Recording {} vanished during rewrite", uuid))?;
            if !recording.works.values().any(|work| work.genre == genre) {
                continue;
            }

            let works = std::mem::take(&mut recording.works);
            let mut slots = BTreeMap::new();
            for (old, work) in works.into_iter().filter(|(_, work)| work.genre != genre) {
                let new = recording.works.len() as u32;
                slots.insert(old, new);
                recording.works.insert(new, work);
            }

            if recording.works.is_empty() {
                batch.remove(&uuid)?;
                removed.push(uuid);
            } else {
                batch.put(&recording)?;
                if slots.iter().any(|(old, new)| old != new) {
                    renumbered.insert(uuid, slots);
                }
            }
        }

        let mut staged = Vec::new();
        if !renumbered.is_empty() {
            for other in projection.genres()? {
                if other == genre {
                    continue;
                }
                let mut moved = 0;
                let rewrite = projection.stage_rewrite(&other, |mut record| {
                    if let Some(slots) = renumbered.get(&record.uuid) {
                        let Some(&slot) = slots.get(&record.work) else {
                            bail!(
                                "Projection of {} references missing work {} of {}",
                                other,
                                record.work,
                                record.uuid
                            );
                        };
                        if slot != record.work {
                            record.work = slot;
                            moved += 1;
                        }
                    }
                    Ok(Some(record))
                })?;
                if moved > 0 {
                    staged.push(rewrite);
                } else {
                    rewrite.discard();
                }
            }
        }

        batch.commit()?;
        for rewrite in staged {
            rewrite.commit()?;
        }
        projection.remove(genre)?;
        Ok(removed)
    }

    /// Moves `genre` to `position` in the display order.
    pub fn move_genre(&mut self, genre: &str, position: usize) -> Result<bool> {
        let mut order = self.genres();
        let index = order
            .iter()
            .position(|g| g == genre)
            .ok_or_else(|| EditError::UnknownGenre(genre.to_string()))?;
        if position >= order.len() {
            return Err(EditError::IndexOutOfRange {
                index: position,
                len: order.len(),
            }
            .into());
        }
        let moved = order.remove(index);
        order.insert(position, moved);
        self.reorder_genres(&order)
    }

    /// Replaces the display order. `order` must name every genre once.
    pub fn reorder_genres(&mut self, order: &[String]) -> Result<bool> {
        let current = self.genres();
        if order == current.as_slice() {
            return Ok(false);
        }
        let mut requested = order.to_vec();
        requested.sort();
        let mut existing = current;
        existing.sort();
        if requested != existing {
            return Err(EditError::InvalidGenreOrder.into());
        }

        let comment = CommentBuilder::new("Reordered genres")
            .data(order.join(", "))
            .build();
        self.checkpointed(comment, |editor| {
            GenreSchema::new(&mut editor.settings).reorder_genres(order)
        })?;
        Ok(true)
    }

    /// Whether deleting `genre` would delete works.
    pub fn genre_has_works(&self, genre: &str) -> Result<bool> {
        self.check_genre(genre)?;
        Ok(self.projection().count(genre)? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{create_test_editor, stored};
    use crate::catalog::{Recording, Work};
    use crate::error::EditError;
    use crate::projection::{ProjectionStore, ShortRecord};
    use crate::record_store::{RecordStore, SqliteRecordStore};

    #[test]
    fn test_add_genre_defaults() {
        let mut t = create_test_editor();
        let genre = t.editor.add_genre(None).unwrap();
        let second = t.editor.add_genre(None).unwrap();

        assert_eq!(genre, "New_genre");
        assert_eq!(second, "New_genre_1");
        assert_eq!(t.editor.genres(), vec!["Jazz", "New_genre", "New_genre_1"]);
        assert_eq!(t.editor.keys(&genre).unwrap().primary, vec!["new_key"]);

        let settings = t.editor.settings();
        assert_eq!(settings.column_widths[&genre], vec![80]);
        assert!(settings.filter_config[&genre].is_empty());
        assert_eq!(settings.sort_indicators[&genre], vec![true]);
        assert!(!t.editor.genre_has_works(&genre).unwrap());
        assert!(ProjectionStore::new(t.editor.paths().short_dir()).exists(&genre));
    }

    #[test]
    fn test_add_genre_rejects_bad_names() {
        let mut t = create_test_editor();
        let err = t.editor.add_genre(Some("Jazz")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EditError>(),
            Some(&EditError::DuplicateGenre("Jazz".to_string()))
        );
        let err = t.editor.add_genre(Some("a/b")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EditError>(),
            Some(&EditError::InvalidGenreName("a/b".to_string()))
        );
        assert!(!t.editor.can_undo().unwrap());
    }

    #[test]
    fn test_rename_genre_updates_works() {
        let mut t = create_test_editor();
        assert!(t.editor.rename_genre("Jazz", "Bebop").unwrap());

        assert_eq!(t.editor.genres(), vec!["Bebop"]);
        assert!(t.editor.settings().column_widths.contains_key("Bebop"));
        let projection = ProjectionStore::new(t.editor.paths().short_dir());
        assert!(!projection.exists("Jazz"));
        assert_eq!(projection.count("Bebop").unwrap(), 2);
        for uuid in &t.uuids {
            assert_eq!(stored(&t.editor, uuid).unwrap().works[&0].genre, "Bebop");
        }

        t.editor.undo().unwrap();
        assert_eq!(t.editor.genres(), vec!["Jazz"]);
        assert_eq!(stored(&t.editor, &t.uuids[0]).unwrap().works[&0].genre, "Jazz");
    }

    #[test]
    fn test_delete_genre_renumbers_works() {
        let mut t = create_test_editor();
        t.editor.add_genre(Some("Blues")).unwrap();

        // A recording holding a Jazz work at slot 0 and a Blues work at 1.
        let paths = t.editor.paths().clone();
        let mut recording = Recording::new();
        recording
            .works
            .insert(0, Work::new("Jazz", vec!["Ella".into(), "Summertime".into()]));
        recording
            .works
            .insert(1, Work::new("Blues", vec!["B.B. King".into()]));
        SqliteRecordStore::open(paths.long_store())
            .unwrap()
            .put(&recording)
            .unwrap();
        ProjectionStore::new(paths.short_dir())
            .write(
                "Blues",
                &[ShortRecord::new(vec!["King".into()], recording.uuid.clone(), 1)],
            )
            .unwrap();
        let media = paths.media_dirs(&t.uuids[0]);
        std::fs::create_dir_all(&media[0]).unwrap();

        assert!(t.editor.genre_has_works("Jazz").unwrap());
        t.editor.delete_genre("Jazz").unwrap();

        assert_eq!(t.editor.genres(), vec!["Blues"]);
        assert!(!t.editor.settings().column_widths.contains_key("Jazz"));
        assert!(stored(&t.editor, &t.uuids[0]).is_none());
        assert!(!media[0].exists());

        let survivor = stored(&t.editor, &recording.uuid).unwrap();
        assert_eq!(survivor.works.len(), 1);
        assert_eq!(survivor.works[&0].genre, "Blues");
        let blues = ProjectionStore::new(paths.short_dir()).read("Blues").unwrap();
        assert_eq!(blues[0].work, 0);
        assert!(!ProjectionStore::new(paths.short_dir()).exists("Jazz"));
    }

    #[test]
    fn test_reorder_genres() {
        let mut t = create_test_editor();
        t.editor.add_genre(Some("Blues")).unwrap();
        t.editor.add_genre(Some("Folk")).unwrap();

        assert!(t.editor.move_genre("Folk", 0).unwrap());
        assert_eq!(t.editor.genres(), vec!["Folk", "Jazz", "Blues"]);
        assert!(!t.editor.move_genre("Folk", 0).unwrap());

        let err = t
            .editor
            .reorder_genres(&["Jazz".to_string(), "Blues".to_string()])
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<EditError>(),
            Some(&EditError::InvalidGenreOrder)
        );
        assert_eq!(t.editor.keys("Jazz").unwrap().primary, vec!["composer", "title"]);
    }
}
