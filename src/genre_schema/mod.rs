//! Accessor for the genre spec section of the settings.
//!
//! Genre order is display order. Every mutation is one read-modify-write of
//! the settings file.

use crate::error::EditError;
use crate::settings::{GenreEntry, GenreKeys, SettingsService};
use anyhow::Result;
use std::collections::HashSet;

pub struct GenreSchema<'s> {
    settings: &'s mut SettingsService,
}

impl<'s> GenreSchema<'s> {
    pub fn new(settings: &'s mut SettingsService) -> Self {
        GenreSchema { settings }
    }

    pub fn genres(&self) -> Vec<String> {
        self.settings.get().genre_names()
    }

    pub fn contains(&self, genre: &str) -> bool {
        self.settings.get().genre(genre).is_some()
    }

    pub fn keys(&self, genre: &str) -> Result<GenreKeys> {
        let entry = self
            .settings
            .get()
            .genre(genre)
            .ok_or_else(|| EditError::UnknownGenre(genre.to_string()))?;
        Ok(entry.keys.clone())
    }

    pub fn all_keys(&self, genre: &str) -> Result<Vec<String>> {
        Ok(self.keys(genre)?.all_keys())
    }

    pub fn primary_keys(&self, genre: &str) -> Result<Vec<String>> {
        Ok(self.keys(genre)?.primary)
    }

    pub fn secondary_keys(&self, genre: &str) -> Result<Vec<String>> {
        Ok(self.keys(genre)?.secondary)
    }

    pub fn set_keys(&mut self, genre: &str, keys: GenreKeys) -> Result<()> {
        self.settings.modify(|settings| {
            let entry = settings
                .genre_mut(genre)
                .ok_or_else(|| EditError::UnknownGenre(genre.to_string()))?;
            entry.keys = keys;
            Ok(())
        })
    }

    pub fn rename_genre(&mut self, old_genre: &str, new_genre: &str) -> Result<()> {
        self.settings.modify(|settings| {
            if settings.genre(new_genre).is_some() {
                return Err(EditError::DuplicateGenre(new_genre.to_string()).into());
            }
            let entry = settings
                .genre_mut(old_genre)
                .ok_or_else(|| EditError::UnknownGenre(old_genre.to_string()))?;
            entry.name = new_genre.to_string();
            Ok(())
        })
    }

    /// Rebuilds the genre list in `order`, which must name every existing
    /// genre exactly once. Key lists follow their genre.
    pub fn reorder_genres(&mut self, order: &[String]) -> Result<()> {
        self.settings.modify(|settings| {
            let existing: HashSet<&str> =
                settings.genre_spec.iter().map(|e| e.name.as_str()).collect();
            let requested: HashSet<&str> = order.iter().map(String::as_str).collect();
            if order.len() != settings.genre_spec.len() || requested != existing {
                return Err(EditError::InvalidGenreOrder.into());
            }
            let mut reordered = Vec::with_capacity(order.len());
            for name in order {
                if let Some(entry) = settings.genre(name) {
                    reordered.push(entry.clone());
                }
            }
            settings.genre_spec = reordered;
            Ok(())
        })
    }

    pub fn add_genre(&mut self, genre: &str, primary_key: &str) -> Result<()> {
        self.settings.modify(|settings| {
            if settings.genre(genre).is_some() {
                return Err(EditError::DuplicateGenre(genre.to_string()).into());
            }
            settings.genre_spec.push(GenreEntry {
                name: genre.to_string(),
                keys: GenreKeys::new(vec![primary_key], vec![]),
            });
            Ok(())
        })
    }

    pub fn delete_genre(&mut self, genre: &str) -> Result<()> {
        self.settings.modify(|settings| {
            let before = settings.genre_spec.len();
            settings.genre_spec.retain(|entry| entry.name != genre);
            if settings.genre_spec.len() == before {
                return Err(EditError::UnknownGenre(genre.to_string()).into());
            }
            Ok(())
        })
    }
}
