//! User-defined recording properties such as `date played`. The list lives
//! in the settings; every recording carries a value for each entry.

use super::Editor;
use crate::catalog::ValueGroup;
use crate::checkpoint::CommentBuilder;
use crate::error::{make_unique, EditError};
use crate::record_store::{RecordStore, SqliteRecordStore};
use anyhow::Result;
use tracing::info;

pub const DEFAULT_PROPERTY_NAME: &str = "new_property";

fn is_valid_property_name(name: &str) -> bool {
    !name.is_empty() && name.trim() == name
}

impl Editor {
    pub fn properties(&self) -> Vec<String> {
        self.settings.get().user_props.clone()
    }

    fn check_property(&self, name: &str) -> Result<(), EditError> {
        if self.settings.get().user_props.iter().any(|p| p == name) {
            Ok(())
        } else {
            Err(EditError::UnknownProperty(name.to_string()))
        }
    }

    fn check_new_property(&self, name: &str) -> Result<(), EditError> {
        if !is_valid_property_name(name) {
            return Err(EditError::InvalidPropertyName(name.to_string()));
        }
        if self.settings.get().user_props.iter().any(|p| p == name) {
            return Err(EditError::DuplicateProperty(name.to_string()));
        }
        Ok(())
    }

    /// Appends a property and gives every recording an empty value for it.
    pub fn add_property(&mut self, name: Option<&str>) -> Result<String> {
        let name = match name {
            Some(name) => name.to_string(),
            None => make_unique(DEFAULT_PROPERTY_NAME, &self.properties()),
        };
        self.check_new_property(&name)?;

        let comment = CommentBuilder::new("Added property").data(&name).build();
        self.checkpointed(comment, |editor| {
            editor.settings.modify(|settings| {
                settings.user_props.push(name.clone());
                Ok(())
            })?;
            let changed = editor.rewrite_recordings(|recording| {
                if recording.prop(&name).is_some() {
                    return false;
                }
                recording.props.push((name.clone(), ValueGroup::null()));
                true
            })?;
            info!("Added property {} to {} recordings", name, changed);
            Ok(())
        })?;
        Ok(name)
    }

    pub fn delete_property(&mut self, name: &str) -> Result<()> {
        self.check_property(name)?;

        let comment = CommentBuilder::new("Deleted property").data(name).build();
        self.checkpointed(comment, |editor| {
            editor.settings.modify(|settings| {
                settings.user_props.retain(|p| p != name);
                Ok(())
            })?;
            editor.rewrite_recordings(|recording| {
                let before = recording.props.len();
                recording.props.retain(|(prop, _)| prop != name);
                recording.props.len() != before
            })?;
            Ok(())
        })
    }

    /// Renames a property in the settings and in every recording, keeping
    /// its position.
    pub fn rename_property(&mut self, old_name: &str, new_name: &str) -> Result<bool> {
        if old_name == new_name {
            return Ok(false);
        }
        self.check_property(old_name)?;
        self.check_new_property(new_name)?;

        let comment = CommentBuilder::new("Renamed property")
            .data(old_name)
            .text("to")
            .data(new_name)
            .build();
        self.checkpointed(comment, |editor| {
            editor.settings.modify(|settings| {
                for prop in settings.user_props.iter_mut() {
                    if prop.as_str() == old_name {
                        *prop = new_name.to_string();
                    }
                }
                Ok(())
            })?;
            editor.rewrite_recordings(|recording| {
                let mut changed = false;
                for (prop, _) in recording.props.iter_mut() {
                    if prop.as_str() == old_name {
                        *prop = new_name.to_string();
                        changed = true;
                    }
                }
                changed
            })?;
            Ok(())
        })?;
        Ok(true)
    }

    /// Whether any recording has a non-empty value for `name`.
    pub fn property_has_values(&self, name: &str) -> Result<bool> {
        self.check_property(name)?;
        let store = SqliteRecordStore::open(self.paths.long_store())?;
        for uuid in store.uuids()? {
            if let Some(recording) = store.get(&uuid)? {
                if recording.prop(name).is_some_and(|value| !value.is_null()) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}
