use super::{Editor, DEFAULT_KEY_NAME};
use crate::checkpoint::CommentBuilder;
use crate::error::{is_valid_key, make_unique, EditError};
use crate::settings::Geometry;
use anyhow::Result;

impl Editor {
    /// Sets one window geometry parameter by name.
    pub fn set_geometry(&mut self, name: &str, value: u32) -> Result<bool> {
        let current = self
            .settings
            .get()
            .geometry
            .get(name)
            .ok_or_else(|| EditError::UnknownGeometry(name.to_string()))?;
        if current == value {
            return Ok(false);
        }

        let comment = CommentBuilder::new("Changed geometry parameter")
            .data(name)
            .text("to")
            .data(value)
            .build();
        self.checkpointed(comment, |editor| {
            editor.settings.modify(|settings| {
                let slot = settings
                    .geometry
                    .get_mut(name)
                    .ok_or_else(|| EditError::UnknownGeometry(name.to_string()))?;
                *slot = value;
                Ok(())
            })
        })?;
        Ok(true)
    }

    pub fn restore_default_geometry(&mut self) -> Result<bool> {
        if self.settings.get().geometry == Geometry::default() {
            return Ok(false);
        }
        let comment = CommentBuilder::new("Restored default geometry").build();
        self.checkpointed(comment, |editor| {
            editor.settings.modify(|settings| {
                settings.geometry = Geometry::default();
                Ok(())
            })
        })?;
        Ok(true)
    }

    pub fn trackmetadata_keys(&self) -> Vec<String> {
        self.settings.get().trackmetadata_keys.clone()
    }

    fn check_new_trackmetadata_key(&self, key: &str) -> Result<(), EditError> {
        if !is_valid_key(key) {
            return Err(EditError::InvalidKey(key.to_string()));
        }
        if self.settings.get().trackmetadata_keys.iter().any(|k| k == key) {
            return Err(EditError::DuplicateTrackmetadataKey(key.to_string()));
        }
        Ok(())
    }

    pub fn add_trackmetadata_key(&mut self, key: Option<&str>) -> Result<String> {
        let key = match key {
            Some(key) => key.to_string(),
            None => make_unique(DEFAULT_KEY_NAME, &self.trackmetadata_keys()),
        };
        self.check_new_trackmetadata_key(&key)?;

        let comment = CommentBuilder::new("Added key")
            .data(&key)
            .text("to trackmetadata keys")
            .build();
        self.checkpointed(comment, |editor| {
            editor.settings.modify(|settings| {
                settings.trackmetadata_keys.push(key.clone());
                Ok(())
            })
        })?;
        Ok(key)
    }

    pub fn delete_trackmetadata_key(&mut self, key: &str) -> Result<()> {
        if !self.settings.get().trackmetadata_keys.iter().any(|k| k == key) {
            return Err(EditError::UnknownTrackmetadataKey(key.to_string()).into());
        }
        let comment = CommentBuilder::new("Deleted key")
            .data(key)
            .text("from trackmetadata keys")
            .build();
        self.checkpointed(comment, |editor| {
            editor.settings.modify(|settings| {
                settings.trackmetadata_keys.retain(|k| k != key);
                Ok(())
            })
        })
    }

    pub fn rename_trackmetadata_key(&mut self, old_key: &str, new_key: &str) -> Result<bool> {
        if old_key == new_key {
            return Ok(false);
        }
        let index = self
            .settings
            .get()
            .trackmetadata_keys
            .iter()
            .position(|k| k == old_key)
            .ok_or_else(|| EditError::UnknownTrackmetadataKey(old_key.to_string()))?;
        self.check_new_trackmetadata_key(new_key)?;

        let comment = CommentBuilder::new("Renamed key")
            .data(old_key)
            .text("to")
            .data(new_key)
            .text("in trackmetadata keys")
            .build();
        self.checkpointed(comment, |editor| {
            editor.settings.modify(|settings| {
                settings.trackmetadata_keys[index] = new_key.to_string();
                Ok(())
            })
        })?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::create_test_editor;
    use crate::error::EditError;
    use crate::settings::Geometry;

    #[test]
    fn test_geometry() {
        let mut t = create_test_editor();
        assert!(!t.editor.set_geometry("window_width", 800).unwrap());
        assert!(!t.editor.can_undo().unwrap());

        assert!(t.editor.set_geometry("window_width", 1024).unwrap());
        assert_eq!(t.editor.settings().geometry.window_width, 1024);

        let err = t.editor.set_geometry("depth", 3).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EditError>(),
            Some(&EditError::UnknownGeometry("depth".to_string()))
        );

        assert!(t.editor.restore_default_geometry().unwrap());
        assert_eq!(t.editor.settings().geometry, Geometry::default());
        assert!(!t.editor.restore_default_geometry().unwrap());
    }

    #[test]
    fn test_trackmetadata_keys() {
        let mut t = create_test_editor();
        assert_eq!(t.editor.add_trackmetadata_key(None).unwrap(), "new_key");
        assert_eq!(t.editor.add_trackmetadata_key(None).unwrap(), "new_key_1");

        t.editor
            .rename_trackmetadata_key("new_key", "soloist")
            .unwrap();
        assert_eq!(t.editor.trackmetadata_keys(), vec!["soloist", "new_key_1"]);

        t.editor.delete_trackmetadata_key("new_key_1").unwrap();
        assert_eq!(t.editor.trackmetadata_keys(), vec!["soloist"]);

        let err = t
            .editor
            .rename_trackmetadata_key("missing", "other")
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<EditError>(),
            Some(&EditError::UnknownTrackmetadataKey("missing".to_string()))
        );

        t.editor.undo().unwrap();
        assert_eq!(t.editor.trackmetadata_keys(), vec!["soloist", "new_key_1"]);
    }
}
