//! Completer word lists: one file per completer under `completers/`, with
//! its flags in the settings.

use super::Editor;
use crate::checkpoint::CommentBuilder;
use crate::error::{is_valid_file_name, make_unique, EditError};
use crate::settings::CompleterFlags;
use anyhow::{Context, Result};
use std::fs;
use std::io::{BufRead, BufReader};

pub const DEFAULT_COMPLETER_NAME: &str = "new_completer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleterInfo {
    pub name: String,
    pub flags: CompleterFlags,
    /// Number of words in the completer file.
    pub words: usize,
}

impl Editor {
    pub fn list_completers(&self) -> Result<Vec<CompleterInfo>> {
        self.settings
            .get()
            .completers
            .iter()
            .map(|(name, flags)| {
                Ok(CompleterInfo {
                    name: name.clone(),
                    flags: *flags,
                    words: self.count_words(name)?,
                })
            })
            .collect()
    }

    fn count_words(&self, name: &str) -> Result<usize> {
        let path = self.paths.completer_file(name);
        if !path.exists() {
            return Ok(0);
        }
        let file = fs::File::open(&path)
            .with_context(|| format!("Failed to open completer file {}", path.display()))?;
        let mut words = 0;
        for line in BufReader::new(file).lines() {
            if !line?.trim().is_empty() {
                words += 1;
            }
        }
        Ok(words)
    }

    fn check_completer(&self, name: &str) -> Result<CompleterFlags, EditError> {
        self.settings
            .get()
            .completers
            .get(name)
            .copied()
            .ok_or_else(|| EditError::UnknownCompleter(name.to_string()))
    }

    fn check_new_completer(&self, name: &str) -> Result<(), EditError> {
        if !is_valid_file_name(name) {
            return Err(EditError::InvalidCompleterName(name.to_string()));
        }
        if self.settings.get().completers.contains_key(name)
            || self.paths.completer_file(name).exists()
        {
            return Err(EditError::DuplicateCompleter(name.to_string()));
        }
        Ok(())
    }

    /// Creates an empty, enabled, learning completer and returns its name.
    pub fn add_completer(&mut self, name: Option<&str>) -> Result<String> {
        let name = match name {
            Some(name) => name.to_string(),
            None => {
                let existing: Vec<&String> = self.settings.get().completers.keys().collect();
                make_unique(DEFAULT_COMPLETER_NAME, &existing)
            }
        };
        self.check_new_completer(&name)?;

        let comment = CommentBuilder::new("Added completer").data(&name).build();
        self.checkpointed(comment, |editor| {
            let path = editor.paths.completer_file(&name);
            fs::write(&path, "")
                .with_context(|| format!("Failed to create completer file {}", path.display()))?;
            editor.settings.modify(|settings| {
                settings
                    .completers
                    .insert(name.clone(), CompleterFlags::default());
                Ok(())
            })
        })?;
        Ok(name)
    }

    pub fn delete_completer(&mut self, name: &str) -> Result<()> {
        self.check_completer(name)?;

        let comment = CommentBuilder::new("Deleted completer").data(name).build();
        self.checkpointed(comment, |editor| {
            let path = editor.paths.completer_file(name);
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
            editor.settings.modify(|settings| {
                settings.completers.remove(name);
                Ok(())
            })
        })
    }

    pub fn rename_completer(&mut self, old_name: &str, new_name: &str) -> Result<bool> {
        if old_name == new_name {
            return Ok(false);
        }
        let flags = self.check_completer(old_name)?;
        self.check_new_completer(new_name)?;

        let comment = CommentBuilder::new("Renamed completer")
            .data(old_name)
            .text("to")
            .data(new_name)
            .build();
        self.checkpointed(comment, |editor| {
            let old_path = editor.paths.completer_file(old_name);
            if old_path.exists() {
                fs::rename(&old_path, editor.paths.completer_file(new_name))
                    .with_context(|| format!("Failed to rename {}", old_path.display()))?;
            }
            editor.settings.modify(|settings| {
                settings.completers.remove(old_name);
                settings.completers.insert(new_name.to_string(), flags);
                Ok(())
            })
        })?;
        Ok(true)
    }

    pub fn set_completer_flags(&mut self, name: &str, flags: CompleterFlags) -> Result<bool> {
        if self.check_completer(name)? == flags {
            return Ok(false);
        }
        let comment = CommentBuilder::new("Changed flags of completer")
            .data(name)
            .build();
        self.checkpointed(comment, |editor| {
            editor.settings.modify(|settings| {
                settings.completers.insert(name.to_string(), flags);
                Ok(())
            })
        })?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::create_test_editor;
    use super::*;

    #[test]
    fn test_completer_lifecycle() {
        let mut t = create_test_editor();
        let name = t.editor.add_completer(None).unwrap();
        assert_eq!(name, "new_completer");
        let path = t.editor.paths().completer_file(&name);
        assert!(path.exists());

        fs::write(&path, "Davis\nEvans\n\nMonk\n").unwrap();
        assert_eq!(
            t.editor.list_completers().unwrap(),
            vec![CompleterInfo {
                name: name.clone(),
                flags: CompleterFlags::default(),
                words: 3,
            }]
        );

        assert!(t.editor.rename_completer(&name, "artists").unwrap());
        assert!(!path.exists());
        assert!(t.editor.paths().completer_file("artists").exists());

        let flags = CompleterFlags {
            enabled: true,
            learn: false,
        };
        assert!(t.editor.set_completer_flags("artists", flags).unwrap());
        assert!(!t.editor.set_completer_flags("artists", flags).unwrap());
        assert_eq!(t.editor.settings().completers["artists"], flags);

        t.editor.delete_completer("artists").unwrap();
        assert!(t.editor.list_completers().unwrap().is_empty());
        assert!(!t.editor.paths().completer_file("artists").exists());

        t.editor.undo().unwrap();
        assert!(t.editor.paths().completer_file("artists").exists());
    }

    #[test]
    fn test_rejects_unknown_completer() {
        let mut t = create_test_editor();
        let err = t.editor.delete_completer("titles").unwrap_err();
        assert_eq!(
            err.downcast_ref::<EditError>(),
            Some(&EditError::UnknownCompleter("titles".to_string()))
        );
    }
}
