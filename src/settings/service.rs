use super::models::Settings;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Owns the in-memory copy of `config.json` and every write to it.
pub struct SettingsService {
    path: PathBuf,
    settings: Settings,
}

impl SettingsService {
    /// Loads the settings file. A missing file yields default settings; it is
    /// written on the first modification.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let settings = Self::load(&path)?;
        info!(
            "Loaded settings from {} ({} genres)",
            path.display(),
            settings.genre_spec.len()
        );
        Ok(SettingsService { path, settings })
    }

    fn load(path: &Path) -> Result<Settings> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Settings::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {:?}", path))
    }

    /// Rereads the file, discarding the in-memory copy. Called after the
    /// metadata tree was replaced underneath.
    pub fn reload(&mut self) -> Result<()> {
        self.settings = Self::load(&self.path)?;
        debug!("Reloaded settings from {}", self.path.display());
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-modify-write: the file is reread, `change` runs on a copy, and
    /// the result is written back only if `change` succeeds.
    pub fn modify<R, F>(&mut self, change: F) -> Result<R>
    where
        F: FnOnce(&mut Settings) -> Result<R>,
    {
        let mut settings = Self::load(&self.path)?;
        let result = change(&mut settings)?;
        self.write(&settings)?;
        self.settings = settings;
        Ok(result)
    }

    fn write(&self, settings: &Settings) -> Result<()> {
        let dir = self
            .path
            .parent()
            .context("Settings path has no parent directory")?;
        let mut temp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
        serde_json::to_writer_pretty(&mut temp, settings)?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path)
            .with_context(|| format!("Failed to write settings file: {:?}", self.path))?;
        Ok(())
    }
}
