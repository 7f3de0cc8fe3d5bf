use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Directories holding media that belong to a recording, outside the
/// metadata tree.
pub const MEDIA_DIRS: [&str; 3] = ["sound", "images", "documents"];

/// Resolves every location inside a recordings database directory.
#[derive(Clone, Debug)]
pub struct DatabasePaths {
    root: PathBuf,
}

impl DatabasePaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        DatabasePaths {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The tree captured by each checkpoint.
    pub fn metadata(&self) -> PathBuf {
        self.root.join("metadata")
    }

    pub fn config_file(&self) -> PathBuf {
        self.metadata().join("config.json")
    }

    pub fn long_store(&self) -> PathBuf {
        self.metadata().join("long.db")
    }

    pub fn short_dir(&self) -> PathBuf {
        self.metadata().join("short")
    }

    pub fn completers_dir(&self) -> PathBuf {
        self.metadata().join("completers")
    }

    pub fn completer_file(&self, name: &str) -> PathBuf {
        self.completers_dir().join(name)
    }

    pub fn checkpoints(&self) -> PathBuf {
        self.root.join(".checkpoints")
    }

    pub fn media_dirs(&self, uuid: &str) -> Vec<PathBuf> {
        MEDIA_DIRS
            .iter()
            .map(|dir| self.root.join(dir).join(uuid))
            .collect()
    }

    /// Creates the metadata directories that may be missing in a fresh
    /// database.
    pub fn ensure_layout(&self) -> Result<()> {
        for dir in [self.metadata(), self.short_dir(), self.completers_dir()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}
