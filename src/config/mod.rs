mod file_config;

pub use file_config::{FileConfig, KeysConfig, LayoutConfig};

use crate::catalog::DatabasePaths;
use crate::evolution::KeyDefaults;
use anyhow::{bail, Result};
use std::path::PathBuf;

pub const DEFAULT_DATABASE_DIR: &str = "recordings";

/// CLI arguments. `database_dir` can be overridden by the TOML config;
/// `preserve_checkpoints` cannot.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub database_dir: Option<PathBuf>,
    pub preserve_checkpoints: bool,
}

/// Column width policy applied when primary keys come and go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSettings {
    pub new_column_width: u32,
    pub min_column_width: u32,
    pub new_genre_column_width: u32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        LayoutSettings {
            new_column_width: 50,
            min_column_width: 30,
            new_genre_column_width: 80,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_dir: PathBuf,
    pub preserve_checkpoints: bool,
    pub key_defaults: KeyDefaults,
    pub layout: LayoutSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present, except for
    /// `preserve_checkpoints` which only the `--preserve` flag sets.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let database_dir = file
            .database_dir
            .map(PathBuf::from)
            .or_else(|| cli.database_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_DIR));

        if !database_dir.exists() {
            bail!("Database directory does not exist: {:?}", database_dir);
        }
        if !database_dir.is_dir() {
            bail!("database_dir is not a directory: {:?}", database_dir);
        }

        let preserve_checkpoints = cli.preserve_checkpoints;

        let keys = file.keys.unwrap_or_default();
        let key_defaults = KeyDefaults::new(keys.default_primary_value.unwrap_or_default());

        let layout_file = file.layout.unwrap_or_default();
        let defaults = LayoutSettings::default();
        let layout = LayoutSettings {
            new_column_width: layout_file
                .new_column_width
                .unwrap_or(defaults.new_column_width),
            min_column_width: layout_file
                .min_column_width
                .unwrap_or(defaults.min_column_width),
            new_genre_column_width: layout_file
                .new_genre_column_width
                .unwrap_or(defaults.new_genre_column_width),
        };
        if layout.min_column_width == 0 {
            bail!("min_column_width must be positive");
        }
        if layout.min_column_width > layout.new_column_width {
            bail!(
                "min_column_width ({}) exceeds new_column_width ({})",
                layout.min_column_width,
                layout.new_column_width
            );
        }

        Ok(Self {
            database_dir,
            preserve_checkpoints,
            key_defaults,
            layout,
        })
    }

    pub fn paths(&self) -> DatabasePaths {
        DatabasePaths::new(&self.database_dir)
    }
}
