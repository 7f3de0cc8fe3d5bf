use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Contents of the optional TOML config file. Every field is optional; a
/// value given here overrides the matching command-line flag. Whether the
/// undo stack survives startup is left to `--preserve` alone.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub database_dir: Option<String>,

    pub keys: Option<KeysConfig>,
    pub layout: Option<LayoutConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct KeysConfig {
    /// Value given to new primary keys; `{key}` expands to the key name.
    pub default_primary_value: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LayoutConfig {
    pub new_column_width: Option<u32>,
    pub min_column_width: Option<u32>,
    pub new_genre_column_width: Option<u32>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }
}
