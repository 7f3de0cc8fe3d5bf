//! Typed sections of `metadata/config.json`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettingsSection {
    GenreSpec,
    ColumnWidths,
    FilterConfig,
    RandomConfig,
    SortIndicators,
    UserProps,
    Geometry,
    TrackmetadataKeys,
    Completers,
}

impl SettingsSection {
    /// Sections holding per-genre layout state, keyed by genre name.
    pub const GENRE_LAYOUT: [SettingsSection; 4] = [
        SettingsSection::ColumnWidths,
        SettingsSection::FilterConfig,
        SettingsSection::RandomConfig,
        SettingsSection::SortIndicators,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SettingsSection::GenreSpec => "genre spec",
            SettingsSection::ColumnWidths => "column widths",
            SettingsSection::FilterConfig => "filter config",
            SettingsSection::RandomConfig => "random config",
            SettingsSection::SortIndicators => "sort indicators",
            SettingsSection::UserProps => "user props",
            SettingsSection::Geometry => "geometry",
            SettingsSection::TrackmetadataKeys => "trackmetadata keys",
            SettingsSection::Completers => "completers",
        }
    }
}

impl std::fmt::Display for SettingsSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Genre spec
// =============================================================================

/// Ordered key lists of one genre.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreKeys {
    pub primary: Vec<String>,
    #[serde(default)]
    pub secondary: Vec<String>,
}

impl GenreKeys {
    pub fn new<S: Into<String>>(primary: Vec<S>, secondary: Vec<S>) -> Self {
        GenreKeys {
            primary: primary.into_iter().map(Into::into).collect(),
            secondary: secondary.into_iter().map(Into::into).collect(),
        }
    }

    /// Primary keys followed by secondary keys, the order of a work's long
    /// metadata.
    pub fn all_keys(&self) -> Vec<String> {
        self.primary
            .iter()
            .chain(self.secondary.iter())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.secondary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.primary.iter().chain(self.secondary.iter()).any(|k| k == key)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreEntry {
    pub name: String,
    #[serde(flatten)]
    pub keys: GenreKeys,
}

// =============================================================================
// Other sections
// =============================================================================

/// Random-play state of a genre: (position, enabled).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomConfig(pub u32, pub bool);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleterFlags {
    pub enabled: bool,
    pub learn: bool,
}

impl Default for CompleterFlags {
    fn default() -> Self {
        CompleterFlags {
            enabled: true,
            learn: true,
        }
    }
}

pub const GEOMETRY_KEYS: [&str; 5] = [
    "window_width",
    "window_height",
    "right_panel_width",
    "selector_paned_position",
    "import_paned_position",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    pub window_width: u32,
    pub window_height: u32,
    pub right_panel_width: u32,
    pub selector_paned_position: u32,
    pub import_paned_position: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry {
            window_width: 800,
            window_height: 480,
            right_panel_width: 341,
            selector_paned_position: 254,
            import_paned_position: 160,
        }
    }
}

impl Geometry {
    pub fn get(&self, name: &str) -> Option<u32> {
        match name {
            "window_width" => Some(self.window_width),
            "window_height" => Some(self.window_height),
            "right_panel_width" => Some(self.right_panel_width),
            "selector_paned_position" => Some(self.selector_paned_position),
            "import_paned_position" => Some(self.import_paned_position),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut u32> {
        match name {
            "window_width" => Some(&mut self.window_width),
            "window_height" => Some(&mut self.window_height),
            "right_panel_width" => Some(&mut self.right_panel_width),
            "selector_paned_position" => Some(&mut self.selector_paned_position),
            "import_paned_position" => Some(&mut self.import_paned_position),
            _ => None,
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Genres in display order.
    pub genre_spec: Vec<GenreEntry>,
    pub column_widths: BTreeMap<String, Vec<u32>>,
    /// Indices of the primary columns shown as filter buttons.
    pub filter_config: BTreeMap<String, Vec<usize>>,
    pub random_config: BTreeMap<String, RandomConfig>,
    pub sort_indicators: BTreeMap<String, Vec<bool>>,
    pub user_props: Vec<String>,
    pub geometry: Geometry,
    pub trackmetadata_keys: Vec<String>,
    pub completers: BTreeMap<String, CompleterFlags>,
    /// Sections this program does not manage, kept as found.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Settings {
    pub fn genre(&self, name: &str) -> Option<&GenreEntry> {
        self.genre_spec.iter().find(|entry| entry.name == name)
    }

    pub fn genre_mut(&mut self, name: &str) -> Option<&mut GenreEntry> {
        self.genre_spec.iter_mut().find(|entry| entry.name == name)
    }

    pub fn genre_names(&self) -> Vec<String> {
        self.genre_spec.iter().map(|entry| entry.name.clone()).collect()
    }

    /// Layout sections with no entry for `genre`.
    pub fn missing_layout(&self, genre: &str) -> Vec<SettingsSection> {
        SettingsSection::GENRE_LAYOUT
            .into_iter()
            .filter(|section| match section {
                SettingsSection::ColumnWidths => !self.column_widths.contains_key(genre),
                SettingsSection::FilterConfig => !self.filter_config.contains_key(genre),
                SettingsSection::RandomConfig => !self.random_config.contains_key(genre),
                SettingsSection::SortIndicators => !self.sort_indicators.contains_key(genre),
                _ => false,
            })
            .collect()
    }

    /// Fills every missing layout entry of `genre` for a genre with
    /// `columns` primary keys.
    pub fn init_layout(&mut self, genre: &str, columns: usize, column_width: u32) {
        self.column_widths
            .entry(genre.to_string())
            .or_insert_with(|| vec![column_width; columns.max(1)]);
        self.filter_config.entry(genre.to_string()).or_default();
        self.random_config.entry(genre.to_string()).or_default();
        self.sort_indicators.entry(genre.to_string()).or_insert_with(|| {
            let mut sorts = vec![false; columns.max(1)];
            sorts[0] = true;
            sorts
        });
    }

    pub fn rename_layout(&mut self, old_genre: &str, new_genre: &str) {
        fn rename<V>(map: &mut BTreeMap<String, V>, old: &str, new: &str) {
            if let Some(value) = map.remove(old) {
                map.insert(new.to_string(), value);
            }
        }
        rename(&mut self.column_widths, old_genre, new_genre);
        rename(&mut self.filter_config, old_genre, new_genre);
        rename(&mut self.random_config, old_genre, new_genre);
        rename(&mut self.sort_indicators, old_genre, new_genre);
    }

    pub fn remove_layout(&mut self, genre: &str) {
        self.column_widths.remove(genre);
        self.filter_config.remove(genre);
        self.random_config.remove(genre);
        self.sort_indicators.remove(genre);
    }
}
