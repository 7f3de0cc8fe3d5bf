use thiserror::Error;

/// Rejections of an edit request. They are raised before a checkpoint is
/// taken or any store is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("Invalid key name: {0:?}")]
    InvalidKey(String),

    #[error("Key {key} already exists in genre {genre}")]
    DuplicateKey { genre: String, key: String },

    #[error("Unknown key {key} in genre {genre}")]
    UnknownKey { genre: String, key: String },

    #[error("Unknown genre: {0}")]
    UnknownGenre(String),

    #[error("Genre {0} already exists")]
    DuplicateGenre(String),

    #[error("Invalid genre name: {0:?}")]
    InvalidGenreName(String),

    #[error("Index {index} out of range for {len} keys")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Genre {0} must keep at least one primary key")]
    LastPrimaryKey(String),

    #[error("New genre order is not a permutation of the existing genres")]
    InvalidGenreOrder,

    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    #[error("Property {0} already exists")]
    DuplicateProperty(String),

    #[error("Invalid property name: {0:?}")]
    InvalidPropertyName(String),

    #[error("Unknown completer: {0}")]
    UnknownCompleter(String),

    #[error("Completer {0} already exists")]
    DuplicateCompleter(String),

    #[error("Invalid completer name: {0:?}")]
    InvalidCompleterName(String),

    #[error("Unknown geometry parameter: {0}")]
    UnknownGeometry(String),

    #[error("Unknown track metadata key: {0}")]
    UnknownTrackmetadataKey(String),

    #[error("Track metadata key {0} already exists")]
    DuplicateTrackmetadataKey(String),

    #[error("Column {index} of genre {genre} cannot become a filter button, no column would be left")]
    NoColumnLeft { genre: String, index: usize },

    #[error("Invalid column width {0}")]
    InvalidColumnWidth(u32),
}

/// Whether `name` can be used as a metadata key: a letter or underscore
/// followed by letters, digits and underscores.
pub fn is_valid_key(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Whether `name` can be used as a file name inside the metadata tree.
pub fn is_valid_file_name(name: &str) -> bool {
    !name.is_empty()
        && name.trim() == name
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
}

/// Appends `_1`, `_2`, ... to `base` until it is not in `existing`.
pub fn make_unique<S: AsRef<str>>(base: &str, existing: &[S]) -> String {
    let taken = |candidate: &str| existing.iter().any(|e| e.as_ref() == candidate);
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|i| format!("{}_{}", base, i))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}
