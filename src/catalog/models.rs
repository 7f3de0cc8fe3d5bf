//! Catalog entities stored in the record store.
//!
//! A [`Recording`] is one imported disc (or set of discs). It holds one or
//! more [`Work`]s, each belonging to a genre and carrying "long metadata":
//! one [`ValueGroup`] per key of the genre, positionally aligned with the
//! genre's primary keys followed by its secondary keys.

use super::abbreviation::abbreviate_group;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Values
// =============================================================================

/// An ordered group of names forming one metadata value, e.g. the two
/// co-authors of a work.
///
/// The distinguished null group holds a single empty string and stands for
/// "no value".
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueGroup(Vec<String>);

impl ValueGroup {
    pub fn null() -> Self {
        ValueGroup(vec![String::new()])
    }

    /// Builds a group from names. An empty iterator yields the null group.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            Self::null()
        } else {
            ValueGroup(names)
        }
    }

    pub fn single<S: Into<String>>(name: S) -> Self {
        ValueGroup(vec![name.into()])
    }

    pub fn is_null(&self) -> bool {
        self.0.is_empty() || (self.0.len() == 1 && self.0[0].is_empty())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Null-additive concatenation: the null group is the identity.
    pub fn concat(&self, other: &ValueGroup) -> ValueGroup {
        if other.is_null() {
            self.clone()
        } else if self.is_null() {
            other.clone()
        } else {
            ValueGroup(self.0.iter().chain(other.0.iter()).cloned().collect())
        }
    }
}

impl Default for ValueGroup {
    fn default() -> Self {
        Self::null()
    }
}

impl From<&str> for ValueGroup {
    fn from(name: &str) -> Self {
        ValueGroup::single(name)
    }
}

impl std::fmt::Display for ValueGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

/// A metadata value in both its long and its abbreviated form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Value {
    pub long: ValueGroup,
    pub short: ValueGroup,
}

impl Value {
    pub fn null() -> Self {
        Value {
            long: ValueGroup::null(),
            short: ValueGroup::null(),
        }
    }

    /// Pairs a long value with its computed abbreviation.
    pub fn from_long(long: ValueGroup) -> Self {
        let short = abbreviate_group(&long);
        Value { long, short }
    }
}

impl std::ops::Add for Value {
    type Output = Value;

    /// Combining with a null value yields the other value unchanged; two real
    /// values are concatenated group-wise.
    fn add(self, other: Value) -> Value {
        if other.long.is_null() {
            self
        } else if self.long.is_null() {
            other
        } else {
            Value {
                long: self.long.concat(&other.long),
                short: self.short.concat(&other.short),
            }
        }
    }
}

// =============================================================================
// Tracks
// =============================================================================

/// (disc number, track number)
pub type TrackId = (i32, i32);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub disc_num: i32,
    pub track_num: i32,
    pub title: String,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub metadata: Vec<(String, Vec<String>)>,
}

impl Track {
    pub fn track_id(&self) -> TrackId {
        (self.disc_num, self.track_num)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackGroup {
    pub title: String,
    pub tracks: Vec<TrackId>,
}

// =============================================================================
// Works and recordings
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    pub genre: String,
    /// One value per key of the genre: primary keys first, then secondary.
    pub metadata: Vec<ValueGroup>,
    /// Values orphaned by key deletion, keyed by the deleted key's name.
    #[serde(default)]
    pub nonce: BTreeMap<String, ValueGroup>,
    #[serde(default)]
    pub tracks: Vec<TrackId>,
    #[serde(default)]
    pub trackgroups: Vec<TrackGroup>,
}

impl Work {
    pub fn new<S: Into<String>>(genre: S, metadata: Vec<ValueGroup>) -> Self {
        Work {
            genre: genre.into(),
            metadata,
            nonce: BTreeMap::new(),
            tracks: Vec::new(),
            trackgroups: Vec::new(),
        }
    }

    /// Looks up the value stored for `key`, given the genre's full key list.
    pub fn value_of(&self, all_keys: &[String], key: &str) -> Option<&ValueGroup> {
        all_keys
            .iter()
            .position(|k| k == key)
            .and_then(|index| self.metadata.get(index))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub uuid: String,
    pub works: BTreeMap<u32, Work>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub props: Vec<(String, ValueGroup)>,
    #[serde(default)]
    pub discids: Vec<String>,
}

impl Recording {
    /// Creates an empty recording with a freshly minted identifier.
    pub fn new() -> Self {
        Recording {
            uuid: uuid::Uuid::new_v4().to_string(),
            works: BTreeMap::new(),
            tracks: Vec::new(),
            props: Vec::new(),
            discids: Vec::new(),
        }
    }

    pub fn prop(&self, name: &str) -> Option<&ValueGroup> {
        self.props
            .iter()
            .find(|(prop, _)| prop == name)
            .map(|(_, value)| value)
    }

    /// Sets a property, appending it when absent.
    pub fn set_prop(&mut self, name: &str, value: ValueGroup) {
        match self.props.iter_mut().find(|(prop, _)| prop == name) {
            Some((_, existing)) => *existing = value,
            None => self.props.push((name.to_string(), value)),
        }
    }
}

impl Default for Recording {
    fn default() -> Self {
        Self::new()
    }
}
