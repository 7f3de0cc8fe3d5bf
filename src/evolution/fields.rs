//! Keyed view of a work's metadata.
//!
//! On disk, long metadata is a positional list aligned with primary keys then
//! secondary keys, and the short record is aligned with the primary keys.
//! Edits work on this keyed form instead and linearize it again when done.

use crate::catalog::{abbreviate_group, Value, ValueGroup};
use crate::settings::GenreKeys;
use anyhow::{bail, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub key: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyedFields {
    pub primary: Vec<Field>,
    pub secondary: Vec<Field>,
}

impl KeyedFields {
    /// Pairs each key with its long value and, for primary keys, its short
    /// value. The long metadata must hold exactly one value per key; a
    /// missing short value is derived from the long one.
    pub fn from_metadata(
        keys: &GenreKeys,
        long: &[ValueGroup],
        short: &[ValueGroup],
    ) -> Result<Self> {
        if long.len() != keys.len() {
            bail!(
                "Work holds {} values but its genre has {} keys",
                long.len(),
                keys.len()
            );
        }
        let long_at = |index: usize| long[index].clone();

        let primary = keys
            .primary
            .iter()
            .enumerate()
            .map(|(index, key)| {
                let long = long_at(index);
                let short = short
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| abbreviate_group(&long));
                Field {
                    key: key.clone(),
                    value: Value { long, short },
                }
            })
            .collect();

        let offset = keys.primary.len();
        let secondary = keys
            .secondary
            .iter()
            .enumerate()
            .map(|(index, key)| Field {
                key: key.clone(),
                value: Value::from_long(long_at(offset + index)),
            })
            .collect();

        Ok(KeyedFields { primary, secondary })
    }

    pub fn keys(&self) -> GenreKeys {
        GenreKeys {
            primary: self.primary.iter().map(|f| f.key.clone()).collect(),
            secondary: self.secondary.iter().map(|f| f.key.clone()).collect(),
        }
    }

    pub fn long_metadata(&self) -> Vec<ValueGroup> {
        self.primary
            .iter()
            .chain(self.secondary.iter())
            .map(|f| f.value.long.clone())
            .collect()
    }

    pub fn short_metadata(&self) -> Vec<ValueGroup> {
        self.primary.iter().map(|f| f.value.short.clone()).collect()
    }

    pub fn field_mut(&mut self, key: &str) -> Option<&mut Field> {
        self.primary
            .iter_mut()
            .chain(self.secondary.iter_mut())
            .find(|f| f.key == key)
    }

    /// Removes the field named `key` from whichever region holds it.
    pub fn remove(&mut self, key: &str) -> Option<Field> {
        for region in [&mut self.primary, &mut self.secondary] {
            if let Some(index) = region.iter().position(|f| f.key == key) {
                return Some(region.remove(index));
            }
        }
        None
    }
}
