use super::fields::{Field, KeyedFields};
use crate::catalog::{Value, ValueGroup, Work};
use crate::error::{is_valid_key, EditError};
use crate::settings::GenreKeys;
use anyhow::Result;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyClass {
    Primary,
    Secondary,
}

impl KeyClass {
    pub fn name(&self) -> &'static str {
        match self {
            KeyClass::Primary => "primary",
            KeyClass::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for KeyClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Moves one key from `from_index` to `insert_index`. Both indices are
/// relative to the region they refer to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyMove {
    pub from_index: usize,
    pub insert_index: usize,
}

impl KeyMove {
    pub fn new(from_index: usize, insert_index: usize) -> Self {
        KeyMove {
            from_index,
            insert_index,
        }
    }

    fn within<T>(&self, list: &mut Vec<T>) -> Result<(), EditError> {
        check_index(self.from_index, list.len())?;
        check_index(self.insert_index, list.len())?;
        let item = list.remove(self.from_index);
        list.insert(self.insert_index, item);
        Ok(())
    }

    fn across<T>(&self, from: &mut Vec<T>, to: &mut Vec<T>) -> Result<(), EditError> {
        check_index(self.from_index, from.len())?;
        check_index(self.insert_index, to.len() + 1)?;
        let item = from.remove(self.from_index);
        to.insert(self.insert_index, item);
        Ok(())
    }
}

fn check_index(index: usize, len: usize) -> Result<(), EditError> {
    if index < len {
        Ok(())
    } else {
        Err(EditError::IndexOutOfRange { index, len })
    }
}

/// Values given to keys that appear without a previous value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyDefaults {
    /// Template for new primary keys; `{key}` expands to the key name.
    pub primary_template: String,
}

impl KeyDefaults {
    pub fn new<S: Into<String>>(primary_template: S) -> Self {
        KeyDefaults {
            primary_template: primary_template.into(),
        }
    }

    pub fn value(&self, class: KeyClass, key: &str) -> ValueGroup {
        match class {
            KeyClass::Primary => ValueGroup::single(self.primary_template.replace("{key}", key)),
            KeyClass::Secondary => ValueGroup::null(),
        }
    }
}

/// A structural change to the key lists of one genre.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaEdit {
    AddKey { key: String, class: KeyClass },
    DeleteKey { key: String },
    RenameKey { old_key: String, new_key: String },
    RearrangePrimary(KeyMove),
    RearrangeSecondary(KeyMove),
    /// `from_index` is a secondary index, `insert_index` a primary one.
    PromoteSecondary(KeyMove),
    /// `from_index` is a primary index, `insert_index` a secondary one.
    DemotePrimary(KeyMove),
}

impl SchemaEdit {
    pub fn name(&self) -> &'static str {
        match self {
            SchemaEdit::AddKey { .. } => "add_key",
            SchemaEdit::DeleteKey { .. } => "delete_key",
            SchemaEdit::RenameKey { .. } => "rename_key",
            SchemaEdit::RearrangePrimary(_) => "rearrange_primary",
            SchemaEdit::RearrangeSecondary(_) => "rearrange_secondary",
            SchemaEdit::PromoteSecondary(_) => "promote_secondary",
            SchemaEdit::DemotePrimary(_) => "demote_primary",
        }
    }

    /// A rearrangement to the same position changes nothing.
    pub fn is_noop(&self) -> bool {
        match self {
            SchemaEdit::RearrangePrimary(m) | SchemaEdit::RearrangeSecondary(m) => {
                m.from_index == m.insert_index
            }
            _ => false,
        }
    }

    /// Whether the edit changes the short projection of the genre, given
    /// the keys before the edit.
    pub fn touches_projection(&self, keys: &GenreKeys) -> bool {
        match self {
            SchemaEdit::AddKey { class, .. } => *class == KeyClass::Primary,
            SchemaEdit::DeleteKey { key } => keys.primary.contains(key),
            SchemaEdit::RenameKey { old_key, .. } => keys.primary.contains(old_key),
            SchemaEdit::RearrangePrimary(_)
            | SchemaEdit::PromoteSecondary(_)
            | SchemaEdit::DemotePrimary(_) => true,
            SchemaEdit::RearrangeSecondary(_) => false,
        }
    }

    /// Validates the edit against `keys` and returns the key lists after it.
    pub fn apply_to_keys(&self, genre: &str, keys: &GenreKeys) -> Result<GenreKeys, EditError> {
        let unknown = |key: &str| EditError::UnknownKey {
            genre: genre.to_string(),
            key: key.to_string(),
        };
        let duplicate = |key: &str| EditError::DuplicateKey {
            genre: genre.to_string(),
            key: key.to_string(),
        };

        let mut after = keys.clone();
        match self {
            SchemaEdit::AddKey { key, class } => {
                if !is_valid_key(key) {
                    return Err(EditError::InvalidKey(key.clone()));
                }
                if keys.contains(key) {
                    return Err(duplicate(key));
                }
                match class {
                    KeyClass::Primary => after.primary.push(key.clone()),
                    KeyClass::Secondary => after.secondary.push(key.clone()),
                }
            }
            SchemaEdit::DeleteKey { key } => {
                if let Some(index) = after.primary.iter().position(|k| k == key) {
                    if after.primary.len() == 1 {
                        return Err(EditError::LastPrimaryKey(genre.to_string()));
                    }
                    after.primary.remove(index);
                } else if let Some(index) = after.secondary.iter().position(|k| k == key) {
                    after.secondary.remove(index);
                } else {
                    return Err(unknown(key));
                }
            }
            SchemaEdit::RenameKey { old_key, new_key } => {
                if !is_valid_key(new_key) {
                    return Err(EditError::InvalidKey(new_key.clone()));
                }
                if keys.contains(new_key) {
                    return Err(duplicate(new_key));
                }
                let slot = after
                    .primary
                    .iter_mut()
                    .chain(after.secondary.iter_mut())
                    .find(|k| k.as_str() == old_key.as_str())
                    .ok_or_else(|| unknown(old_key))?;
                *slot = new_key.clone();
            }
            SchemaEdit::RearrangePrimary(m) => m.within(&mut after.primary)?,
            SchemaEdit::RearrangeSecondary(m) => m.within(&mut after.secondary)?,
            SchemaEdit::PromoteSecondary(m) => m.across(&mut after.secondary, &mut after.primary)?,
            SchemaEdit::DemotePrimary(m) => {
                if keys.primary.len() == 1 {
                    return Err(EditError::LastPrimaryKey(genre.to_string()));
                }
                m.across(&mut after.primary, &mut after.secondary)?
            }
        }
        Ok(after)
    }

    /// Applies the edit to one work whose metadata follows `keys`, the key
    /// lists before the edit. `short` is the work's current projection entry.
    /// Returns the work's new projection entry.
    pub fn apply_to_work(
        &self,
        keys: &GenreKeys,
        work: &mut Work,
        short: &[ValueGroup],
        defaults: &KeyDefaults,
    ) -> Result<Vec<ValueGroup>> {
        let mut fields = KeyedFields::from_metadata(keys, &work.metadata, short)?;
        self.apply_to_fields(keys, &mut fields, &mut work.nonce, defaults)?;
        work.metadata = fields.long_metadata();
        Ok(fields.short_metadata())
    }

    fn apply_to_fields(
        &self,
        keys: &GenreKeys,
        fields: &mut KeyedFields,
        nonce: &mut BTreeMap<String, ValueGroup>,
        defaults: &KeyDefaults,
    ) -> Result<(), EditError> {
        match self {
            SchemaEdit::AddKey { key, class } => {
                // A value orphaned by deleting a key of the same name wins
                // over the default.
                let long = nonce
                    .remove(key)
                    .unwrap_or_else(|| defaults.value(*class, key));
                let field = Field {
                    key: key.clone(),
                    value: Value::from_long(long),
                };
                match class {
                    KeyClass::Primary => fields.primary.push(field),
                    KeyClass::Secondary => fields.secondary.push(field),
                }
            }
            SchemaEdit::DeleteKey { key } => {
                let field = fields.remove(key).ok_or_else(|| EditError::UnknownKey {
                    genre: String::new(),
                    key: key.clone(),
                })?;
                if !field.value.long.is_null() {
                    nonce.insert(key.clone(), field.value.long);
                }
            }
            SchemaEdit::RenameKey { old_key, new_key } => {
                let class = if keys.primary.contains(old_key) {
                    KeyClass::Primary
                } else {
                    KeyClass::Secondary
                };
                let orphan = nonce.remove(new_key).unwrap_or_default();
                let field = fields.field_mut(old_key).ok_or_else(|| EditError::UnknownKey {
                    genre: String::new(),
                    key: old_key.clone(),
                })?;
                field.value = if field.value.long == defaults.value(class, old_key) {
                    // The key still holds the value it was created with.
                    if orphan.is_null() {
                        Value::from_long(defaults.value(class, new_key))
                    } else {
                        Value::from_long(orphan)
                    }
                } else {
                    field.value.clone() + Value::from_long(orphan)
                };
                field.key = new_key.clone();
            }
            SchemaEdit::RearrangePrimary(m) => m.within(&mut fields.primary)?,
            SchemaEdit::RearrangeSecondary(m) => m.within(&mut fields.secondary)?,
            SchemaEdit::PromoteSecondary(m) => m.across(&mut fields.secondary, &mut fields.primary)?,
            SchemaEdit::DemotePrimary(m) => m.across(&mut fields.primary, &mut fields.secondary)?,
        }
        Ok(())
    }
}
