//! Column layout of a genre's primary keys: width, filter button and sort
//! indicator, stored in four parallel settings sections.

use super::Editor;
use crate::checkpoint::CommentBuilder;
use crate::config::LayoutSettings;
use crate::error::EditError;
use crate::evolution::{KeyClass, SchemaEdit};
use crate::settings::{GenreKeys, Settings};
use anyhow::Result;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub width: u32,
    pub filter: bool,
    pub sort: bool,
}

impl ColumnLayout {
    fn new(width: u32) -> Self {
        ColumnLayout {
            width,
            filter: false,
            sort: false,
        }
    }
}

/// Layout of the first `count` columns of `genre`. Columns missing from the
/// stored sections get the default width and no flags.
pub(crate) fn columns(
    settings: &Settings,
    genre: &str,
    count: usize,
    layout: &LayoutSettings,
) -> Vec<ColumnLayout> {
    let widths = settings.column_widths.get(genre);
    let filters = settings.filter_config.get(genre);
    let sorts = settings.sort_indicators.get(genre);
    (0..count)
        .map(|i| ColumnLayout {
            width: widths
                .and_then(|w| w.get(i).copied())
                .unwrap_or(layout.new_column_width),
            filter: filters.is_some_and(|f| f.contains(&i)),
            sort: sorts.and_then(|s| s.get(i).copied()).unwrap_or(false),
        })
        .collect()
}

pub(crate) fn store_columns(settings: &mut Settings, genre: &str, columns: &[ColumnLayout]) {
    settings.column_widths.insert(
        genre.to_string(),
        columns.iter().map(|c| c.width).collect(),
    );
    settings.filter_config.insert(
        genre.to_string(),
        columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.filter)
            .map(|(i, _)| i)
            .collect(),
    );
    settings.sort_indicators.insert(
        genre.to_string(),
        columns.iter().map(|c| c.sort).collect(),
    );
    settings.random_config.entry(genre.to_string()).or_default();
}

/// Takes width for a new column from the existing ones, one unit per column
/// wider than `min` per pass, until `request` is met or nothing is left to
/// take. Returns the new column's width, never less than `min`.
pub fn steal_width(columns: &mut [ColumnLayout], request: u32, min: u32) -> u32 {
    let mut stolen = 0;
    while stolen < request {
        let mut took = false;
        for column in columns.iter_mut() {
            if stolen == request {
                break;
            }
            if column.width > min {
                column.width -= 1;
                stolen += 1;
                took = true;
            }
        }
        if !took {
            break;
        }
    }
    stolen.max(min)
}

/// Hands `width` back to the remaining columns, one unit per column in turn.
pub fn recover_width(columns: &mut [ColumnLayout], width: u32) {
    if columns.is_empty() {
        return;
    }
    let n = columns.len() as u32;
    let (share, rest) = (width / n, width % n);
    for (i, column) in columns.iter_mut().enumerate() {
        column.width += share + u32::from((i as u32) < rest);
    }
}

/// Exactly one sort indicator (the first set one, else the first column),
/// and never every column a filter button.
pub fn normalize(columns: &mut [ColumnLayout]) {
    if columns.is_empty() {
        return;
    }
    let sorted = columns.iter().position(|c| c.sort).unwrap_or(0);
    for (i, column) in columns.iter_mut().enumerate() {
        column.sort = i == sorted;
    }
    if columns.iter().all(|c| c.filter) {
        columns[0].filter = false;
    }
}

/// Keeps the layout of `genre` aligned with its primary keys after `edit`.
/// `keys` are the key lists before the edit.
pub(crate) fn update_for_edit(
    settings: &mut Settings,
    genre: &str,
    keys: &GenreKeys,
    edit: &SchemaEdit,
    layout: &LayoutSettings,
) {
    let mut cols = columns(settings, genre, keys.primary.len(), layout);
    match edit {
        SchemaEdit::AddKey {
            class: KeyClass::Primary,
            ..
        } => {
            let width = steal_width(&mut cols, layout.new_column_width, layout.min_column_width);
            cols.push(ColumnLayout::new(width));
        }
        SchemaEdit::PromoteSecondary(m) => {
            let width = steal_width(&mut cols, layout.new_column_width, layout.min_column_width);
            cols.insert(m.insert_index.min(cols.len()), ColumnLayout::new(width));
        }
        SchemaEdit::DeleteKey { key } => {
            if let Some(index) = keys.primary.iter().position(|k| k == key) {
                let removed = cols.remove(index);
                recover_width(&mut cols, removed.width);
            }
        }
        SchemaEdit::DemotePrimary(m) => {
            if m.from_index < cols.len() {
                let removed = cols.remove(m.from_index);
                recover_width(&mut cols, removed.width);
            }
        }
        SchemaEdit::RearrangePrimary(m) => {
            if m.from_index < cols.len() && m.insert_index < cols.len() {
                let column = cols.remove(m.from_index);
                cols.insert(m.insert_index, column);
            }
        }
        SchemaEdit::AddKey { .. } | SchemaEdit::RenameKey { .. } | SchemaEdit::RearrangeSecondary(_) => {
            return;
        }
    }
    normalize(&mut cols);
    debug!("Updated layout of {} for {}", genre, edit.name());
    store_columns(settings, genre, &cols);
}

/// Flips the sort indicator of column `index`. Setting it clears every
/// other indicator; clearing it moves the indicator to the first column.
pub(crate) fn toggle_sort(columns: &mut [ColumnLayout], index: usize) -> Result<(), EditError> {
    check_column(columns, index)?;
    let set = !columns[index].sort;
    for column in columns.iter_mut() {
        column.sort = false;
    }
    columns[index].sort = set;
    normalize(columns);
    Ok(())
}

pub(crate) fn toggle_filter(
    genre: &str,
    columns: &mut [ColumnLayout],
    index: usize,
) -> Result<(), EditError> {
    check_column(columns, index)?;
    columns[index].filter = !columns[index].filter;
    if columns.iter().all(|c| c.filter) {
        columns[index].filter = false;
        return Err(EditError::NoColumnLeft {
            genre: genre.to_string(),
            index,
        });
    }
    Ok(())
}

pub(crate) fn set_width(
    columns: &mut [ColumnLayout],
    index: usize,
    width: u32,
) -> Result<(), EditError> {
    check_column(columns, index)?;
    if width == 0 {
        return Err(EditError::InvalidColumnWidth(width));
    }
    columns[index].width = width;
    Ok(())
}

fn check_column(columns: &[ColumnLayout], index: usize) -> Result<(), EditError> {
    if index < columns.len() {
        Ok(())
    } else {
        Err(EditError::IndexOutOfRange {
            index,
            len: columns.len(),
        })
    }
}

// =============================================================================
// Editor operations
// =============================================================================

impl Editor {
    /// Current layout of the primary key columns of `genre`.
    pub fn columns(&self, genre: &str) -> Result<Vec<ColumnLayout>> {
        let keys = self.keys(genre)?;
        Ok(columns(
            self.settings.get(),
            genre,
            keys.primary.len(),
            &self.options.layout,
        ))
    }

    pub fn toggle_sort_indicator(&mut self, genre: &str, key: &str) -> Result<bool> {
        let comment = CommentBuilder::new("Changed sort column for key")
            .data(key)
            .text("in")
            .data(genre)
            .build();
        self.edit_columns(genre, key, comment, |cols, index| toggle_sort(cols, index))
    }

    pub fn toggle_filter_button(&mut self, genre: &str, key: &str) -> Result<bool> {
        let comment = CommentBuilder::new("Changed filter button state for key")
            .data(key)
            .text("in")
            .data(genre)
            .build();
        self.edit_columns(genre, key, comment, |cols, index| {
            toggle_filter(genre, cols, index)
        })
    }

    pub fn set_column_width(&mut self, genre: &str, key: &str, width: u32) -> Result<bool> {
        let comment = CommentBuilder::new("Changed column width for key")
            .data(key)
            .text("in")
            .data(genre)
            .build();
        self.edit_columns(genre, key, comment, |cols, index| {
            set_width(cols, index, width)
        })
    }

    /// Applies `change` to the column of primary key `key` on a copy of the
    /// layout first; only a valid, effective change is checkpointed and
    /// stored.
    fn edit_columns<F>(&mut self, genre: &str, key: &str, comment: String, change: F) -> Result<bool>
    where
        F: FnOnce(&mut [ColumnLayout], usize) -> Result<(), EditError>,
    {
        let index = self
            .keys(genre)?
            .primary
            .iter()
            .position(|k| k == key)
            .ok_or_else(|| EditError::UnknownKey {
                genre: genre.to_string(),
                key: key.to_string(),
            })?;
        let before = self.columns(genre)?;
        let mut after = before.clone();
        change(&mut after, index)?;
        normalize(&mut after);
        if after == before {
            return Ok(false);
        }

        self.checkpointed(comment, |editor| {
            editor.settings.modify(|settings| {
                store_columns(settings, genre, &after);
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
    use crate::evolution::KeyMove;

    fn widths(widths: &[u32]) -> Vec<ColumnLayout> {
        widths.iter().map(|&w| ColumnLayout::new(w)).collect()
    }

    fn width_list(columns: &[ColumnLayout]) -> Vec<u32> {
        columns.iter().map(|c| c.width).collect()
    }

    #[test]
    fn test_steal_width() {
        let mut cols = widths(&[80, 80]);
        assert_eq!(steal_width(&mut cols, 50, 30), 50);
        assert_eq!(width_list(&cols), vec![55, 55]);

        let mut cols = widths(&[40, 31, 30]);
        assert_eq!(steal_width(&mut cols, 50, 30), 30);
        assert_eq!(width_list(&cols), vec![30, 30, 30]);

        let mut cols = widths(&[100]);
        assert_eq!(steal_width(&mut cols, 50, 30), 50);
        assert_eq!(width_list(&cols), vec![50]);
    }

    #[test]
    fn test_steal_width_without_columns() {
        let mut cols = Vec::new();
        assert_eq!(steal_width(&mut cols, 50, 30), 30);
    }

    #[test]
    fn test_recover_width() {
        let mut cols = widths(&[30, 30, 30]);
        recover_width(&mut cols, 50);
        assert_eq!(width_list(&cols), vec![47, 47, 46]);
    }

    #[test]
    fn test_normalize() {
        let mut cols = widths(&[50, 50]);
        cols[0].filter = true;
        cols[1].filter = true;
        cols[1].sort = true;
        normalize(&mut cols);
        assert!(!cols[0].filter);
        assert!(cols[1].filter);
        assert_eq!(cols.iter().filter(|c| c.sort).count(), 1);
        assert!(cols[1].sort);

        let mut cols = widths(&[50, 50]);
        normalize(&mut cols);
        assert!(cols[0].sort);
    }

    #[test]
    fn test_toggle_sort() {
        let mut cols = widths(&[50, 50, 50]);
        normalize(&mut cols);

        toggle_sort(&mut cols, 2).unwrap();
        assert_eq!(
            cols.iter().map(|c| c.sort).collect::<Vec<_>>(),
            vec![false, false, true]
        );
        toggle_sort(&mut cols, 2).unwrap();
        assert_eq!(
            cols.iter().map(|c| c.sort).collect::<Vec<_>>(),
            vec![true, false, false]
        );
    }

    #[test]
    fn test_toggle_filter_keeps_one_column() {
        let mut cols = widths(&[50, 50]);
        toggle_filter("Jazz", &mut cols, 0).unwrap();
        let err = toggle_filter("Jazz", &mut cols, 1).unwrap_err();
        assert_eq!(
            err,
            EditError::NoColumnLeft {
                genre: "Jazz".to_string(),
                index: 1
            }
        );
        assert!(cols[0].filter);
        assert!(!cols[1].filter);
    }

    #[test]
    fn test_update_for_edit_follows_primary_keys() {
        let layout = LayoutSettings::default();
        let mut settings = Settings::default();
        settings.init_layout("Jazz", 2, 80);
        settings.filter_config.insert("Jazz".to_string(), vec![1]);
        let keys = GenreKeys::new(vec!["composer", "title"], vec!["label"]);

        update_for_edit(
            &mut settings,
            "Jazz",
            &keys,
            &SchemaEdit::RearrangePrimary(KeyMove::new(1, 0)),
            &layout,
        );
        assert_eq!(settings.filter_config["Jazz"], vec![0]);
        assert_eq!(settings.sort_indicators["Jazz"], vec![false, true]);

        update_for_edit(
            &mut settings,
            "Jazz",
            &keys,
            &SchemaEdit::DeleteKey {
                key: "composer".to_string(),
            },
            &layout,
        );
        assert_eq!(settings.column_widths["Jazz"], vec![160]);
        assert!(settings.filter_config["Jazz"].is_empty());
        assert_eq!(settings.sort_indicators["Jazz"], vec![true]);
    }

    #[test]
    fn test_secondary_edit_leaves_layout() {
        let layout = LayoutSettings::default();
        let mut settings = Settings::default();
        settings.init_layout("Jazz", 2, 80);
        let before = settings.column_widths.clone();

        update_for_edit(
            &mut settings,
            "Jazz",
            &GenreKeys::new(vec!["composer", "title"], vec!["label"]),
            &SchemaEdit::AddKey {
                key: "year".to_string(),
                class: KeyClass::Secondary,
            },
            &layout,
        );
        assert_eq!(settings.column_widths, before);
    }

    #[test]
    fn test_editor_layout_edits() {
        let mut t = create_test_editor();

        assert!(t.editor.set_column_width("Jazz", "title", 120).unwrap());
        assert!(!t.editor.set_column_width("Jazz", "title", 120).unwrap());
        assert_eq!(t.editor.settings().column_widths["Jazz"], vec![80, 120]);

        assert!(t.editor.toggle_sort_indicator("Jazz", "title").unwrap());
        assert_eq!(t.editor.settings().sort_indicators["Jazz"], vec![false, true]);

        let err = t.editor.toggle_filter_button("Jazz", "label").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EditError>(),
            Some(EditError::UnknownKey { .. })
        ));

        t.editor.undo().unwrap();
        assert_eq!(t.editor.settings().sort_indicators["Jazz"], vec![true, false]);
    }
}
