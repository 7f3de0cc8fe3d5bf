//! Derives the short form of a name, used in the per-genre projections.
//!
//! Forenames are dropped: "Miles Davis" becomes "Davis". Generational
//! suffixes stay attached to the surname, so "Martin Luther King Jr." becomes
//! "King Jr." and "John Smith III" becomes "Smith III".

use super::models::ValueGroup;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref GENERATIONAL_SUFFIX: Regex = Regex::new(r"^(?:I{2,3}|[JS]r\.*)$").unwrap();
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c.is_whitespace() || matches!(c, '&' | ',' | '-')
}

/// Abbreviates a single name.
///
/// Scanning left to right, the longest run of name characters that ends in
/// whitespace is removed, unless what follows the run is exactly a
/// generational suffix. In that case shorter runs are tried. The process
/// continues after each removal, so only the last word of a name survives.
pub fn abbreviate(name: &str) -> String {
    let chars: Vec<(usize, char)> = name.char_indices().collect();
    let mut out = String::with_capacity(name.len());
    let mut i = 0;
    while i < chars.len() {
        match removable_span_end(name, &chars, i) {
            Some(end) => i = end,
            None => {
                out.push(chars[i].1);
                i += 1;
            }
        }
    }
    out
}

/// Returns the char index one past the removable run starting at `start`.
fn removable_span_end(name: &str, chars: &[(usize, char)], start: usize) -> Option<usize> {
    let run_end = chars[start..]
        .iter()
        .position(|&(_, c)| !is_name_char(c))
        .map_or(chars.len(), |offset| start + offset);

    // The run needs at least one character before the trailing whitespace.
    for split in (start + 1..run_end).rev() {
        if !chars[split].1.is_whitespace() {
            continue;
        }
        let whitespace_end = (split..run_end)
            .find(|&j| !chars[j].1.is_whitespace())
            .unwrap_or(run_end);
        for end in (split + 1..=whitespace_end).rev() {
            let rest_offset = chars.get(end).map_or(name.len(), |&(offset, _)| offset);
            if !GENERATIONAL_SUFFIX.is_match(&name[rest_offset..]) {
                return Some(end);
            }
        }
    }
    None
}

/// Abbreviates each name of a group. The null group passes through.
pub fn abbreviate_group(group: &ValueGroup) -> ValueGroup {
    if group.is_null() {
        return ValueGroup::null();
    }
    ValueGroup::new(group.names().iter().map(|name| abbreviate(name)))
}
