//! Shared constants for end-to-end tests
//!
//! When the fixture database changes, update only this file and
//! `fixtures.rs`.

// ============================================================================
// Genres
// ============================================================================

pub const JAZZ: &str = "Jazz";
pub const CLASSICAL: &str = "Classical";

pub const JAZZ_PRIMARY: [&str; 2] = ["composer", "title"];
pub const JAZZ_SECONDARY: [&str; 2] = ["label", "year"];

pub const CLASSICAL_PRIMARY: [&str; 2] = ["composer", "work"];

// ============================================================================
// Recordings
// ============================================================================

/// "So What" by Miles Davis, one Jazz work.
pub const REC_1_UUID: &str = "rec-1";

/// "Peace Piece" by Bill Evans, one Jazz work.
pub const REC_2_UUID: &str = "rec-2";

/// A Jazz work at slot 0 ("Naima") and a Classical work at slot 1
/// (Mozart's Requiem).
pub const REC_3_UUID: &str = "rec-3";

/// Mozart's Piano Sonata No. 11, one Classical work.
pub const REC_4_UUID: &str = "rec-4";

pub const DATE_PLAYED: &str = "date played";
pub const DATE_CREATED: &str = "date created";
pub const TIMES_PLAYED: &str = "times played";
