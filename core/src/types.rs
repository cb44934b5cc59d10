//! Shared primitive types used across the entire simulation.

/// A gameweek number. Not necessarily contiguous within a season.
pub type Gameweek = u32;

/// A stable, unique player identifier (the player's name in source data).
pub type PlayerName = String;

/// The canonical run identifier.
pub type RunId = String;

/// Actual FPL points scored in a gameweek.
pub type Points = i64;
