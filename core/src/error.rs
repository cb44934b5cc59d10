use crate::types::Gameweek;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Squad size changed at gameweek {gameweek}: expected {expected}, got {actual}")]
    SquadSizeChanged { gameweek: Gameweek, expected: usize, actual: usize },

    #[error(
        "Invalid lineup: {starters} starters (expected {expected_starters}), \
         {bench} on the bench (expected {expected_bench})"
    )]
    LineupSize {
        starters:          usize,
        bench:             usize,
        expected_starters: usize,
        expected_bench:    usize,
    },

    #[error("Invalid transfer predicate: {0}")]
    InvalidPredicate(String),

    #[error("Player '{name}' not found in gameweek {gameweek}")]
    UnknownPlayer { name: String, gameweek: Gameweek },

    #[error("Season data contains no gameweeks")]
    EmptySeason,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
