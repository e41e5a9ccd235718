use thiserror::Error;

use crate::round::{Phase, Transition};

/// Errors raised by the round engine
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GameError {
    #[error("cannot apply {via:?} while in {from:?}")]
    InvalidTransition { from: Phase, via: Transition },

    #[error("unknown game mode `{0}`")]
    UnknownMode(String),

    #[error("embedded content `{0}` is missing or malformed")]
    Content(String),
}

/// Errors raised by score repositories
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad timestamp `{0}`")]
    Timestamp(String),

    #[error("score store unavailable")]
    Unavailable,
}
