//! Error type shared by the study layer, persistence and the CLI.
//!
//! The scheduler itself never fails; these errors only appear at the
//! boundaries where user input, files or the database are involved.

use thiserror::Error;

/// Errors that can occur outside the pure scheduling functions.
#[derive(Debug, Error)]
pub enum SrsError {
    /// A quality score that none of the four rating buttons produce.
    #[error("invalid quality {0}: expected 1 (again), 3 (hard), 4 (good) or 5 (easy)")]
    InvalidQuality(u8),

    /// A rating name that could not be parsed.
    #[error("unknown rating '{0}': expected again, hard, good or easy")]
    UnknownRating(String),

    /// The item is not in the known set.
    #[error("item '{0}' is not marked as known")]
    UnknownItem(String),

    /// A sync code that is not valid base64.
    #[error("invalid sync code: {0}")]
    InvalidSyncCode(String),

    /// A progress file with neither `known` nor `practiced`.
    #[error("invalid progress file: {0}")]
    InvalidSnapshot(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file exists but is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SrsError>;
