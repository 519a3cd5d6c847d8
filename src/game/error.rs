//! Game Errors
//!
//! Failures raised by the word source and the round engine. None of them
//! are transient; callers surface them immediately.

use std::path::PathBuf;

/// Errors produced by the game core.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Unknown difficulty or malformed guess.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Word list file does not exist.
    #[error("Word list not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    /// Word list exists but has no entries.
    #[error("Word list for {0} is empty")]
    EmptyCollection(String),

    /// Operation not allowed in the round's current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Word list could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for game operations.
pub type GameResult<T> = Result<T, GameError>;
