//! Game Logic Module
//!
//! ## Module Structure
//!
//! - `words`: Difficulty levels and the word source
//! - `round`: Round engine (guesses, completion, scoring, snapshots)
//! - `error`: Errors shared by both

pub mod error;
pub mod round;
pub mod words;

// Re-export key types
pub use error::{GameError, GameResult};
pub use round::{Round, RoundSnapshot, GuessOutcome, CompletionOutcome};
pub use words::{Difficulty, WordSource};
