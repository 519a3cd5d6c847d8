//! # Hangman Game Server
//!
//! Letter-guessing game served over WebSocket. Each connected player gets a
//! session holding one round; a round chains answers together until the
//! player runs out of lives.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HANGMAN SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Pure helpers                              │
//! │  ├── rng.rs      - Seeded Xorshift128+ for answer draws      │
//! │  └── text.rs     - Case folding, masking, heart rendering    │
//! │                                                              │
//! │  game/           - Game logic (no I/O beyond word files)     │
//! │  ├── words.rs    - Difficulty levels and cached word lists   │
//! │  ├── round.rs    - Guesses, completion, scoring, snapshots   │
//! │  └── error.rs    - Game errors                               │
//! │                                                              │
//! │  network/        - Networking                                │
//! │  ├── server.rs   - WebSocket server                          │
//! │  ├── protocol.rs - Message types                             │
//! │  └── session.rs  - Per-player session management             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! - Every answer starts with [`MAX_LIVES`] lives; a wrong guess costs one.
//! - Solving an answer scores a point and draws the next one immediately.
//! - The round ends when lives reach zero. Starting a new round resets the
//!   score.
//!
//! Guesses are case-insensitive. Answers and guesses are folded to upper
//! case before comparison.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::rng::RoundRng;
pub use core::text::{format_display, format_lives};
pub use game::error::{GameError, GameResult};
pub use game::round::{Round, RoundSnapshot};
pub use game::words::{Difficulty, WordSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lives granted for each answer
pub const MAX_LIVES: u8 = 6;

/// Seconds a player has for each guess before the client reports `time_up`
pub const GUESS_TIME_LIMIT_SECS: u32 = 15;
