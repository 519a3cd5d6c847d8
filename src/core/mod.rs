//! Core primitives.
//!
//! Case folding, display rendering and the seeded answer RNG. Nothing in
//! here knows about rounds or sessions.

pub mod rng;
pub mod text;

// Re-export core types
pub use rng::{RoundRng, derive_round_seed};
pub use text::{canonicalize, fold_char, format_display, format_lives};
