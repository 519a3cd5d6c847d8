//! Case folding and display rendering.
//!
//! Every comparison between a guess and an answer goes through
//! [`fold_char`], so the word lists, the guess path and the masking
//! algorithm all agree on one canonical (uppercase) form.

/// Placeholder shown for an unrevealed character.
pub const MASK_PLACEHOLDER: char = '_';

/// Glyph for a remaining life.
pub const FILLED_HEART: &str = "❤️";

/// Glyph for a lost life.
pub const EMPTY_HEART: &str = "🤍";

/// Fold a character to its canonical uppercase form.
///
/// Characters whose uppercase form is more than one character (e.g. `ß`)
/// are left unchanged so folding stays one-to-one per position.
#[inline]
pub fn fold_char(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

/// Fold a whole string to canonical form.
pub fn canonicalize(s: &str) -> String {
    s.chars().map(fold_char).collect()
}

/// Render the masked view of `answer` given the letters guessed so far.
///
/// Spaces are always shown. Any other character is shown as-is when its
/// folded form is in `guessed`, otherwise as [`MASK_PLACEHOLDER`]. The
/// output has exactly as many characters as `answer`.
pub fn format_display(answer: &str, guessed: &[char]) -> String {
    answer
        .chars()
        .map(|c| {
            if c == ' ' {
                ' '
            } else if guessed.iter().any(|&g| fold_char(g) == fold_char(c)) {
                c
            } else {
                MASK_PLACEHOLDER
            }
        })
        .collect()
}

/// Render `lives` filled hearts followed by `max - lives` empty ones.
pub fn format_lives(lives: u8, max: u8) -> String {
    let lives = lives.min(max);
    let mut out = FILLED_HEART.repeat(lives as usize);
    out.push_str(&EMPTY_HEART.repeat((max - lives) as usize));
    out
}
