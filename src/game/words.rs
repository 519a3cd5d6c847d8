//! Word Source
//!
//! Candidate answers per difficulty, read from line-oriented text files.
//! Each list is loaded at most once and then shared read-only.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::core::rng::RoundRng;
use crate::core::text::canonicalize;
use crate::game::error::{GameError, GameResult};

/// File holding the basic (single word) list.
pub const BASIC_WORDS_FILE: &str = "basic_words.txt";

/// File holding the intermediate (phrase) list.
pub const INTERMEDIATE_PHRASES_FILE: &str = "intermediate_phrases.txt";

// =============================================================================
// DIFFICULTY
// =============================================================================

/// Which candidate list answers are drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Single words.
    Basic,
    /// Multi-word phrases.
    Intermediate,
}

impl Difficulty {
    /// All difficulties, in menu order.
    pub const ALL: [Difficulty; 2] = [Difficulty::Basic, Difficulty::Intermediate];

    /// Wire / config name.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Basic => "basic",
            Difficulty::Intermediate => "intermediate",
        }
    }

    /// Human-readable level name.
    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Basic => "Basic Level",
            Difficulty::Intermediate => "Intermediate Level",
        }
    }

    /// Short description for the level picker.
    pub fn description(self) -> &'static str {
        match self {
            Difficulty::Basic => "Single words only",
            Difficulty::Intermediate => "Complete phrases",
        }
    }

    /// Word list file backing this difficulty.
    pub fn file_name(self) -> &'static str {
        match self {
            Difficulty::Basic => BASIC_WORDS_FILE,
            Difficulty::Intermediate => INTERMEDIATE_PHRASES_FILE,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Difficulty::Basic),
            "intermediate" => Ok(Difficulty::Intermediate),
            other => Err(GameError::InvalidArgument(format!(
                "invalid level: {other}. Must be 'basic' or 'intermediate'"
            ))),
        }
    }
}

// =============================================================================
// WORD SOURCE
// =============================================================================

/// Parse a word list: one entry per line, blank lines skipped, entries
/// trimmed and canonicalized.
pub fn parse_word_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(canonicalize)
        .collect()
}

/// Entries containing anything besides letters and spaces. Such a
/// character never counts as a hit, so it has to be guessed as a miss
/// before the entry can be completed.
pub fn count_non_letter_entries(entries: &[String]) -> usize {
    entries
        .iter()
        .filter(|e| !e.chars().all(|c| c == ' ' || c.is_alphabetic()))
        .count()
}

/// Read and parse a word list file.
pub fn load_word_list(path: &Path) -> GameResult<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            GameError::ResourceNotFound(path.to_path_buf())
        } else {
            GameError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let words = parse_word_list(&text);
    debug!("Loaded {} entries from {}", words.len(), path.display());
    Ok(words)
}

/// Supplies answers for each difficulty.
#[derive(Debug)]
pub struct WordSource {
    /// Directory containing the list files.
    dir: PathBuf,
    basic: OnceLock<Arc<[String]>>,
    intermediate: OnceLock<Arc<[String]>>,
}

impl WordSource {
    /// Source backed by the list files in `dir`. Nothing is read until a
    /// list is first needed (or [`WordSource::preload`] is called).
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            basic: OnceLock::new(),
            intermediate: OnceLock::new(),
        }
    }

    /// Source backed by in-memory lists. Entries are canonicalized.
    pub fn from_lists<B, I>(basic: B, intermediate: I) -> Self
    where
        B: IntoIterator,
        B::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let source = Self::from_dir(PathBuf::new());
        let _ = source.basic.set(Self::collect(basic));
        let _ = source.intermediate.set(Self::collect(intermediate));
        source
    }

    fn collect<T>(entries: T) -> Arc<[String]>
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        entries
            .into_iter()
            .map(|e| canonicalize(e.as_ref().trim()))
            .filter(|e| !e.is_empty())
            .collect()
    }

    fn cell(&self, difficulty: Difficulty) -> &OnceLock<Arc<[String]>> {
        match difficulty {
            Difficulty::Basic => &self.basic,
            Difficulty::Intermediate => &self.intermediate,
        }
    }

    /// The cached list for `difficulty`, loading it on first use.
    pub fn list(&self, difficulty: Difficulty) -> GameResult<Arc<[String]>> {
        let cell = self.cell(difficulty);
        if let Some(list) = cell.get() {
            return Ok(list.clone());
        }

        let path = self.dir.join(difficulty.file_name());
        let loaded: Arc<[String]> = load_word_list(&path)?.into();
        if loaded.is_empty() {
            warn!("Word list {} is empty", path.display());
        }
        let costly = count_non_letter_entries(&loaded);
        if costly > 0 {
            warn!(
                "{} entries in {} contain non-letter characters; each must be guessed and costs a life",
                costly,
                path.display()
            );
        }

        // A concurrent loader may have won; both read the same file.
        Ok(cell.get_or_init(|| loaded).clone())
    }

    /// Load every list now so the first round does not pay for file I/O.
    pub fn preload(&self) -> GameResult<()> {
        for difficulty in Difficulty::ALL {
            let list = self.list(difficulty)?;
            info!("Word list {}: {} entries", difficulty, list.len());
        }
        Ok(())
    }

    /// Draw a uniformly random answer for `difficulty`.
    pub fn pick_answer(&self, difficulty: Difficulty, rng: &mut RoundRng) -> GameResult<String> {
        let list = self.list(difficulty)?;
        rng.choose(&list[..])
            .cloned()
            .ok_or_else(|| GameError::EmptyCollection(difficulty.to_string()))
    }
}
