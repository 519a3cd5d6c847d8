//! Round Engine
//!
//! A [`Round`] owns everything that changes while a player works through
//! answers: the current answer, guessed and missed letters, lives and the
//! running score. Completing an answer draws the next one and keeps the
//! score; running out of lives ends the round.

use std::sync::Arc;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::MAX_LIVES;
use crate::core::rng::RoundRng;
use crate::core::text::{fold_char, format_display, format_lives};
use crate::game::error::{GameError, GameResult};
use crate::game::words::{Difficulty, WordSource};

/// Reply to a new, correct letter.
pub const MSG_CORRECT_GUESS: &str = "Good guess!";
/// Reply to a new, wrong letter.
pub const MSG_WRONG_GUESS: &str = "Wrong letter!";
/// Reply to a repeated letter.
pub const MSG_DUPLICATE_GUESS: &str = "Letter already guessed!";
/// Reply when the guess timer ran out.
pub const MSG_TIMEOUT: &str = "Time is up!";
/// Reply when an answer has been fully revealed.
pub const MSG_WORD_COMPLETED: &str = "Word completed! Great job!";
/// Status shown with one life left.
pub const MSG_LAST_LIFE: &str = "Last chance! Be careful!";

/// True iff every non-space character of `answer` has been guessed.
pub fn is_complete(answer: &str, guessed: &[char]) -> bool {
    answer
        .chars()
        .filter(|&c| c != ' ')
        .all(|c| guessed.contains(&fold_char(c)))
}

/// Result of a single guess (or an expired guess timer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessOutcome {
    /// Folded letter that was guessed; `None` for a timeout.
    pub letter: Option<char>,
    /// Letter occurs in the answer.
    pub correct: bool,
    /// Letter had already been guessed; nothing changed.
    pub duplicate: bool,
    /// Player-facing message.
    pub message: String,
}

impl GuessOutcome {
    fn new(letter: Option<char>, correct: bool, duplicate: bool, message: &str) -> Self {
        Self {
            letter,
            correct,
            duplicate,
            message: message.to_string(),
        }
    }
}

/// Result of checking whether the current answer is solved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    /// Answer was solved and replaced.
    pub completed: bool,
    /// The answer that was just solved.
    pub completed_answer: Option<String>,
    /// Score after this check.
    pub score: u32,
    /// Player-facing message.
    pub message: String,
}

/// Externally visible view of a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    /// Masked answer.
    pub display: String,
    /// Letters guessed for the current answer, in guess order.
    pub guessed: Vec<char>,
    /// Guessed letters not in the answer.
    pub missed: Vec<char>,
    /// Lives remaining.
    pub lives: u8,
    /// Lives at the start of each answer.
    pub max_lives: u8,
    /// Lives rendered as hearts.
    pub lives_display: String,
    /// Answers solved this round.
    pub score: u32,
    /// No lives left.
    pub over: bool,
    /// Round difficulty.
    pub difficulty: Difficulty,
    /// Unmasked answer, for reveal once the round is over.
    pub answer: String,
    /// Status line for the player.
    pub status: String,
    /// Answers drawn so far, including the current one.
    pub words_attempted: u32,
}

/// One player's game: a run of answers at a fixed difficulty.
#[derive(Debug)]
pub struct Round {
    difficulty: Difficulty,
    answer: String,
    guessed: Vec<char>,
    missed: Vec<char>,
    lives: u8,
    score: u32,
    words_attempted: u32,
    source: Arc<WordSource>,
    rng: RoundRng,
}

impl Round {
    /// Start a round for a difficulty given by name.
    ///
    /// Fails with [`GameError::InvalidArgument`] for an unknown difficulty,
    /// before any word is drawn.
    pub fn create(difficulty: &str, source: Arc<WordSource>, rng: RoundRng) -> GameResult<Self> {
        Self::new(difficulty.parse()?, source, rng)
    }

    /// Start a round, drawing its first answer.
    pub fn new(difficulty: Difficulty, source: Arc<WordSource>, mut rng: RoundRng) -> GameResult<Self> {
        let answer = source.pick_answer(difficulty, &mut rng)?;
        debug!("New {} round, answer length {}", difficulty, answer.chars().count());

        Ok(Self {
            difficulty,
            answer,
            guessed: Vec::new(),
            missed: Vec::new(),
            lives: MAX_LIVES,
            score: 0,
            words_attempted: 1,
            source,
            rng,
        })
    }

    /// Round difficulty.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Current (canonical) answer.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Letters guessed for the current answer.
    pub fn guessed(&self) -> &[char] {
        &self.guessed
    }

    /// Wrong letters for the current answer.
    pub fn missed(&self) -> &[char] {
        &self.missed
    }

    /// Lives remaining.
    pub fn lives(&self) -> u8 {
        self.lives
    }

    /// Answers solved.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Answers drawn, including the current one.
    pub fn words_attempted(&self) -> u32 {
        self.words_attempted
    }

    /// No lives left; the round accepts no more guesses.
    pub fn is_over(&self) -> bool {
        self.lives == 0
    }

    fn ensure_in_progress(&self) -> GameResult<()> {
        if self.is_over() {
            return Err(GameError::InvalidState(format!(
                "round is over with final score {}",
                self.score
            )));
        }
        Ok(())
    }

    /// Only letters can be hits; spaces and punctuation always miss.
    fn answer_contains(&self, letter: char) -> bool {
        letter.is_alphabetic() && self.answer.chars().any(|c| fold_char(c) == letter)
    }

    /// Guess one character.
    ///
    /// `letter` must be exactly one character; it is folded to uppercase.
    /// Repeats are reported as duplicates and change nothing. A new letter
    /// is recorded; if it misses it is also added to the missed list and
    /// costs a life.
    pub fn guess_letter(&mut self, letter: &str) -> GameResult<GuessOutcome> {
        self.ensure_in_progress()?;

        let mut chars = letter.chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(c), None) => fold_char(c),
            _ => {
                return Err(GameError::InvalidArgument(format!(
                    "expected a single letter, got {letter:?}"
                )))
            }
        };

        if self.guessed.contains(&letter) {
            return Ok(GuessOutcome::new(Some(letter), false, true, MSG_DUPLICATE_GUESS));
        }

        self.guessed.push(letter);

        if self.answer_contains(letter) {
            Ok(GuessOutcome::new(Some(letter), true, false, MSG_CORRECT_GUESS))
        } else {
            self.missed.push(letter);
            self.lives = self.lives.saturating_sub(1);
            Ok(GuessOutcome::new(Some(letter), false, false, MSG_WRONG_GUESS))
        }
    }

    /// The guess timer ran out: costs one life without recording a letter.
    pub fn expire_turn(&mut self) -> GameResult<GuessOutcome> {
        self.ensure_in_progress()?;
        self.lives = self.lives.saturating_sub(1);
        Ok(GuessOutcome::new(None, false, false, MSG_TIMEOUT))
    }

    /// Every non-space character of the answer has been guessed.
    pub fn check_completion(&self) -> bool {
        is_complete(&self.answer, &self.guessed)
    }

    /// Score the current answer if it is solved and move on to the next.
    ///
    /// The next answer is drawn before anything is mutated, so a failed
    /// draw leaves the round as it was. Unsolved answers, and rounds that
    /// are already over, are left untouched.
    pub fn resolve_completion(&mut self) -> GameResult<CompletionOutcome> {
        if self.is_over() || !self.check_completion() {
            return Ok(CompletionOutcome {
                completed: false,
                completed_answer: None,
                score: self.score,
                message: self.status_message(),
            });
        }

        let next = self.source.pick_answer(self.difficulty, &mut self.rng)?;
        let completed = std::mem::replace(&mut self.answer, next);

        self.score += 1;
        self.words_attempted += 1;
        self.guessed.clear();
        self.missed.clear();
        self.lives = MAX_LIVES;

        debug!("Solved {:?}, score now {}", completed, self.score);

        Ok(CompletionOutcome {
            completed: true,
            completed_answer: Some(completed),
            score: self.score,
            message: MSG_WORD_COMPLETED.to_string(),
        })
    }

    /// Status line for the current state.
    pub fn status_message(&self) -> String {
        match self.lives {
            0 => format!("Game Over! Final Score: {}", self.score),
            1 => MSG_LAST_LIFE.to_string(),
            n => format!("Keep guessing! {n} lives remaining."),
        }
    }

    /// Project the round into its externally visible form.
    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            display: format_display(&self.answer, &self.guessed),
            guessed: self.guessed.clone(),
            missed: self.missed.clone(),
            lives: self.lives,
            max_lives: MAX_LIVES,
            lives_display: format_lives(self.lives, MAX_LIVES),
            score: self.score,
            over: self.is_over(),
            difficulty: self.difficulty,
            answer: self.answer.clone(),
            status: self.status_message(),
            words_attempted: self.words_attempted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn round_with(basic: &[&str], phrases: &[&str]) -> Round {
        let source = Arc::new(WordSource::from_lists(basic, phrases));
        Round::new(Difficulty::Basic, source, RoundRng::new(42)).unwrap()
    }

    fn single_word_round(word: &str) -> Round {
        round_with(&[word], &["break a leg"])
    }

    fn solve(round: &mut Round) {
        let letters: Vec<char> = round.answer().chars().filter(|&c| c != ' ').collect();
        for c in letters {
            round.guess_letter(&c.to_string()).unwrap();
        }
        assert!(round.resolve_completion().unwrap().completed);
    }

    #[test]
    fn test_create_basic_round() {
        let round = single_word_round("python");

        assert_eq!(round.difficulty(), Difficulty::Basic);
        assert_eq!(round.answer(), "PYTHON");
        assert_eq!(round.lives(), MAX_LIVES);
        assert_eq!(round.score(), 0);
        assert!(round.guessed().is_empty());
        assert!(round.missed().is_empty());
        assert!(!round.is_over());
    }

    #[test]
    fn test_create_intermediate_round() {
        let source = Arc::new(WordSource::from_lists(["cat"], ["break a leg"]));
        let round = Round::create("intermediate", source, RoundRng::new(1)).unwrap();

        assert_eq!(round.difficulty(), Difficulty::Intermediate);
        assert_eq!(round.answer(), "BREAK A LEG");
    }

    #[test]
    fn test_create_invalid_difficulty() {
        let source = Arc::new(WordSource::from_lists(["cat"], ["break a leg"]));
        let result = Round::create("expert", source, RoundRng::new(1));

        assert!(matches!(result, Err(GameError::InvalidArgument(_))));
    }

    #[test]
    fn test_create_with_empty_list_fails() {
        let empty: [&str; 0] = [];
        let source = Arc::new(WordSource::from_lists(empty, ["break a leg"]));
        let result = Round::create("basic", source, RoundRng::new(1));

        assert!(matches!(result, Err(GameError::EmptyCollection(_))));
    }

    #[test]
    fn test_correct_guess_keeps_lives() {
        let mut round = single_word_round("python");
        let outcome = round.guess_letter("p").unwrap();

        assert!(outcome.correct);
        assert!(!outcome.duplicate);
        assert_eq!(outcome.letter, Some('P'));
        assert_eq!(outcome.message, MSG_CORRECT_GUESS);
        assert_eq!(round.lives(), MAX_LIVES);
        assert_eq!(round.guessed(), ['P']);
        assert!(round.missed().is_empty());
    }

    #[test]
    fn test_wrong_guess_costs_one_life() {
        let mut round = single_word_round("python");
        let outcome = round.guess_letter("Z").unwrap();

        assert!(!outcome.correct);
        assert_eq!(outcome.message, MSG_WRONG_GUESS);
        assert_eq!(round.lives(), MAX_LIVES - 1);
        assert_eq!(round.missed(), ['Z']);
        assert_eq!(round.guessed(), ['Z']);
    }

    #[test]
    fn test_duplicate_guess_is_idempotent() {
        let mut round = single_word_round("python");
        round.guess_letter("Z").unwrap();
        round.guess_letter("P").unwrap();

        let lives = round.lives();
        let guessed = round.guessed().len();

        for letter in ["z", "Z", "p"] {
            let outcome = round.guess_letter(letter).unwrap();
            assert!(outcome.duplicate);
            assert!(!outcome.correct);
            assert_eq!(outcome.message, MSG_DUPLICATE_GUESS);
        }

        assert_eq!(round.lives(), lives);
        assert_eq!(round.guessed().len(), guessed);
        assert_eq!(round.score(), 0);
    }

    #[test]
    fn test_space_is_always_a_miss() {
        let mut round = round_with(&["cat"], &["break a leg"]);
        let mut round_phrase = Round::new(
            Difficulty::Intermediate,
            Arc::new(WordSource::from_lists(["cat"], ["break a leg"])),
            RoundRng::new(3),
        )
        .unwrap();

        assert!(!round.guess_letter(" ").unwrap().correct);
        assert!(!round_phrase.guess_letter(" ").unwrap().correct);
        assert_eq!(round_phrase.lives(), MAX_LIVES - 1);
        assert_eq!(round_phrase.missed(), [' ']);
    }

    #[test]
    fn test_malformed_letter_rejected() {
        let mut round = single_word_round("python");

        for bad in ["", "ab", "PY"] {
            let result = round.guess_letter(bad);
            assert!(matches!(result, Err(GameError::InvalidArgument(_))));
        }
        assert!(round.guessed().is_empty());
        assert_eq!(round.lives(), MAX_LIVES);
    }

    #[test]
    fn test_lives_floor_and_game_over() {
        let mut round = single_word_round("python");

        for letter in ["A", "B", "C", "D", "E", "F"] {
            round.guess_letter(letter).unwrap();
        }

        assert_eq!(round.lives(), 0);
        assert!(round.is_over());
        assert!(round.snapshot().over);

        let result = round.guess_letter("G");
        assert!(matches!(result, Err(GameError::InvalidState(_))));
        assert_eq!(round.lives(), 0);
        assert_eq!(round.guessed().len(), 6);

        assert!(matches!(round.expire_turn(), Err(GameError::InvalidState(_))));
    }

    #[test]
    fn test_expire_turn_costs_life() {
        let mut round = single_word_round("python");
        let outcome = round.expire_turn().unwrap();

        assert_eq!(outcome.letter, None);
        assert_eq!(outcome.message, MSG_TIMEOUT);
        assert_eq!(round.lives(), MAX_LIVES - 1);
        assert!(round.guessed().is_empty());
        assert!(round.missed().is_empty());
    }

    #[test]
    fn test_incomplete_word_no_score() {
        let mut round = single_word_round("python");
        round.guess_letter("P").unwrap();

        assert!(!round.check_completion());
        let outcome = round.resolve_completion().unwrap();

        assert!(!outcome.completed);
        assert_eq!(outcome.completed_answer, None);
        assert_eq!(outcome.score, 0);
        assert_eq!(round.guessed(), ['P']);
    }

    #[test]
    fn test_cat_scenario() {
        let mut round = single_word_round("cat");

        assert!(round.guess_letter("C").unwrap().correct);
        assert!(!round.guess_letter("Z").unwrap().correct);
        assert_eq!(round.lives(), 5);
        assert!(round.guess_letter("A").unwrap().correct);
        assert!(round.guess_letter("T").unwrap().correct);

        assert!(round.check_completion());
        let outcome = round.resolve_completion().unwrap();

        assert!(outcome.completed);
        assert_eq!(outcome.completed_answer.as_deref(), Some("CAT"));
        assert_eq!(outcome.score, 1);
        assert_eq!(outcome.message, MSG_WORD_COMPLETED);
        assert_eq!(round.score(), 1);
        assert_eq!(round.lives(), MAX_LIVES);
        assert!(round.guessed().is_empty());
        assert!(round.missed().is_empty());
        assert_eq!(round.words_attempted(), 2);
        assert_eq!(round.answer(), "CAT");
    }

    #[test]
    fn test_phrase_completion() {
        let source = Arc::new(WordSource::from_lists(["cat"], ["break a leg"]));
        let mut round = Round::new(Difficulty::Intermediate, source, RoundRng::new(5)).unwrap();

        for letter in ["B", "R", "E", "A", "K", "L"] {
            round.guess_letter(letter).unwrap();
        }
        assert!(!round.check_completion());

        round.guess_letter("G").unwrap();
        assert!(round.check_completion());
        assert!(round.resolve_completion().unwrap().completed);
        assert_eq!(round.score(), 1);
    }

    #[test]
    fn test_non_letter_answer_completes_at_a_cost() {
        let mut round = single_word_round("r2d2");

        assert!(round.guess_letter("R").unwrap().correct);
        assert!(round.guess_letter("D").unwrap().correct);
        assert!(!round.check_completion());

        let outcome = round.guess_letter("2").unwrap();
        assert!(!outcome.correct);
        assert_eq!(round.lives(), MAX_LIVES - 1);
        assert_eq!(round.snapshot().display, "R2D2");
        assert!(round.check_completion());

        assert!(round.resolve_completion().unwrap().completed);
        assert_eq!(round.score(), 1);
    }

    #[test]
    fn test_score_survives_answers() {
        let mut round = round_with(&["cat", "dog", "emu"], &["break a leg"]);

        for expected in 1..=4 {
            solve(&mut round);
            assert_eq!(round.score(), expected);
            assert_eq!(round.lives(), MAX_LIVES);
        }

        round.guess_letter("Q").unwrap();
        assert_eq!(round.score(), 4);
    }

    #[test]
    fn test_python_snapshot_scenario() {
        let mut round = single_word_round("python");
        for _ in 0..3 {
            solve(&mut round);
        }

        round.guess_letter("P").unwrap();
        round.guess_letter("Y").unwrap();
        round.guess_letter("Z").unwrap();

        let snapshot = round.snapshot();
        assert_eq!(snapshot.display, "PY____");
        assert_eq!(snapshot.guessed, vec!['P', 'Y', 'Z']);
        assert_eq!(snapshot.missed, vec!['Z']);
        assert_eq!(snapshot.lives, 5);
        assert_eq!(snapshot.score, 3);
        assert!(!snapshot.over);
        assert_eq!(snapshot.difficulty, Difficulty::Basic);
        assert_eq!(snapshot.answer, "PYTHON");
        assert_eq!(snapshot.status, "Keep guessing! 5 lives remaining.");
        assert_eq!(snapshot.words_attempted, 4);
    }

    #[test]
    fn test_status_messages() {
        let mut round = single_word_round("python");
        for letter in ["A", "B", "C", "D", "E"] {
            round.guess_letter(letter).unwrap();
        }
        assert_eq!(round.status_message(), MSG_LAST_LIFE);

        round.guess_letter("F").unwrap();
        assert_eq!(round.status_message(), "Game Over! Final Score: 0");
    }

    #[test]
    fn test_create_with_missing_list_fails() {
        let source = Arc::new(WordSource::from_dir(std::env::temp_dir().join(format!(
            "hangman-absent-{}",
            uuid::Uuid::new_v4()
        ))));
        let result = Round::create("basic", source, RoundRng::new(1));

        assert!(matches!(result, Err(GameError::ResourceNotFound(_))));
    }

    proptest! {
        #[test]
        fn prop_completion_iff_superset(
            answer in "[A-Z]{1,8}( [A-Z]{1,8}){0,2}",
            guessed in proptest::collection::vec(proptest::char::range('A', 'Z'), 0..26),
        ) {
            let required: std::collections::BTreeSet<char> =
                answer.chars().filter(|&c| c != ' ').collect();
            let have: std::collections::BTreeSet<char> = guessed.iter().copied().collect();

            prop_assert_eq!(is_complete(&answer, &guessed), required.is_subset(&have));
        }

        #[test]
        fn prop_lives_track_misses(letters in proptest::collection::vec(proptest::char::range('A', 'Z'), 0..40)) {
            let mut round = single_word_round("python");

            for letter in letters {
                if round.is_over() {
                    break;
                }
                let before = round.lives();
                let outcome = round.guess_letter(&letter.to_string()).unwrap();

                if outcome.correct || outcome.duplicate {
                    prop_assert_eq!(round.lives(), before);
                } else {
                    prop_assert_eq!(round.lives(), before - 1);
                    prop_assert!(round.missed().contains(&letter));
                }
                prop_assert!(round.missed().iter().all(|m| round.guessed().contains(m)));
                prop_assert_eq!(round.lives() as usize, MAX_LIVES as usize - round.missed().len());
            }
        }
    }
}
