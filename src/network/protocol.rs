//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every message is a JSON object tagged by `"type"`.

use serde::{Serialize, Deserialize};

use crate::game::round::{CompletionOutcome, GuessOutcome, RoundSnapshot};
use crate::game::words::Difficulty;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// List the available difficulty levels.
    Levels,

    /// Start a new round, replacing any current one.
    NewRound(NewRoundRequest),

    /// Guess a letter in the current round.
    Guess(GuessRequest),

    /// Client-side guess timer expired.
    TimeUp,

    /// Request the current round state.
    SyncRequest,

    /// Reattach this connection to an earlier session.
    Resume {
        /// Id from an earlier `welcome`.
        session_id: String,
    },

    /// Ping for latency measurement.
    Ping {
        /// Client clock, echoed back in the pong.
        timestamp: u64,
    },

    /// Player is leaving; drop the session.
    Leave,
}

/// Request to start a round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRoundRequest {
    /// Difficulty name (`"basic"` or `"intermediate"`). Kept as a string
    /// so unknown levels are reported as a game error, not a parse error.
    pub difficulty: String,
}

/// A letter guess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessRequest {
    /// Single character.
    pub letter: String,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent on connect and after a successful resume.
    Welcome(WelcomeInfo),

    /// Available difficulty levels.
    Levels {
        /// One entry per difficulty, in menu order.
        levels: Vec<LevelInfo>,
    },

    /// A new round has started.
    RoundStarted(RoundState),

    /// Outcome of a guess or timeout.
    GuessResult(GuessResult),

    /// Current round state (on request).
    State(RoundState),

    /// Pong response.
    Pong {
        /// Timestamp from the ping.
        timestamp: u64,
        /// Server wall clock, Unix milliseconds.
        server_time: u64,
    },

    /// Error message.
    Error(ServerError),

    /// Server is shutting down.
    Shutdown {
        /// Why the connection is closing.
        reason: String,
    },
}

/// Session greeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeInfo {
    /// Session identifier (UUID string); pass to `resume` after reconnecting.
    pub session_id: String,
    /// Server version.
    pub server_version: String,
    /// Seconds allowed per guess before the client should send `time_up`.
    pub guess_time_limit: u32,
}

/// One entry of the level picker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelInfo {
    /// Value to send in `new_round`.
    pub difficulty: Difficulty,
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
}

impl LevelInfo {
    /// Picker entries for every difficulty.
    pub fn all() -> Vec<LevelInfo> {
        Difficulty::ALL
            .iter()
            .map(|&d| LevelInfo {
                difficulty: d,
                name: d.name().to_string(),
                description: d.description().to_string(),
            })
            .collect()
    }
}

/// Round state as shown to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundState {
    /// Masked answer.
    pub display: String,
    /// Letters guessed for the current answer.
    pub guessed: Vec<char>,
    /// Wrong letters for the current answer.
    pub missed: Vec<char>,
    /// Lives remaining.
    pub lives: u8,
    /// Lives per answer.
    pub max_lives: u8,
    /// Lives rendered as hearts.
    pub lives_display: String,
    /// Answers solved.
    pub score: u32,
    /// Round has ended.
    pub over: bool,
    /// Round difficulty.
    pub difficulty: Difficulty,
    /// Status line.
    pub status: String,
    /// Answers drawn so far.
    pub words_attempted: u32,
    /// Revealed answer; only sent once the round is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl From<RoundSnapshot> for RoundState {
    fn from(s: RoundSnapshot) -> Self {
        let answer = s.over.then_some(s.answer);
        Self {
            display: s.display,
            guessed: s.guessed,
            missed: s.missed,
            lives: s.lives,
            max_lives: s.max_lives,
            lives_display: s.lives_display,
            score: s.score,
            over: s.over,
            difficulty: s.difficulty,
            status: s.status,
            words_attempted: s.words_attempted,
            answer,
        }
    }
}

/// Result of a guess, with the state after any completion was resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessResult {
    /// Letter guessed (`None` for a timeout).
    pub letter: Option<char>,
    /// Letter is in the answer.
    pub correct: bool,
    /// Letter was already guessed.
    pub duplicate: bool,
    /// Message for the guess itself.
    pub message: String,
    /// Present when this guess solved the answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<CompletionInfo>,
    /// State after the guess.
    pub state: RoundState,
}

impl GuessResult {
    /// Combine the engine outcomes of one turn.
    pub fn new(guess: GuessOutcome, completion: Option<CompletionOutcome>, snapshot: RoundSnapshot) -> Self {
        Self {
            letter: guess.letter,
            correct: guess.correct,
            duplicate: guess.duplicate,
            message: guess.message,
            completion: completion.and_then(CompletionInfo::from_outcome),
            state: snapshot.into(),
        }
    }
}

/// A solved answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionInfo {
    /// The answer that was solved.
    pub completed_answer: String,
    /// Score after solving it.
    pub score: u32,
    /// Congratulation message.
    pub message: String,
}

impl CompletionInfo {
    /// `None` unless the outcome is a completion.
    pub fn from_outcome(outcome: CompletionOutcome) -> Option<Self> {
        if !outcome.completed {
            return None;
        }
        Some(Self {
            completed_answer: outcome.completed_answer?,
            score: outcome.score,
            message: outcome.message,
        })
    }
}

/// Server error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Message could not be parsed.
    InvalidInput,
    /// Unknown difficulty.
    InvalidDifficulty,
    /// Guess was not a single character.
    InvalidLetter,
    /// Round has no lives left.
    RoundOver,
    /// No round started yet.
    NoActiveRound,
    /// Resume target does not exist.
    SessionNotFound,
    /// Word list missing, empty or unreadable.
    WordListUnavailable,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Shorthand for an error reply.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error(ServerError {
            code,
            message: message.into(),
        })
    }
}
