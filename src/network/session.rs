//! Game Session Management
//!
//! Each connected player owns one session, and each session holds at most
//! one [`Round`]. Sessions sit behind their own mutex so a player's turns
//! are applied one at a time, while different players never contend.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::core::rng::RoundRng;
use crate::game::error::GameError;
use crate::game::round::{CompletionOutcome, GuessOutcome, Round, RoundSnapshot};
use crate::game::words::WordSource;
use crate::network::protocol::ErrorCode;

/// Unique session identifier.
pub type SessionId = [u8; 16];

/// Parse a session id from its UUID string form.
pub fn parse_session_id(s: &str) -> Option<SessionId> {
    uuid::Uuid::parse_str(s).ok().map(|u| *u.as_bytes())
}

/// UUID string form of a session id.
pub fn session_id_string(id: &SessionId) -> String {
    uuid::Uuid::from_bytes(*id).to_string()
}

/// Everything one turn produced.
#[derive(Debug, Clone)]
pub struct Turn {
    /// Outcome of the guess (or timeout).
    pub guess: GuessOutcome,
    /// Completion check that followed the guess; `None` for duplicates and
    /// timeouts, which cannot complete an answer.
    pub completion: Option<CompletionOutcome>,
    /// State after the turn.
    pub snapshot: RoundSnapshot,
}

/// One player's server-side state.
#[derive(Debug)]
pub struct GameSession {
    /// Session identifier.
    pub id: SessionId,
    round: Option<Round>,
    /// Rounds started so far; feeds the per-round seed.
    rounds_started: u32,
    /// A live connection is attached.
    connected: bool,
    last_activity: Instant,
}

impl GameSession {
    /// Create an empty session.
    pub fn new(id: SessionId) -> Self {
        let now = Instant::now();
        Self {
            id,
            round: None,
            rounds_started: 0,
            connected: true,
            last_activity: now,
        }
    }

    /// Record activity.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Mark whether a connection is attached.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
        self.touch();
    }

    /// A live connection is attached.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Time since the last activity.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.duration_since(self.last_activity)
    }

    /// A round has been started.
    pub fn has_round(&self) -> bool {
        self.round.is_some()
    }

    fn round_mut(&mut self) -> Result<&mut Round, SessionError> {
        self.round.as_mut().ok_or(SessionError::NoActiveRound)
    }

    /// Start a round, replacing any current one. On failure the previous
    /// round (if any) is kept.
    pub fn start_round(
        &mut self,
        difficulty: &str,
        source: Arc<WordSource>,
    ) -> Result<RoundSnapshot, SessionError> {
        self.touch();
        let rng = RoundRng::for_round(&self.id, self.rounds_started);
        let round = Round::create(difficulty, source, rng)
            .map_err(|e| SessionError::classify(e, SessionError::InvalidDifficulty))?;

        self.rounds_started += 1;
        let snapshot = round.snapshot();
        self.round = Some(round);
        Ok(snapshot)
    }

    /// Apply a guess, then resolve completion, as one turn.
    pub fn guess(&mut self, letter: &str) -> Result<Turn, SessionError> {
        self.touch();
        let round = self.round_mut()?;
        let guess = round
            .guess_letter(letter)
            .map_err(|e| SessionError::classify(e, SessionError::InvalidLetter))?;

        let completion = if guess.duplicate {
            None
        } else {
            Some(
                round
                    .resolve_completion()
                    .map_err(|e| SessionError::classify(e, SessionError::InvalidLetter))?,
            )
        };

        Ok(Turn {
            guess,
            completion,
            snapshot: round.snapshot(),
        })
    }

    /// The player's guess timer ran out.
    pub fn expire_turn(&mut self) -> Result<Turn, SessionError> {
        self.touch();
        let round = self.round_mut()?;
        let guess = round
            .expire_turn()
            .map_err(|e| SessionError::classify(e, SessionError::InvalidLetter))?;

        Ok(Turn {
            guess,
            completion: None,
            snapshot: round.snapshot(),
        })
    }

    /// Current round state.
    pub fn snapshot(&self) -> Result<RoundSnapshot, SessionError> {
        self.round
            .as_ref()
            .map(Round::snapshot)
            .ok_or(SessionError::NoActiveRound)
    }
}

/// Session errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Unknown difficulty.
    #[error("{0}")]
    InvalidDifficulty(String),

    /// Guess was not a single character.
    #[error("{0}")]
    InvalidLetter(String),

    /// Round has no lives left.
    #[error("{0}")]
    RoundOver(String),

    /// Word list could not supply an answer.
    #[error("Word list unavailable: {0}")]
    WordList(#[source] GameError),

    /// No round started yet.
    #[error("No active round; choose a difficulty first")]
    NoActiveRound,

    /// Session does not exist.
    #[error("Session not found")]
    SessionNotFound,
}

impl SessionError {
    /// Map a game error, using `on_invalid` for bad arguments.
    fn classify(err: GameError, on_invalid: fn(String) -> SessionError) -> Self {
        match err {
            GameError::InvalidArgument(msg) => on_invalid(msg),
            GameError::InvalidState(msg) => SessionError::RoundOver(msg),
            other => SessionError::WordList(other),
        }
    }

    /// Wire error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::InvalidDifficulty(_) => ErrorCode::InvalidDifficulty,
            SessionError::InvalidLetter(_) => ErrorCode::InvalidLetter,
            SessionError::RoundOver(_) => ErrorCode::RoundOver,
            SessionError::WordList(_) => ErrorCode::WordListUnavailable,
            SessionError::NoActiveRound => ErrorCode::NoActiveRound,
            SessionError::SessionNotFound => ErrorCode::SessionNotFound,
        }
    }
}

// =============================================================================
// SESSION MANAGER
// =============================================================================

/// Manages all active sessions.
pub struct SessionManager {
    /// Active sessions.
    sessions: RwLock<BTreeMap<SessionId, Arc<Mutex<GameSession>>>>,
}

impl SessionManager {
    /// Create new session manager.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a new session.
    pub async fn create_session(&self) -> SessionId {
        let id = uuid::Uuid::new_v4().into_bytes();
        let session = GameSession::new(id);

        let mut sessions = self.sessions.write().await;
        sessions.insert(id, Arc::new(Mutex::new(session)));

        id
    }

    /// Get a session by ID.
    pub async fn get_session(&self, id: &SessionId) -> Option<Arc<Mutex<GameSession>>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Get a session by ID, failing with [`SessionError::SessionNotFound`].
    pub async fn require_session(&self, id: &SessionId) -> Result<Arc<Mutex<GameSession>>, SessionError> {
        self.get_session(id).await.ok_or(SessionError::SessionNotFound)
    }

    /// Remove a session.
    pub async fn remove_session(&self, id: &SessionId) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id);
    }

    /// Get active session count.
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    /// Drop disconnected sessions idle for at least `idle_timeout`.
    ///
    /// Sessions whose lock is held are mid-turn and always kept. Returns
    /// the number removed.
    pub async fn cleanup_idle(&self, idle_timeout: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let mut to_remove = Vec::new();

        for (id, session) in sessions.iter() {
            if let Ok(s) = session.try_lock() {
                if !s.is_connected() && s.idle_for(now) >= idle_timeout {
                    to_remove.push(*id);
                }
            }
        }

        for id in &to_remove {
            sessions.remove(id);
            debug!("Evicted idle session {}", hex::encode(&id[..4]));
        }

        to_remove.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
