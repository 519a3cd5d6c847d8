//! Network Layer
//!
//! WebSocket server, wire messages and per-player sessions. All game rules
//! live in `game/`; this layer only routes messages to them.

pub mod protocol;
pub mod session;
pub mod server;

pub use protocol::{
    ClientMessage, ServerMessage, ErrorCode, GuessResult, LevelInfo, RoundState,
};
pub use session::{GameSession, SessionError, SessionId, SessionManager};
pub use server::{GameServer, ServerConfig, GameServerError};
