//! WebSocket Game Server
//!
//! Async WebSocket server. Every connection gets its own session; messages
//! are routed to that session's round one at a time.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock, broadcast};
use tokio::time::interval;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument};

use crate::GUESS_TIME_LIMIT_SECS;
use crate::game::words::WordSource;
use crate::network::protocol::{
    ClientMessage, ServerMessage, ErrorCode, GuessResult, LevelInfo, WelcomeInfo,
};
use crate::network::session::{
    GameSession, SessionError, SessionId, SessionManager, Turn, parse_session_id,
    session_id_string,
};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Disconnected sessions are dropped after this long without activity.
    pub idle_timeout: Duration,
    /// How often idle sessions are swept.
    pub cleanup_interval: Duration,
    /// Directory holding the word list files.
    pub words_dir: PathBuf,
    /// Seconds allowed per guess (advertised to clients).
    pub guess_time_limit: u32,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            max_connections: 1000,
            idle_timeout: Duration::from_secs(30 * 60),
            cleanup_interval: Duration::from_secs(60),
            words_dir: PathBuf::from("words"),
            guess_time_limit: GUESS_TIME_LIMIT_SECS,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables, falling back to defaults.
    ///
    /// - `HANGMAN_BIND_ADDR`
    /// - `HANGMAN_MAX_CONNECTIONS`
    /// - `HANGMAN_IDLE_TIMEOUT_SECS`
    /// - `HANGMAN_WORDS_DIR`
    /// - `HANGMAN_GUESS_TIME_LIMIT_SECS`
    pub fn from_env() -> Result<Self, GameServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GameServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("HANGMAN_BIND_ADDR") {
            config.bind_addr = parse_var("HANGMAN_BIND_ADDR", &v)?;
        }
        if let Some(v) = lookup("HANGMAN_MAX_CONNECTIONS") {
            config.max_connections = parse_var("HANGMAN_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("HANGMAN_IDLE_TIMEOUT_SECS") {
            config.idle_timeout = Duration::from_secs(parse_var("HANGMAN_IDLE_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("HANGMAN_WORDS_DIR") {
            config.words_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("HANGMAN_GUESS_TIME_LIMIT_SECS") {
            config.guess_time_limit = parse_var("HANGMAN_GUESS_TIME_LIMIT_SECS", &v)?;
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, GameServerError> {
    value
        .trim()
        .parse()
        .map_err(|_| GameServerError::Config(format!("{name}: invalid value {value:?}")))
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Bad configuration value.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Connected client state.
struct ConnectedClient {
    /// Session this connection plays in (changes on resume).
    session_id: SessionId,
    /// Connection time.
    connected_at: Instant,
}

/// Shared handles cloned into every connection task.
#[derive(Clone)]
struct ServerState {
    config: Arc<ServerConfig>,
    sessions: Arc<SessionManager>,
    words: Arc<WordSource>,
    clients: Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>,
}

/// What the connection loop does after a message.
enum Flow {
    Continue,
    Close,
}

/// Short session id for logs.
fn short_id(id: &SessionId) -> String {
    hex::encode(&id[..4])
}

fn error_reply(err: &SessionError) -> ServerMessage {
    ServerMessage::error(err.code(), err.to_string())
}

/// The game server.
pub struct GameServer {
    state: ServerState,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig, words: Arc<WordSource>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            state: ServerState {
                config: Arc::new(config),
                sessions: Arc::new(SessionManager::new()),
                words,
                clients: Arc::new(RwLock::new(BTreeMap::new())),
            },
            shutdown_tx,
        }
    }

    /// Bind the configured address and run the server.
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(self.state.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Run the server on an already bound listener until shutdown.
    #[instrument(skip(self, listener))]
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!("Game server listening on {}", listener.local_addr()?);

        let cleanup_sessions = self.state.sessions.clone();
        let idle_timeout = self.state.config.idle_timeout;
        let cleanup_interval = self.state.config.cleanup_interval;

        // Spawn cleanup task
        let cleanup_handle = tokio::spawn(async move {
            Self::run_cleanup_loop(cleanup_sessions, idle_timeout, cleanup_interval).await;
        });

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.state.clients.read().await.len();
                            if clients_count >= self.state.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        cleanup_handle.abort();

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let state = self.state.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            if let Err(e) = Self::serve_connection(&state, stream, addr, shutdown_rx).await {
                error!("Connection {} failed: {}", addr, e);
            }
        });
    }

    async fn serve_connection(
        state: &ServerState,
        stream: TcpStream,
        addr: SocketAddr,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), GameServerError> {
        let ws_stream = accept_async(stream).await?;

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

        // Every connection starts in a fresh session
        let session_id = state.sessions.create_session().await;
        {
            let mut clients = state.clients.write().await;
            clients.insert(addr, ConnectedClient {
                session_id,
                connected_at: Instant::now(),
            });
        }
        debug!("Client {} assigned session {}", addr, short_id(&session_id));

        // Spawn message sender task
        let sender_task = tokio::spawn(async move {
            while let Some(msg) = msg_rx.recv().await {
                let text = match msg.to_json() {
                    Ok(t) => t,
                    Err(e) => {
                        error!("Failed to serialize message: {}", e);
                        continue;
                    }
                };
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            // Queue drained: finish with a close handshake
            let _ = ws_sender.send(Message::Close(None)).await;
        });

        let _ = msg_tx
            .send(ServerMessage::Welcome(Self::welcome(&state.config, &session_id)))
            .await;

        // Handle incoming messages
        loop {
            tokio::select! {
                msg = ws_receiver.next() => {
                    let text = match msg {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                            Ok(text) => text,
                            Err(_) => {
                                let _ = msg_tx.send(ServerMessage::error(
                                    ErrorCode::InvalidInput,
                                    "Binary frames must carry UTF-8 JSON",
                                )).await;
                                continue;
                            }
                        },
                        Some(Ok(Message::Close(_))) | None => {
                            debug!("Client {} disconnected", addr);
                            break;
                        }
                        Some(Err(e)) => {
                            error!("WebSocket error for {}: {}", addr, e);
                            break;
                        }
                        // Ping/pong frames are answered by tungstenite
                        _ => continue,
                    };

                    let client_msg = match ClientMessage::from_json(&text) {
                        Ok(m) => m,
                        Err(e) => {
                            debug!("Invalid message from {}: {}", addr, e);
                            let _ = msg_tx.send(ServerMessage::error(
                                ErrorCode::InvalidInput,
                                "Invalid message format",
                            )).await;
                            continue;
                        }
                    };

                    if let Flow::Close = Self::handle_client_message(state, addr, client_msg, &msg_tx).await {
                        break;
                    }
                }
                _ = shutdown_rx.recv() => {
                    let _ = msg_tx.send(ServerMessage::Shutdown {
                        reason: "Server shutting down".to_string(),
                    }).await;
                    break;
                }
            }
        }

        // Let queued replies flush before the socket goes away
        drop(msg_tx);
        let _ = sender_task.await;

        let client = state.clients.write().await.remove(&addr);
        if let Some(client) = client {
            Self::release_session(state, &client.session_id).await;
            info!(
                "Client {} cleaned up after {:?}",
                addr,
                client.connected_at.elapsed()
            );
        }

        Ok(())
    }

    fn welcome(config: &ServerConfig, session_id: &SessionId) -> WelcomeInfo {
        WelcomeInfo {
            session_id: session_id_string(session_id),
            server_version: config.version.clone(),
            guess_time_limit: config.guess_time_limit,
        }
    }

    /// Handle a client message.
    async fn handle_client_message(
        state: &ServerState,
        addr: SocketAddr,
        msg: ClientMessage,
        sender: &mpsc::Sender<ServerMessage>,
    ) -> Flow {
        let reply = match msg {
            ClientMessage::Levels => ServerMessage::Levels {
                levels: LevelInfo::all(),
            },
            ClientMessage::NewRound(req) => {
                let words = state.words.clone();
                Self::with_session(state, addr, |session| {
                    let snapshot = session.start_round(&req.difficulty, words)?;
                    info!("Session {} started a {} round", short_id(&session.id), snapshot.difficulty);
                    Ok(ServerMessage::RoundStarted(snapshot.into()))
                })
                .await
            }
            ClientMessage::Guess(req) => {
                Self::with_session(state, addr, |session| {
                    let turn = session.guess(&req.letter)?;
                    Ok(Self::turn_reply(&session.id, turn))
                })
                .await
            }
            ClientMessage::TimeUp => {
                Self::with_session(state, addr, |session| {
                    let turn = session.expire_turn()?;
                    Ok(Self::turn_reply(&session.id, turn))
                })
                .await
            }
            ClientMessage::SyncRequest => {
                Self::with_session(state, addr, |session| {
                    Ok(ServerMessage::State(session.snapshot()?.into()))
                })
                .await
            }
            ClientMessage::Resume { session_id } => {
                match Self::resume(state, addr, &session_id).await {
                    Ok(replies) => {
                        for reply in replies {
                            let _ = sender.send(reply).await;
                        }
                        return Flow::Continue;
                    }
                    Err(e) => error_reply(&e),
                }
            }
            ClientMessage::Ping { timestamp } => ServerMessage::Pong {
                timestamp,
                server_time: chrono::Utc::now().timestamp_millis().max(0) as u64,
            },
            ClientMessage::Leave => {
                Self::handle_leave(state, addr).await;
                return Flow::Close;
            }
        };

        let _ = sender.send(reply).await;
        Flow::Continue
    }

    /// Run `f` on the caller's session with its lock held, turning errors
    /// into error replies.
    async fn with_session<F>(state: &ServerState, addr: SocketAddr, f: F) -> ServerMessage
    where
        F: FnOnce(&mut GameSession) -> Result<ServerMessage, SessionError>,
    {
        let result = match Self::current_session(state, addr).await {
            Ok(session) => {
                let mut session = session.lock().await;
                f(&mut *session)
            }
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            debug!("Request from {} failed: {}", addr, e);
            error_reply(&e)
        })
    }

    async fn current_session(
        state: &ServerState,
        addr: SocketAddr,
    ) -> Result<Arc<tokio::sync::Mutex<GameSession>>, SessionError> {
        let session_id = {
            let clients = state.clients.read().await;
            clients.get(&addr).map(|c| c.session_id)
        };

        match session_id {
            Some(id) => state.sessions.require_session(&id).await,
            None => Err(SessionError::SessionNotFound),
        }
    }

    fn turn_reply(session_id: &SessionId, turn: Turn) -> ServerMessage {
        if let Some(completion) = turn.completion.as_ref().filter(|c| c.completed) {
            info!(
                "Session {} solved {:?}, score {}",
                short_id(session_id),
                completion.completed_answer.as_deref().unwrap_or_default(),
                completion.score
            );
        }
        if turn.snapshot.over {
            info!(
                "Session {} out of lives, final score {}",
                short_id(session_id),
                turn.snapshot.score
            );
        }

        ServerMessage::GuessResult(GuessResult::new(turn.guess, turn.completion, turn.snapshot))
    }

    /// Reattach this connection to `requested`, releasing its current session.
    async fn resume(
        state: &ServerState,
        addr: SocketAddr,
        requested: &str,
    ) -> Result<Vec<ServerMessage>, SessionError> {
        let new_id = parse_session_id(requested).ok_or(SessionError::SessionNotFound)?;
        let target = state.sessions.require_session(&new_id).await?;

        let previous = {
            let mut clients = state.clients.write().await;
            let client = clients.get_mut(&addr).ok_or(SessionError::SessionNotFound)?;
            std::mem::replace(&mut client.session_id, new_id)
        };

        if previous != new_id {
            Self::release_session(state, &previous).await;
        }

        let mut session = target.lock().await;
        if session.is_connected() && previous != new_id {
            warn!("Session {} taken over by {}", short_id(&new_id), addr);
        }
        session.set_connected(true);
        info!("Client {} resumed session {}", addr, short_id(&new_id));

        let mut replies = vec![ServerMessage::Welcome(Self::welcome(&state.config, &new_id))];
        if let Ok(snapshot) = session.snapshot() {
            replies.push(ServerMessage::State(snapshot.into()));
        }
        Ok(replies)
    }

    /// Detach a connection from a session. Sessions without a round have
    /// nothing worth resuming and are dropped at once.
    async fn release_session(state: &ServerState, id: &SessionId) {
        let Some(session) = state.sessions.get_session(id).await else {
            return;
        };
        let mut session = session.lock().await;

        // Checked with the session lock held: a resume attaches the client
        // before it takes this lock, so it cannot slip in between.
        let still_attached = {
            let clients = state.clients.read().await;
            clients.values().any(|c| &c.session_id == id)
        };
        if still_attached {
            return;
        }

        session.set_connected(false);
        if !session.has_round() {
            state.sessions.remove_session(id).await;
        }
    }

    /// Handle leave: the session is discarded.
    async fn handle_leave(state: &ServerState, addr: SocketAddr) {
        let session_id = {
            let clients = state.clients.read().await;
            clients.get(&addr).map(|c| c.session_id)
        };

        if let Some(id) = session_id {
            state.sessions.remove_session(&id).await;
            info!("Client {} left session {}", addr, short_id(&id));
        }
    }

    /// Run cleanup loop.
    async fn run_cleanup_loop(
        sessions: Arc<SessionManager>,
        idle_timeout: Duration,
        cleanup_interval: Duration,
    ) {
        let mut interval = interval(cleanup_interval);

        loop {
            interval.tick().await;

            let removed = sessions.cleanup_idle(idle_timeout).await;
            if removed > 0 {
                info!("Removed {} idle sessions", removed);
            }
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.state.clients.read().await.len()
    }

    /// Get active session count.
    pub async fn session_count(&self) -> usize {
        self.state.sessions.session_count().await
    }
}
