//! Async client for the Turnroom protocol.
//!
//! [`TurnroomClient`] is a thin handle that talks to a background transport
//! loop task over an unbounded MPSC channel. The loop exclusively owns the
//! [`Session`]: it applies every inbound message, evaluates every local action
//! against the current state right before emitting it, and publishes a
//! [`SessionSnapshot`] after each change. Events arrive on a bounded channel
//! returned from [`TurnroomClient::start`].
//!
//! # Example
//!
//! ```rust,ignore
//! let transport = connect_somehow().await;
//! let config = TurnroomConfig::new("ROOM42", "Alice");
//! let (client, mut events) = TurnroomClient::start(transport, config);
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         TurnroomEvent::RoomJoined { .. } => client.set_ready()?,
//!         TurnroomEvent::GameUpdated { .. } if client.snapshot().can_act => {
//!             client.submit_move(serde_json::json!({ "position": 4 }))?;
//!         }
//!         TurnroomEvent::Disconnected { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, warn};

use crate::chat::{self, ChatEntry, ChatLog};
use crate::countdown::{self, Countdown, CountdownStep};
use crate::error::{Result, TurnroomError};
use crate::event::TurnroomEvent;
use crate::protocol::{ClientMessage, GameAction, PlayerId, RoomId, ServerMessage};
use crate::session::{Phase, Session, SessionSnapshot};
use crate::transport::Transport;

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Default length of the advisory countdown, in seconds.
const DEFAULT_COUNTDOWN_SECONDS: u32 = 5;

/// Default interval between countdown steps.
const DEFAULT_COUNTDOWN_TICK: Duration = Duration::from_secs(1);

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`TurnroomClient`] session.
///
/// `room_id` and `player_name` are required; all others have defaults.
///
/// # Example
///
/// ```
/// use turnroom_client::client::TurnroomConfig;
/// use std::time::Duration;
///
/// let config = TurnroomConfig::new("ROOM42", "Alice")
///     .with_event_channel_capacity(512)
///     .with_countdown(3, Duration::from_millis(500));
/// assert_eq!(config.room_id, "ROOM42");
/// assert_eq!(config.countdown_seconds, 3);
/// ```
#[derive(Debug, Clone)]
pub struct TurnroomConfig {
    /// Room to join.
    pub room_id: RoomId,
    /// Display name sent with `join-room` and every chat line.
    pub player_name: String,
    /// Capacity of the bounded event channel.
    ///
    /// When the consumer cannot keep up, ordinary events are dropped (with a
    /// warning logged) to avoid blocking the transport loop. `GameStarted`,
    /// `GameFinished`, `SessionError` and `Disconnected` are always delivered.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
    /// Time the transport loop gets to close the transport on
    /// [`TurnroomClient::shutdown`] before it is aborted.
    ///
    /// Defaults to **1 second**.
    pub shutdown_timeout: Duration,
    /// Length of the advisory countdown. Defaults to **5**.
    pub countdown_seconds: u32,
    /// Interval between countdown steps. Defaults to **1 second**.
    pub countdown_tick: Duration,
    /// Id the server knows this connection by.
    ///
    /// When unset, [`Transport::connection_id`] is asked instead. A `playerId`
    /// carried in `room-joined` overrides either.
    pub player_id: Option<PlayerId>,
}

impl TurnroomConfig {
    /// Create a configuration for joining `room_id` as `player_name`.
    pub fn new(room_id: impl Into<RoomId>, player_name: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            player_name: player_name.into(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            countdown_seconds: DEFAULT_COUNTDOWN_SECONDS,
            countdown_tick: DEFAULT_COUNTDOWN_TICK,
            player_id: None,
        }
    }

    /// Set the capacity of the bounded event channel (clamped to at least 1).
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Set the timeout for the graceful shutdown.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the advisory countdown length and step interval.
    #[must_use]
    pub fn with_countdown(mut self, seconds: u32, tick: Duration) -> Self {
        self.countdown_seconds = seconds;
        self.countdown_tick = tick;
        self
    }

    /// Set the connection id assigned by the server, for transports that
    /// cannot report it themselves.
    #[must_use]
    pub fn with_player_id(mut self, player_id: impl Into<PlayerId>) -> Self {
        self.player_id = Some(player_id.into());
        self
    }
}

// ── Commands ────────────────────────────────────────────────────────

/// Local user intent, checked against the session inside the loop.
#[derive(Debug)]
enum Command {
    Ready,
    Move(serde_json::Value),
    Restart,
    Chat(String),
    Leave,
}

// ── Client handle ───────────────────────────────────────────────────

/// Async client handle for one Turnroom session.
///
/// All action methods queue a command to the transport loop and return
/// immediately. Actions that are not legal when the loop gets to them (a move
/// out of turn, a restart before the game ended) are dropped silently; the
/// server remains the final arbiter either way.
pub struct TurnroomClient {
    cmd_tx: mpsc::UnboundedSender<Command>,
    connected: Arc<AtomicBool>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    transcript_rx: watch::Receiver<Vec<ChatEntry>>,
    task: Option<tokio::task::JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shutdown_timeout: Duration,
}

impl TurnroomClient {
    /// Start the transport loop and return a handle plus event receiver.
    ///
    /// The loop sends `join-room` as its very first message.
    #[must_use = "the event receiver must be used to receive events"]
    pub fn start(
        transport: impl Transport,
        config: TurnroomConfig,
    ) -> (Self, mpsc::Receiver<TurnroomEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<Command>();
        // Clamp capacity to at least 1 (tokio panics on 0).
        let capacity = config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<TurnroomEvent>(capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let mut session = Session::new(config.room_id.clone(), config.countdown_seconds);
        if let Some(id) = config.player_id.or_else(|| transport.connection_id()) {
            debug!("local player id {id} known before join");
            session = session.with_local_player_id(id);
        }
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
        let (chat, transcript_rx) = ChatLog::channel();
        let connected = Arc::new(AtomicBool::new(true));

        let task = tokio::spawn(transport_loop(
            transport,
            LoopState {
                session,
                chat,
                countdown: None,
                player_name: config.player_name,
                countdown_seconds: config.countdown_seconds,
                countdown_tick: config.countdown_tick,
                connected: Arc::clone(&connected),
                snapshot_tx,
            },
            cmd_rx,
            event_tx,
            shutdown_rx,
        ));

        let client = Self {
            cmd_tx,
            connected,
            snapshot_rx,
            transcript_rx,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout: config.shutdown_timeout,
        };

        (client, event_rx)
    }

    // ── Public API methods ──────────────────────────────────────────

    /// Declare the local player ready. Sent at most once per lobby.
    ///
    /// # Errors
    ///
    /// Returns [`TurnroomError::NotConnected`] if the session is over.
    pub fn set_ready(&self) -> Result<()> {
        self.send(Command::Ready)
    }

    /// Submit a move. Dropped unless it is the local player's turn.
    ///
    /// # Errors
    ///
    /// Returns [`TurnroomError::NotConnected`] if the session is over.
    pub fn submit_move(&self, data: serde_json::Value) -> Result<()> {
        self.send(Command::Move(data))
    }

    /// Go back to the lobby after a finished game and ask the server to reset.
    ///
    /// # Errors
    ///
    /// Returns [`TurnroomError::NotConnected`] if the session is over.
    pub fn restart(&self) -> Result<()> {
        self.send(Command::Restart)
    }

    /// Post a chat line. Blank input is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TurnroomError::NotConnected`] if the session is over.
    pub fn send_chat(&self, text: impl Into<String>) -> Result<()> {
        self.send(Command::Chat(text.into()))
    }

    /// Leave the room. The loop sends `leave-room`, closes the transport and
    /// emits `Disconnected`.
    ///
    /// # Errors
    ///
    /// Returns [`TurnroomError::NotConnected`] if the session is over.
    pub fn leave_room(&self) -> Result<()> {
        self.send(Command::Leave)
    }

    /// Shut down the client, closing the transport and stopping the background task.
    pub async fn shutdown(&mut self) {
        debug!("TurnroomClient: shutdown requested");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("transport loop terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("transport loop did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("transport loop aborted: {join_err}");
                    }
                }
            }
        }

        self.connected.store(false, Ordering::Release);
    }

    // ── State accessors ─────────────────────────────────────────────

    /// Returns `true` while the transport loop is running.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Latest published session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// A receiver that observes every published snapshot.
    pub fn watch_snapshot(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Chat transcript so far, including system join notices.
    pub fn transcript(&self) -> Vec<ChatEntry> {
        self.transcript_rx.borrow().clone()
    }

    /// A receiver that observes the transcript as lines arrive.
    pub fn watch_transcript(&self) -> watch::Receiver<Vec<ChatEntry>> {
        self.transcript_rx.clone()
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn send(&self, cmd: Command) -> Result<()> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(TurnroomError::NotConnected);
        }
        self.cmd_tx
            .send(cmd)
            .map_err(|_| TurnroomError::NotConnected)
    }
}

impl std::fmt::Debug for TurnroomClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnroomClient")
            .field("connected", &self.is_connected())
            .field("phase", &self.snapshot_rx.borrow().phase)
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Drop for TurnroomClient {
    fn drop(&mut self) {
        // No executor in `Drop`, so no graceful close: abort the loop.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Transport loop ──────────────────────────────────────────────────

/// Everything the transport loop owns besides its channels.
struct LoopState {
    session: Session,
    chat: ChatLog,
    countdown: Option<Countdown>,
    player_name: String,
    countdown_seconds: u32,
    countdown_tick: Duration,
    connected: Arc<AtomicBool>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

/// What the loop should do after handling one input.
enum Flow {
    Continue,
    Exit,
}

/// Background loop multiplexing commands, inbound messages and the countdown.
///
/// Exits when:
/// - The command channel closes or shutdown is signaled
/// - The local player leaves the room
/// - The server sends a fatal `error`
/// - The transport closes or fails
async fn transport_loop(
    mut transport: impl Transport,
    mut state: LoopState,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::Sender<TurnroomEvent>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    debug!("transport loop started");
    emit_event(&event_tx, TurnroomEvent::Connected).await;

    let join = ClientMessage::JoinRoom {
        room_id: state.session.room_id().to_string(),
        player_name: state.player_name.clone(),
    };
    if let Err(e) = send_message(&mut transport, &join).await {
        error!("failed to send join-room: {e}");
        emit_disconnected(&event_tx, &state, Some(format!("transport send error: {e}"))).await;
        return;
    }

    loop {
        let flow = tokio::select! {
            // Branch 1: local action from the client handle
            cmd = cmd_rx.recv() => match cmd {
                Some(cmd) => handle_command(&mut transport, &mut state, &event_tx, cmd).await,
                None => {
                    debug!("command channel closed, shutting down transport loop");
                    let _ = transport.close().await;
                    emit_disconnected(&event_tx, &state, Some("client shut down".into())).await;
                    Flow::Exit
                }
            },

            // Branch 2: shutdown signal
            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                let _ = transport.close().await;
                emit_disconnected(&event_tx, &state, Some("client shut down".into())).await;
                Flow::Exit
            }

            // Branch 3: advisory countdown
            step = countdown::next_step(&mut state.countdown) => {
                match step {
                    CountdownStep::Remaining(remaining) => {
                        emit_event(&event_tx, TurnroomEvent::CountdownTick { remaining }).await;
                    }
                    CountdownStep::Elapsed => {
                        state.countdown = None;
                        emit_event(&event_tx, TurnroomEvent::CountdownElapsed).await;
                    }
                }
                Flow::Continue
            }

            // Branch 4: inbound message from the server
            incoming = transport.recv() => match incoming {
                Some(Ok(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(msg) => handle_server_message(&mut transport, &mut state, &event_tx, msg).await,
                    Err(e) => {
                        warn!("failed to deserialize server message: {e} (raw: {text})");
                        Flow::Continue
                    }
                },
                Some(Err(e)) => {
                    error!("transport receive error: {e}");
                    emit_disconnected(
                        &event_tx,
                        &state,
                        Some(format!("transport receive error: {e}")),
                    ).await;
                    Flow::Exit
                }
                None => {
                    debug!("transport closed by server");
                    emit_disconnected(&event_tx, &state, None).await;
                    Flow::Exit
                }
            },
        };

        if let Flow::Exit = flow {
            break;
        }
    }

    debug!("transport loop exited");
}

/// Route one decoded server message.
async fn handle_server_message(
    transport: &mut impl Transport,
    state: &mut LoopState,
    event_tx: &mpsc::Sender<TurnroomEvent>,
    msg: ServerMessage,
) -> Flow {
    debug!("received {}", msg.name());
    match msg {
        ServerMessage::Error { message } => {
            error!("server error: {message}");
            deliver_event(
                event_tx,
                TurnroomEvent::SessionError {
                    message: message.clone(),
                },
            )
            .await;
            let _ = transport.close().await;
            emit_disconnected(event_tx, state, Some(message)).await;
            Flow::Exit
        }
        ServerMessage::NewMessage(payload) => {
            let entry = state.chat.append(ChatEntry::from(payload));
            emit_event(event_tx, TurnroomEvent::ChatMessage(entry)).await;
            Flow::Continue
        }
        other => {
            let events = state.session.apply(other);
            let armed = events
                .iter()
                .any(|e| matches!(e, TurnroomEvent::CountdownStarted { .. }));
            sync_countdown(state, armed);
            publish(state);
            for event in events {
                if let TurnroomEvent::PlayerJoined { player } = &event {
                    let notice = state.chat.announce_join(&player.name);
                    emit_event(event_tx, event).await;
                    emit_event(event_tx, TurnroomEvent::ChatMessage(notice)).await;
                } else if matches!(
                    event,
                    TurnroomEvent::GameStarted { .. } | TurnroomEvent::GameFinished { .. }
                ) {
                    deliver_event(event_tx, event).await;
                } else {
                    emit_event(event_tx, event).await;
                }
            }
            Flow::Continue
        }
    }
}

/// Evaluate one local action against the session and emit it if legal.
async fn handle_command(
    transport: &mut impl Transport,
    state: &mut LoopState,
    event_tx: &mpsc::Sender<TurnroomEvent>,
    cmd: Command,
) -> Flow {
    let room_id = state.session.room_id().to_string();
    let msg = match cmd {
        Command::Ready => match state.session.request_ready() {
            Some(player_id) => ClientMessage::PlayerReady { room_id, player_id },
            None => {
                debug!("ready suppressed in phase {:?}", state.session.phase());
                return Flow::Continue;
            }
        },
        Command::Move(data) => {
            // Gate consulted immediately before emission.
            if !state.session.local_can_act() {
                debug!("move suppressed: not our turn");
                return Flow::Continue;
            }
            ClientMessage::GameAction {
                room_id,
                action: GameAction::Move,
                data,
            }
        }
        Command::Restart => {
            if !state.session.request_restart() {
                debug!("restart suppressed in phase {:?}", state.session.phase());
                return Flow::Continue;
            }
            publish(state);
            emit_event(event_tx, TurnroomEvent::SessionReset).await;
            ClientMessage::GameAction {
                room_id,
                action: GameAction::Restart,
                data: serde_json::json!({}),
            }
        }
        Command::Chat(text) => match chat::compose(&text) {
            Some(message) => ClientMessage::SendMessage {
                room_id,
                message,
                player_name: state.player_name.clone(),
            },
            None => return Flow::Continue,
        },
        Command::Leave => {
            let msg = ClientMessage::LeaveRoom { room_id };
            if let Err(e) = send_message(transport, &msg).await {
                warn!("failed to send leave-room: {e}");
            }
            let _ = transport.close().await;
            emit_disconnected(event_tx, state, Some("left room".into())).await;
            return Flow::Exit;
        }
    };

    if let Err(e) = send_message(transport, &msg).await {
        error!("transport send error: {e}");
        emit_disconnected(event_tx, state, Some(format!("transport send error: {e}"))).await;
        return Flow::Exit;
    }
    Flow::Continue
}

/// Arm the countdown when the session just entered the phase; cancel it as
/// soon as the session is anywhere else.
fn sync_countdown(state: &mut LoopState, armed: bool) {
    if state.session.phase() != Phase::Countdown {
        if state.countdown.take().is_some() {
            debug!("countdown cancelled, phase is {:?}", state.session.phase());
        }
    } else if armed {
        state.countdown = Some(Countdown::start(
            state.countdown_seconds,
            state.countdown_tick,
        ));
    }
}

fn publish(state: &LoopState) {
    state.snapshot_tx.send_replace(state.session.snapshot());
}

/// Serialize and send one message.
async fn send_message(transport: &mut impl Transport, msg: &ClientMessage) -> Result<()> {
    debug!("sending {}", msg.name());
    let json = serde_json::to_string(msg)?;
    transport.send(json).await
}

/// Emit an event to the event channel. If the channel is full, log a warning
/// and drop the event to avoid blocking the transport loop.
async fn emit_event(event_tx: &mpsc::Sender<TurnroomEvent>, event: TurnroomEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!(
                "event channel full, dropping event: {:?}",
                std::mem::discriminant(&dropped)
            );
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("event channel closed, receiver dropped");
        }
    }
}

/// Deliver an event the application must not miss, waiting for channel
/// space if needed.
async fn deliver_event(event_tx: &mpsc::Sender<TurnroomEvent>, event: TurnroomEvent) {
    if event_tx.send(event).await.is_err() {
        debug!("event channel closed, receiver dropped");
    }
}

/// Mark the session over and emit [`Disconnected`](TurnroomEvent::Disconnected).
///
/// Uses `send().await` because `Disconnected` is always the last event and
/// must never be dropped.
async fn emit_disconnected(
    event_tx: &mpsc::Sender<TurnroomEvent>,
    state: &LoopState,
    reason: Option<String>,
) {
    state.connected.store(false, Ordering::Release);
    let event = TurnroomEvent::Disconnected { reason };
    if event_tx.send(event).await.is_err() {
        debug!("event channel closed, receiver dropped");
    }
}
