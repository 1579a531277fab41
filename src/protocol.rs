//! Wire types for the Turnroom room protocol.
//!
//! Every message is one JSON text frame of the form
//! `{"event": "<kebab-case-name>", "data": <payload>}`. Payload fields use
//! `camelCase`, matching what the session server emits.
//!
//! Decoding is the validation boundary: a frame with an unknown event name or a
//! missing required field fails to deserialize and never reaches the session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Type aliases ────────────────────────────────────────────────────

/// Connection-assigned player identifier, unique per session. Opaque.
pub type PlayerId = String;

/// Identifier of a room.
pub type RoomId = String;

/// One board cell. `None` is an empty cell.
pub type Cell = Option<String>;

// ── Enums ───────────────────────────────────────────────────────────

/// Server-side game status carried in every [`GamePayload`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    /// A game is in progress.
    Playing,
    /// The game has ended; `winner` is final.
    Finished,
}

/// Room status as reported in the `room-joined` snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Players are gathering; no game running.
    #[default]
    #[serde(alias = "lobby")]
    Waiting,
    /// A game is in progress; `gameData` carries the current snapshot.
    Playing,
    /// The last game ended and nobody restarted yet.
    Finished,
}

/// Kind of a `game-action` request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameAction {
    /// Play a move; `data` is game specific (e.g. `{"position": 4}`).
    Move,
    /// Ask the server to reset the room for another game.
    Restart,
}

// ── Structs ─────────────────────────────────────────────────────────

/// A player in the room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub is_host: bool,
    #[serde(default)]
    pub is_ready: bool,
}

impl Player {
    /// Create a non-host player that is not ready yet.
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_host: false,
            is_ready: false,
        }
    }
}

/// Authoritative game snapshot. Always adopted whole, never merged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GamePayload {
    /// Player whose turn it is, if any.
    #[serde(default)]
    pub turn: Option<PlayerId>,
    /// Board cells in index order.
    #[serde(default)]
    pub board: Vec<Cell>,
    /// Scores by player id.
    #[serde(default)]
    pub scores: BTreeMap<PlayerId, i64>,
    pub game_state: GameState,
    /// Winner once the game is finished; `None` with `Finished` is a draw.
    #[serde(default)]
    pub winner: Option<PlayerId>,
}

impl GamePayload {
    /// Score for `player_id`, or zero when the server has not scored them.
    pub fn score_of(&self, player_id: &str) -> i64 {
        self.scores.get(player_id).copied().unwrap_or(0)
    }

    /// Returns `true` once the server declared the game over.
    pub fn is_finished(&self) -> bool {
        self.game_state == GameState::Finished
    }
}

/// Room snapshot delivered on join.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: RoomId,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default, alias = "phase")]
    pub game_state: RoomStatus,
    #[serde(default)]
    pub game_data: Option<GamePayload>,
}

/// Payload for the `room-joined` server message.
/// Boxed in `ServerMessage` to reduce enum size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoinedPayload {
    pub is_host: bool,
    /// Id the server assigned to this connection.
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    pub room: RoomSnapshot,
}

/// Payload for the `new-message` server message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePayload {
    pub player_name: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
}

// ── Messages ────────────────────────────────────────────────────────

/// Events sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Join (or create) a room. Always the first message of a session.
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: RoomId,
        player_name: String,
    },
    /// Declare the local player ready.
    #[serde(rename_all = "camelCase")]
    PlayerReady {
        room_id: RoomId,
        player_id: PlayerId,
    },
    /// Play a move or request a restart.
    #[serde(rename_all = "camelCase")]
    GameAction {
        room_id: RoomId,
        action: GameAction,
        data: serde_json::Value,
    },
    /// Post a chat line to the room.
    #[serde(rename_all = "camelCase")]
    SendMessage {
        room_id: RoomId,
        message: String,
        player_name: String,
    },
    /// Leave the room.
    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_id: RoomId },
}

/// Events sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Successfully joined a room (boxed to reduce enum size).
    RoomJoined(Box<RoomJoinedPayload>),
    /// Another player joined the room.
    PlayerJoined { player: Player },
    /// A player left the room.
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: PlayerId },
    /// A player declared ready. `all_ready` is decided by the server.
    #[serde(rename_all = "camelCase")]
    PlayerReadyUpdate {
        player_id: PlayerId,
        #[serde(default)]
        all_ready: bool,
    },
    /// A game started with its first snapshot.
    GameStarted(GamePayload),
    /// A new authoritative snapshot.
    GameUpdate(GamePayload),
    /// A chat line from the room.
    NewMessage(ChatMessagePayload),
    /// Fatal error; the session is over.
    Error { message: String },
}

impl ServerMessage {
    /// Wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomJoined(_) => "room-joined",
            Self::PlayerJoined { .. } => "player-joined",
            Self::PlayerLeft { .. } => "player-left",
            Self::PlayerReadyUpdate { .. } => "player-ready-update",
            Self::GameStarted(_) => "game-started",
            Self::GameUpdate(_) => "game-update",
            Self::NewMessage(_) => "new-message",
            Self::Error { .. } => "error",
        }
    }
}

impl ClientMessage {
    /// Wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join-room",
            Self::PlayerReady { .. } => "player-ready",
            Self::GameAction { .. } => "game-action",
            Self::SendMessage { .. } => "send-message",
            Self::LeaveRoom { .. } => "leave-room",
        }
    }
}
