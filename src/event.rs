//! High-level events delivered to the application.
//!
//! [`TurnroomEvent`] is what the renderer consumes. The session reducer turns
//! each decoded [`ServerMessage`](crate::protocol::ServerMessage) into zero or
//! more events; the client adds the synthetic `Connected`, countdown and
//! `Disconnected` events.

use crate::chat::ChatEntry;
use crate::outcome::Outcome;
use crate::protocol::{GamePayload, Player, PlayerId, RoomId};

/// Events emitted by the Turnroom client.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnroomEvent {
    /// The transport loop started. Always the first event.
    Connected,

    /// The server accepted our join and sent the room snapshot.
    RoomJoined {
        room_id: RoomId,
        player_id: Option<PlayerId>,
        is_host: bool,
        players: Vec<Player>,
    },

    /// A new player appeared in the roster.
    PlayerJoined { player: Player },

    /// A player was removed from the roster.
    PlayerLeft { player_id: PlayerId },

    /// A player became ready.
    PlayerReady { player_id: PlayerId, all_ready: bool },

    /// Everyone is ready; an advisory countdown of `seconds` started.
    CountdownStarted { seconds: u32 },

    /// Seconds left on the advisory countdown.
    CountdownTick { remaining: u32 },

    /// The advisory countdown ran out. The game starts only on `GameStarted`.
    CountdownElapsed,

    /// A game started; `payload` is the first snapshot.
    ///
    /// Never dropped: when the event channel is full the transport loop waits
    /// for room.
    GameStarted { payload: GamePayload },

    /// A new snapshot replaced the previous one while playing.
    GameUpdated { payload: GamePayload },

    /// The game ended. Delivered like [`GameStarted`](Self::GameStarted),
    /// even when the event channel is full.
    GameFinished {
        payload: GamePayload,
        outcome: Outcome,
    },

    /// The room went back to the lobby after a local restart.
    SessionReset,

    /// A chat line was appended to the transcript.
    ChatMessage(ChatEntry),

    /// The server reported a fatal error. `Disconnected` follows.
    SessionError { message: String },

    /// The session is over. Always the last event.
    Disconnected { reason: Option<String> },
}
