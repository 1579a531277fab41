//! Session state machine: the client's mirror of one room.
//!
//! [`Session`] owns the phase, the roster and the latest authoritative
//! [`GamePayload`]. Inbound messages go through [`Session::apply`], which is
//! written as an order-tolerant reducer: roster events and game snapshots may
//! interleave in any order, redundant events are no-ops, and every snapshot is
//! adopted whole so a dropped intermediate update leaves no drift behind.
//!
//! ```text
//!   Lobby ──allReady──▶ Countdown ──game-started──▶ Playing ──finished──▶ Finished
//!     ▲ └────────────game-started──────────────────────▲                     │
//!     └──────────────────────────── local restart ──────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, warn};

use crate::event::TurnroomEvent;
use crate::gate;
use crate::outcome::{self, Outcome};
use crate::protocol::{
    GamePayload, GameState, Player, PlayerId, RoomId, RoomJoinedPayload, RoomStatus,
    ServerMessage,
};
use crate::roster::Roster;

/// Label used by [`Session::turn_label`] when it is the local player's turn.
pub const LOCAL_PLAYER_LABEL: &str = "You";

/// Coarse lifecycle stage of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Phase {
    #[default]
    Lobby,
    Countdown,
    Playing,
    Finished,
}

impl From<GameState> for Phase {
    fn from(state: GameState) -> Self {
        match state {
            GameState::Playing => Self::Playing,
            GameState::Finished => Self::Finished,
        }
    }
}

/// Read-only copy of the session handed to outer layers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub room_id: RoomId,
    pub local_player_id: Option<PlayerId>,
    pub is_host: bool,
    pub phase: Phase,
    pub players: Vec<Player>,
    pub payload: Option<GamePayload>,
    /// Turn gate result for the local player at snapshot time.
    pub can_act: bool,
    /// Set once the phase is [`Phase::Finished`].
    pub outcome: Option<Outcome>,
}

/// Client-side state of one room session.
#[derive(Debug, Clone)]
pub struct Session {
    room_id: RoomId,
    local_player_id: Option<PlayerId>,
    is_host: bool,
    phase: Phase,
    roster: Roster,
    payload: Option<GamePayload>,
    /// Cell count of the first adopted board.
    board_len: Option<usize>,
    ready_requested: bool,
    countdown_seconds: u32,
}

impl Session {
    /// Create a session in the lobby for `room_id`.
    ///
    /// `countdown_seconds` is the length reported in
    /// [`TurnroomEvent::CountdownStarted`].
    pub fn new(room_id: impl Into<RoomId>, countdown_seconds: u32) -> Self {
        Self {
            room_id: room_id.into(),
            local_player_id: None,
            is_host: false,
            phase: Phase::Lobby,
            roster: Roster::new(),
            payload: None,
            board_len: None,
            ready_requested: false,
            countdown_seconds,
        }
    }

    /// Seed the local player id before `room-joined` arrives.
    ///
    /// A `playerId` carried in `room-joined` still replaces it.
    #[must_use]
    pub fn with_local_player_id(mut self, player_id: impl Into<PlayerId>) -> Self {
        self.local_player_id = Some(player_id.into());
        self
    }

    // ── Reducer ─────────────────────────────────────────────────────

    /// Apply one inbound message and return the events it produced.
    ///
    /// `new-message` and `error` are not session state; they are routed by the
    /// client and produce nothing here.
    pub fn apply(&mut self, msg: ServerMessage) -> Vec<TurnroomEvent> {
        match msg {
            ServerMessage::RoomJoined(payload) => self.apply_room_joined(*payload),
            ServerMessage::PlayerJoined { player } => {
                if self.roster.contains(&player.id) {
                    debug!("session: duplicate join for {}", player.id);
                    return Vec::new();
                }
                self.roster.apply_join(player.clone());
                vec![TurnroomEvent::PlayerJoined { player }]
            }
            ServerMessage::PlayerLeft { player_id } => {
                if !self.roster.contains(&player_id) {
                    debug!("session: leave for unknown player {player_id}");
                    return Vec::new();
                }
                self.roster.apply_leave(&player_id);
                vec![TurnroomEvent::PlayerLeft { player_id }]
            }
            ServerMessage::PlayerReadyUpdate {
                player_id,
                all_ready,
            } => self.apply_ready_update(player_id, all_ready),
            ServerMessage::GameStarted(payload) => self.apply_game_started(payload),
            ServerMessage::GameUpdate(payload) => self.apply_game_update(payload),
            ServerMessage::NewMessage(_) | ServerMessage::Error { .. } => Vec::new(),
        }
    }

    /// Adopt `payload` as the current snapshot, replacing the previous one.
    ///
    /// The phase is re-derived from `payload.game_state`; nothing from the
    /// previous snapshot survives.
    pub fn apply_game_update(&mut self, payload: GamePayload) -> Vec<TurnroomEvent> {
        let previous = self.adopt(payload.clone());
        if self.phase == Phase::Finished && previous != Phase::Finished {
            return vec![self.finished_event(payload)];
        }
        vec![TurnroomEvent::GameUpdated { payload }]
    }

    fn apply_game_started(&mut self, payload: GamePayload) -> Vec<TurnroomEvent> {
        if matches!(self.phase, Phase::Playing | Phase::Finished) {
            debug!(
                "session: game-started while {:?}, adopting new game",
                self.phase
            );
        }
        self.adopt(payload.clone());
        if self.phase == Phase::Finished {
            return vec![self.finished_event(payload)];
        }
        vec![TurnroomEvent::GameStarted { payload }]
    }

    fn apply_room_joined(&mut self, joined: RoomJoinedPayload) -> Vec<TurnroomEvent> {
        let RoomJoinedPayload {
            is_host,
            player_id,
            room,
        } = joined;

        self.room_id = room.id;
        if player_id.is_some() {
            self.local_player_id = player_id;
        }
        self.is_host = is_host;
        self.roster.replace_all(room.players);
        self.phase = Phase::Lobby;
        self.payload = None;
        self.board_len = None;
        self.ready_requested = false;
        debug!(
            "session: joined room {} with {} player(s)",
            self.room_id,
            self.roster.len()
        );

        let mut events = vec![TurnroomEvent::RoomJoined {
            room_id: self.room_id.clone(),
            player_id: self.local_player_id.clone(),
            is_host,
            players: self.roster.players().to_vec(),
        }];

        match (room.game_state, room.game_data) {
            (RoomStatus::Playing | RoomStatus::Finished, Some(data)) => {
                events.extend(self.apply_game_started(data));
            }
            (RoomStatus::Playing, None) => {
                warn!("room {} is playing but carried no game data", self.room_id);
            }
            _ => {}
        }
        events
    }

    fn apply_ready_update(&mut self, player_id: PlayerId, all_ready: bool) -> Vec<TurnroomEvent> {
        let mut events = Vec::new();
        let was_ready = self.roster.find(&player_id).is_some_and(|p| p.is_ready);
        if self.roster.contains(&player_id) && !was_ready {
            self.roster.apply_ready_update(&player_id);
            events.push(TurnroomEvent::PlayerReady {
                player_id,
                all_ready,
            });
        }

        if all_ready && self.phase == Phase::Lobby {
            self.phase = Phase::Countdown;
            debug!("session: everyone ready, countdown started");
            events.push(TurnroomEvent::CountdownStarted {
                seconds: self.countdown_seconds,
            });
        }
        events
    }

    /// Replace the payload and re-derive the phase. Returns the previous phase.
    fn adopt(&mut self, payload: GamePayload) -> Phase {
        let len = payload.board.len();
        match self.board_len {
            None => self.board_len = Some(len),
            Some(expected) if expected != len => {
                warn!("board size changed from {expected} to {len} cells");
            }
            Some(_) => {}
        }

        let previous = self.phase;
        self.phase = Phase::from(payload.game_state);
        self.payload = Some(payload);
        if previous != self.phase {
            debug!("session: phase {previous:?} -> {:?}", self.phase);
        }
        previous
    }

    fn finished_event(&self, payload: GamePayload) -> TurnroomEvent {
        let outcome = outcome::resolve(&payload, self.local_id(), &self.roster);
        debug!("session: game finished, outcome {:?}", outcome.kind);
        TurnroomEvent::GameFinished { payload, outcome }
    }

    // ── Local actions ───────────────────────────────────────────────

    /// Finished → Lobby on a user restart.
    ///
    /// Clears the payload and every readiness flag. Returns `false` (and
    /// changes nothing) outside [`Phase::Finished`]; the restart must then not
    /// be emitted.
    pub fn request_restart(&mut self) -> bool {
        if self.phase != Phase::Finished {
            return false;
        }
        self.payload = None;
        self.roster.reset_ready();
        self.ready_requested = false;
        self.phase = Phase::Lobby;
        debug!("session: restart, back to lobby");
        true
    }

    /// Returns the local id if a ready request may be emitted now, and records
    /// that it was requested.
    ///
    /// Readiness is sent once per lobby: not before the server assigned our
    /// id, not outside [`Phase::Lobby`], and not when already ready.
    pub fn request_ready(&mut self) -> Option<PlayerId> {
        if self.phase != Phase::Lobby || self.ready_requested {
            return None;
        }
        let id = self.local_player_id.clone()?;
        if self.roster.find(&id).is_some_and(|p| p.is_ready) {
            return None;
        }
        self.ready_requested = true;
        Some(id)
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// Turn gate for `player_id`. See [`gate::can_act`].
    pub fn can_act(&self, player_id: &str) -> bool {
        gate::can_act(self.phase, self.payload.as_ref(), player_id)
    }

    /// Turn gate for the local player; `false` until the id is known.
    pub fn local_can_act(&self) -> bool {
        self.local_player_id
            .as_deref()
            .is_some_and(|id| self.can_act(id))
    }

    /// Outcome for the local player once the game is finished.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.phase != Phase::Finished {
            return None;
        }
        self.payload
            .as_ref()
            .map(|p| outcome::resolve(p, self.local_id(), &self.roster))
    }

    /// Who is to move, for display: [`LOCAL_PLAYER_LABEL`], the roster name,
    /// or the unknown-player label. `None` when nobody is.
    pub fn turn_label(&self) -> Option<&str> {
        let turn = self.payload.as_ref()?.turn.as_deref()?;
        if Some(turn) == self.local_player_id.as_deref() {
            return Some(LOCAL_PLAYER_LABEL);
        }
        Some(self.roster.display_name(turn))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn payload(&self) -> Option<&GamePayload> {
        self.payload.as_ref()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn local_player_id(&self) -> Option<&str> {
        self.local_player_id.as_deref()
    }

    pub fn is_host(&self) -> bool {
        self.is_host
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            room_id: self.room_id.clone(),
            local_player_id: self.local_player_id.clone(),
            is_host: self.is_host,
            phase: self.phase,
            players: self.roster.players().to_vec(),
            payload: self.payload.clone(),
            can_act: self.local_can_act(),
            outcome: self.outcome(),
        }
    }

    fn local_id(&self) -> &str {
        self.local_player_id.as_deref().unwrap_or_default()
    }
}
