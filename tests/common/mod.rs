#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for Turnroom client integration tests.
//!
//! Provides a channel-driven [`MockTransport`] and helpers for building the
//! server event JSON the client consumes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use turnroom_client::protocol::{
    ChatMessagePayload, GamePayload, GameState, Player, RoomJoinedPayload, RoomSnapshot,
    RoomStatus, ServerMessage,
};
use turnroom_client::{TurnroomError, Transport};

// ── MockTransport ───────────────────────────────────────────────────

/// Scripted frames are delivered first, then anything pushed through the
/// [`ServerHandle`] while the test runs. All client frames are recorded.
pub struct MockTransport {
    scripted: VecDeque<Option<Result<String, TurnroomError>>>,
    live: mpsc::UnboundedReceiver<Option<String>>,
    sent: Arc<StdMutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
    connection_id: Option<String>,
}

/// Test-side end of a [`MockTransport`].
#[derive(Clone)]
pub struct ServerHandle {
    push: mpsc::UnboundedSender<Option<String>>,
    pub sent: Arc<StdMutex<Vec<String>>>,
    pub closed: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new(scripted: Vec<Option<Result<String, TurnroomError>>>) -> (Self, ServerHandle) {
        let (push, live) = mpsc::unbounded_channel();
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let transport = Self {
            scripted: VecDeque::from(scripted),
            live,
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
            connection_id: None,
        };
        (transport, ServerHandle { push, sent, closed })
    }

    /// Report `id` as the server-assigned connection id.
    pub fn with_connection_id(mut self, id: &str) -> Self {
        self.connection_id = Some(id.into());
        self
    }
}

impl ServerHandle {
    /// Deliver one frame to the client.
    pub fn push(&self, frame: String) {
        self.push.send(Some(frame)).unwrap();
    }

    /// Close the connection from the server side.
    pub fn hang_up(&self) {
        self.push.send(None).unwrap();
    }

    /// Decoded frames the client has sent so far.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|s| serde_json::from_str(s).unwrap())
            .collect()
    }

    /// Event names the client has sent so far.
    pub fn sent_events(&self) -> Vec<String> {
        self.sent_json()
            .iter()
            .map(|v| v["event"].as_str().unwrap().to_string())
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, message: String) -> Result<(), TurnroomError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, TurnroomError>> {
        if let Some(item) = self.scripted.pop_front() {
            return item;
        }
        match self.live.recv().await {
            Some(Some(frame)) => Some(Ok(frame)),
            Some(None) => None,
            // Test dropped its handle; keep the loop alive until shutdown.
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), TurnroomError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn connection_id(&self) -> Option<String> {
        self.connection_id.clone()
    }
}

// ── Builders ────────────────────────────────────────────────────────

pub fn player(id: &str, name: &str) -> Player {
    Player::new(id, name)
}

pub fn payload(turn: Option<&str>, state: GameState, winner: Option<&str>) -> GamePayload {
    GamePayload {
        turn: turn.map(Into::into),
        board: vec![None; 9],
        scores: Default::default(),
        game_state: state,
        winner: winner.map(Into::into),
    }
}

fn to_json(msg: &ServerMessage) -> String {
    serde_json::to_string(msg).expect("server message serialization")
}

/// `room-joined` for a waiting room.
pub fn room_joined_json(local_id: &str, players: Vec<Player>) -> String {
    to_json(&ServerMessage::RoomJoined(Box::new(RoomJoinedPayload {
        is_host: true,
        player_id: Some(local_id.into()),
        room: RoomSnapshot {
            id: "ROOM1".into(),
            players,
            game_state: RoomStatus::Waiting,
            game_data: None,
        },
    })))
}

/// `room-joined` as the room server sends it: no `playerId`, the id is the
/// connection's own.
pub fn room_joined_anonymous_json(players: Vec<Player>) -> String {
    to_json(&ServerMessage::RoomJoined(Box::new(RoomJoinedPayload {
        is_host: true,
        player_id: None,
        room: RoomSnapshot {
            id: "ROOM1".into(),
            players,
            game_state: RoomStatus::Waiting,
            game_data: None,
        },
    })))
}

pub fn player_joined_json(id: &str, name: &str) -> String {
    to_json(&ServerMessage::PlayerJoined {
        player: player(id, name),
    })
}

pub fn player_left_json(id: &str) -> String {
    to_json(&ServerMessage::PlayerLeft {
        player_id: id.into(),
    })
}

pub fn ready_update_json(id: &str, all_ready: bool) -> String {
    to_json(&ServerMessage::PlayerReadyUpdate {
        player_id: id.into(),
        all_ready,
    })
}

pub fn game_started_json(payload: GamePayload) -> String {
    to_json(&ServerMessage::GameStarted(payload))
}

pub fn game_update_json(payload: GamePayload) -> String {
    to_json(&ServerMessage::GameUpdate(payload))
}

pub fn new_message_json(name: &str, message: &str) -> String {
    to_json(&ServerMessage::NewMessage(ChatMessagePayload {
        player_name: name.into(),
        message: message.into(),
        timestamp: "12:00".into(),
    }))
}

pub fn error_json(message: &str) -> String {
    to_json(&ServerMessage::Error {
        message: message.into(),
    })
}
