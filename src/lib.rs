//! # Turnroom Client
//!
//! Transport-agnostic Rust client for realtime, multi-party, turn-based game rooms.
//!
//! The server is authoritative for membership, turn order, board and scores.
//! This crate mirrors that state on the client: it joins a room, tracks the
//! roster and readiness, adopts every game snapshot the server pushes, refuses
//! to emit moves when it is not the local player's turn, and classifies the
//! final result.
//!
//! ## Features
//!
//! - **Transport-agnostic**: implement the [`Transport`] trait for any backend
//! - **Order-tolerant session**: [`Session`] is an idempotent reducer over [`ServerMessage`]s
//! - **Turn gate**: moves out of turn are dropped before they reach the wire
//! - **WebSocket built-in**: default `transport-websocket` feature provides `WebSocketTransport`
//! - **Event-driven**: receive typed [`TurnroomEvent`]s via a channel
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use turnroom_client::{TurnroomClient, TurnroomConfig, TurnroomEvent, WebSocketTransport};
//!
//! let transport = WebSocketTransport::connect("ws://localhost:3000/turnroom").await?;
//! let (client, mut events) =
//!     TurnroomClient::start(transport, TurnroomConfig::new("ROOM42", "Alice"));
//!
//! while let Some(event) = events.recv().await {
//!     if let TurnroomEvent::GameFinished { outcome, .. } = event {
//!         println!("{outcome:?}");
//!     }
//! }
//! ```

pub mod chat;
pub mod client;
pub mod countdown;
pub mod error;
pub mod event;
pub mod gate;
pub mod outcome;
pub mod protocol;
pub mod roster;
pub mod session;
pub mod transport;
pub mod transports;

// Re-export primary types for ergonomic imports.
pub use client::{TurnroomClient, TurnroomConfig};
pub use error::TurnroomError;
pub use event::TurnroomEvent;
pub use outcome::{Outcome, OutcomeKind};
pub use protocol::{ClientMessage, GamePayload, Player, ServerMessage};
pub use session::{Phase, Session, SessionSnapshot};
pub use transport::Transport;

#[cfg(feature = "transport-websocket")]
pub use transports::WebSocketTransport;
