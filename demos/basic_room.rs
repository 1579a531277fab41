//! # Basic Room Example
//!
//! Walks one Turnroom session end to end:
//!
//! 1. Connect to a room server via WebSocket
//! 2. Join a room and declare ready
//! 3. Play the first empty cell whenever it is our turn
//! 4. Report the outcome and leave on Ctrl+C or when the game ends
//!
//! ## Running
//!
//! ```sh
//! # Start a Turnroom server on localhost:3000, then:
//! cargo run --example basic_room
//!
//! # Override the server URL and room:
//! TURNROOM_URL=ws://my-server:3000/ws TURNROOM_ROOM=ABC123 cargo run --example basic_room
//! ```

use serde_json::json;
use turnroom_client::{
    GamePayload, OutcomeKind, TurnroomClient, TurnroomConfig, TurnroomEvent, WebSocketTransport,
};

/// Default server URL when `TURNROOM_URL` is not set.
const DEFAULT_URL: &str = "ws://localhost:3000/ws";

/// Default room when `TURNROOM_ROOM` is not set.
const DEFAULT_ROOM: &str = "DEMO01";

/// Index of the first unclaimed cell, if any.
fn first_empty_cell(payload: &GamePayload) -> Option<usize> {
    payload.board.iter().position(Option::is_none)
}

fn try_move(client: &TurnroomClient, payload: &GamePayload) -> Result<(), Box<dyn std::error::Error>> {
    if !client.snapshot().can_act {
        return Ok(());
    }
    if let Some(position) = first_empty_cell(payload) {
        tracing::info!("Playing cell {position}");
        client.submit_move(json!({ "position": position }))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Set `RUST_LOG=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let url = std::env::var("TURNROOM_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    let room = std::env::var("TURNROOM_ROOM").unwrap_or_else(|_| DEFAULT_ROOM.to_string());
    tracing::info!("Connecting to {url}");

    // ── Connect ─────────────────────────────────────────────────────
    let transport = WebSocketTransport::connect(&url).await?;
    let config = TurnroomConfig::new(room, "RustPlayer");

    // The loop sends `join-room` on its own as soon as it starts.
    let (mut client, mut event_rx) = TurnroomClient::start(transport, config);

    // ── Event loop ──────────────────────────────────────────────────
    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else {
                    tracing::info!("Event channel closed, exiting");
                    break;
                };

                match event {
                    TurnroomEvent::Connected => {
                        tracing::info!("Transport connected, joining room…");
                    }

                    TurnroomEvent::RoomJoined { room_id, players, is_host, .. } => {
                        tracing::info!(
                            "Joined room {room_id} ({} player(s) present, host={is_host})",
                            players.len()
                        );
                        client.set_ready()?;
                        client.send_chat("hello from Rust")?;
                    }

                    TurnroomEvent::PlayerJoined { player } => {
                        tracing::info!("Player joined: {} ({})", player.name, player.id);
                    }

                    TurnroomEvent::PlayerLeft { player_id } => {
                        tracing::info!("Player left: {player_id}");
                    }

                    TurnroomEvent::CountdownStarted { seconds } => {
                        tracing::info!("Everyone is ready, starting in {seconds}…");
                    }

                    TurnroomEvent::CountdownTick { remaining } => {
                        tracing::info!("{remaining}…");
                    }

                    TurnroomEvent::GameStarted { payload } | TurnroomEvent::GameUpdated { payload } => {
                        try_move(&client, &payload)?;
                    }

                    TurnroomEvent::GameFinished { outcome, .. } => {
                        match outcome.kind {
                            OutcomeKind::SelfWin => tracing::info!("You win!"),
                            OutcomeKind::OtherWin => tracing::info!(
                                "{} wins",
                                outcome.winner_name.as_deref().unwrap_or("Another player")
                            ),
                            OutcomeKind::Draw => tracing::info!("It's a draw"),
                        }
                        client.leave_room()?;
                    }

                    TurnroomEvent::ChatMessage(entry) => {
                        tracing::info!("[{}] {}: {}", entry.timestamp, entry.sender, entry.text);
                    }

                    TurnroomEvent::SessionError { message } => {
                        tracing::error!("Server error: {message}");
                    }

                    TurnroomEvent::Disconnected { reason } => {
                        tracing::warn!("Disconnected: {}", reason.as_deref().unwrap_or("unknown"));
                        break;
                    }

                    other => {
                        tracing::debug!("Event: {other:?}");
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, leaving room…");
                break;
            }
        }
    }

    client.shutdown().await;
    tracing::info!("Client shut down. Goodbye!");
    Ok(())
}
