#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Session reducer tests: the lobby-to-finish scenarios and the reducer
//! properties (idempotence, full replace, gate soundness, outcome totality,
//! order tolerance), driven directly without a transport.

use std::collections::BTreeMap;

use turnroom_client::outcome::{resolve, OutcomeKind};
use turnroom_client::protocol::{
    GamePayload, GameState, Player, RoomJoinedPayload, RoomSnapshot, RoomStatus, ServerMessage,
};
use turnroom_client::roster::UNKNOWN_PLAYER_LABEL;
use turnroom_client::{Phase, Session, TurnroomEvent};

// ════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════

fn joined(local: &str) -> ServerMessage {
    ServerMessage::RoomJoined(Box::new(RoomJoinedPayload {
        is_host: false,
        player_id: Some(local.into()),
        room: RoomSnapshot {
            id: "ROOM1".into(),
            players: vec![],
            game_state: RoomStatus::Waiting,
            game_data: None,
        },
    }))
}

fn join(id: &str, name: &str) -> ServerMessage {
    ServerMessage::PlayerJoined {
        player: Player::new(id, name),
    }
}

fn leave(id: &str) -> ServerMessage {
    ServerMessage::PlayerLeft {
        player_id: id.into(),
    }
}

fn ready(id: &str, all_ready: bool) -> ServerMessage {
    ServerMessage::PlayerReadyUpdate {
        player_id: id.into(),
        all_ready,
    }
}

fn empty_board() -> Vec<Option<String>> {
    vec![None; 9]
}

fn started_a() -> GamePayload {
    GamePayload {
        turn: Some("A".into()),
        board: empty_board(),
        scores: BTreeMap::new(),
        game_state: GameState::Playing,
        winner: None,
    }
}

fn a_wins() -> GamePayload {
    let mut board = empty_board();
    for cell in board.iter_mut().take(3) {
        *cell = Some("X".into());
    }
    GamePayload {
        turn: Some("A".into()),
        board,
        scores: BTreeMap::from([("A".to_string(), 1)]),
        game_state: GameState::Finished,
        winner: Some("A".into()),
    }
}

fn draw() -> GamePayload {
    GamePayload {
        winner: None,
        ..a_wins()
    }
}

/// Session for local `local`, with Alice ("A") in the roster, in the lobby.
fn lobby_as(local: &str) -> Session {
    let mut session = Session::new("ROOM1", 5);
    session.apply(joined(local));
    session.apply(join("A", "Alice"));
    session
}

// ════════════════════════════════════════════════════════════════════
// Scenarios
// ════════════════════════════════════════════════════════════════════

#[test]
fn scenario_ready_without_all_ready_stays_in_lobby() {
    let mut session = lobby_as("A");
    session.apply(ready("A", false));

    assert_eq!(session.phase(), Phase::Lobby);
    assert!(session.roster().find("A").unwrap().is_ready);
}

#[test]
fn scenario_joined_player_is_listed_not_ready() {
    let session = lobby_as("A");
    let alice = session.roster().find("A").unwrap();
    assert_eq!(alice.name, "Alice");
    assert!(!alice.is_ready);
    assert_eq!(session.phase(), Phase::Lobby);
}

#[test]
fn scenario_all_ready_enters_countdown() {
    let mut session = lobby_as("A");
    session.apply(ready("A", true));
    assert_eq!(session.phase(), Phase::Countdown);
}

#[test]
fn scenario_game_started_gates_by_turn() {
    let mut session = lobby_as("A");
    session.apply(ready("A", true));
    session.apply(ServerMessage::GameStarted(started_a()));

    assert_eq!(session.phase(), Phase::Playing);
    assert!(session.can_act("A"));
    assert!(!session.can_act("B"));
}

#[test]
fn scenario_finished_self_win() {
    let mut session = lobby_as("A");
    session.apply(ServerMessage::GameStarted(started_a()));
    let events = session.apply(ServerMessage::GameUpdate(a_wins()));

    assert_eq!(session.phase(), Phase::Finished);
    let outcome = resolve(session.payload().unwrap(), "A", session.roster());
    assert_eq!(outcome.kind, OutcomeKind::SelfWin);
    assert!(matches!(
        &events[..],
        [TurnroomEvent::GameFinished { outcome, .. }] if outcome.kind == OutcomeKind::SelfWin
    ));
}

#[test]
fn scenario_finished_other_win_names_winner() {
    let mut session = lobby_as("B");
    session.apply(ServerMessage::GameStarted(started_a()));
    session.apply(ServerMessage::GameUpdate(a_wins()));

    let outcome = session.outcome().unwrap();
    assert_eq!(outcome.kind, OutcomeKind::OtherWin);
    assert_eq!(outcome.winner_name.as_deref(), Some("Alice"));
}

#[test]
fn scenario_null_winner_is_draw_for_every_local_id() {
    for local in ["A", "B", "C"] {
        let mut session = lobby_as(local);
        session.apply(ServerMessage::GameStarted(started_a()));
        session.apply(ServerMessage::GameUpdate(draw()));
        assert_eq!(session.outcome().unwrap().kind, OutcomeKind::Draw);
    }
}

// ════════════════════════════════════════════════════════════════════
// Properties
// ════════════════════════════════════════════════════════════════════

#[test]
fn join_and_leave_are_idempotent() {
    let mut once = lobby_as("A");
    once.apply(join("B", "Bob"));
    let mut twice = lobby_as("A");
    twice.apply(join("B", "Bob"));
    twice.apply(join("B", "Bob"));
    assert_eq!(once.roster(), twice.roster());

    once.apply(leave("B"));
    twice.apply(leave("B"));
    twice.apply(leave("B"));
    assert_eq!(once.roster(), twice.roster());
}

#[test]
fn stored_payload_is_always_the_last_snapshot() {
    let mut session = lobby_as("A");
    session.apply(ServerMessage::GameStarted(started_a()));

    let mut with_scores = started_a();
    with_scores.scores.insert("A".into(), 7);
    with_scores.scores.insert("B".into(), 2);
    with_scores.board[4] = Some("X".into());

    let mut sparse = started_a();
    sparse.turn = Some("B".into());

    let updates = [with_scores, sparse, started_a()];
    for update in updates {
        session.apply(ServerMessage::GameUpdate(update.clone()));
        assert_eq!(session.payload(), Some(&update));
    }
}

#[test]
fn gate_tracks_phase_and_turn_across_updates() {
    let mut session = lobby_as("A");
    assert!(!session.can_act("A"));

    session.apply(ServerMessage::GameStarted(started_a()));
    assert!(session.can_act("A"));

    let mut b_turn = started_a();
    b_turn.turn = Some("B".into());
    session.apply(ServerMessage::GameUpdate(b_turn));
    assert!(!session.can_act("A"));
    assert!(session.can_act("B"));

    session.apply(ServerMessage::GameUpdate(a_wins()));
    assert!(!session.can_act("A"));

    session.request_restart();
    assert!(!session.can_act("A"));
}

#[test]
fn outcome_is_total_without_roster() {
    let roster = turnroom_client::roster::Roster::new();
    for payload in [a_wins(), draw()] {
        for local in ["A", "B", ""] {
            let outcome = resolve(&payload, local, &roster);
            match outcome.kind {
                OutcomeKind::SelfWin | OutcomeKind::Draw => assert!(outcome.winner_name.is_none()),
                OutcomeKind::OtherWin => {
                    assert_eq!(outcome.winner_name.as_deref(), Some(UNKNOWN_PLAYER_LABEL));
                }
            }
        }
    }
}

#[test]
fn game_started_before_roster_resolves_later() {
    let mut session = Session::new("ROOM1", 5);
    session.apply(joined("B"));
    session.apply(ServerMessage::GameStarted(started_a()));
    assert_eq!(session.phase(), Phase::Playing);
    assert_eq!(session.turn_label(), Some(UNKNOWN_PLAYER_LABEL));

    session.apply(join("A", "Alice"));
    assert_eq!(session.turn_label(), Some("Alice"));

    session.apply(ServerMessage::GameUpdate(a_wins()));
    assert_eq!(
        session.outcome().unwrap().winner_name.as_deref(),
        Some("Alice")
    );
}

#[test]
fn update_without_started_still_adopts() {
    let mut session = lobby_as("A");
    session.apply(ServerMessage::GameUpdate(started_a()));
    assert_eq!(session.phase(), Phase::Playing);
    assert!(session.can_act("A"));
}

#[test]
fn restart_resets_readiness_and_allows_new_game() {
    let mut session = lobby_as("A");
    session.apply(join("B", "Bob"));
    session.apply(ready("A", false));
    session.apply(ready("B", true));
    session.apply(ServerMessage::GameStarted(started_a()));
    session.apply(ServerMessage::GameUpdate(a_wins()));

    assert!(session.request_restart());
    assert_eq!(session.phase(), Phase::Lobby);
    assert!(session.payload().is_none());
    assert!(session.outcome().is_none());
    assert!(session.roster().players().iter().all(|p| !p.is_ready));

    session.apply(ready("A", false));
    session.apply(ready("B", true));
    assert_eq!(session.phase(), Phase::Countdown);
    session.apply(ServerMessage::GameStarted(started_a()));
    assert_eq!(session.phase(), Phase::Playing);
}

#[test]
fn leave_of_current_turn_player_keeps_game() {
    let mut session = lobby_as("B");
    session.apply(ServerMessage::GameStarted(started_a()));
    session.apply(leave("A"));

    assert_eq!(session.phase(), Phase::Playing);
    assert_eq!(session.turn_label(), Some(UNKNOWN_PLAYER_LABEL));
}

#[test]
fn connection_id_drives_session_when_join_omits_player_id() {
    let joined: ServerMessage = serde_json::from_str(
        r#"{"event":"room-joined","data":{"isHost":true,"room":{"id":"R1",
            "players":[{"id":"A","name":"Alice"}],"gameState":"waiting"}}}"#,
    )
    .unwrap();

    let mut session = Session::new("R1", 5).with_local_player_id("A");
    session.apply(joined);
    assert_eq!(session.request_ready().as_deref(), Some("A"));

    session.apply(ServerMessage::GameStarted(started_a()));
    assert!(session.local_can_act());
    assert!(session.snapshot().can_act);

    session.apply(ServerMessage::GameUpdate(a_wins()));
    assert_eq!(session.outcome().unwrap().kind, OutcomeKind::SelfWin);
}
