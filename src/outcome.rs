//! Outcome resolver: classifies a finished game from the local player's view.

use serde::Serialize;

use crate::protocol::GamePayload;
use crate::roster::Roster;

/// How the game ended for the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutcomeKind {
    SelfWin,
    OtherWin,
    Draw,
}

/// Result shown on the end screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub kind: OutcomeKind,
    /// Winner's display name. Only set for [`OutcomeKind::OtherWin`]; falls
    /// back to [`UNKNOWN_PLAYER_LABEL`](crate::roster::UNKNOWN_PLAYER_LABEL).
    pub winner_name: Option<String>,
}

impl Outcome {
    pub fn self_win() -> Self {
        Self {
            kind: OutcomeKind::SelfWin,
            winner_name: None,
        }
    }

    pub fn draw() -> Self {
        Self {
            kind: OutcomeKind::Draw,
            winner_name: None,
        }
    }

    pub fn other_win(name: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::OtherWin,
            winner_name: Some(name.into()),
        }
    }
}

/// Classify `payload` for `local_player_id`.
///
/// Total: every payload maps to exactly one kind, whatever the roster holds.
/// Callers only invoke it once the session reached the finished phase.
pub fn resolve(payload: &GamePayload, local_player_id: &str, roster: &Roster) -> Outcome {
    match payload.winner.as_deref() {
        None => Outcome::draw(),
        Some(winner) if winner == local_player_id => Outcome::self_win(),
        Some(winner) => Outcome::other_win(roster.display_name(winner)),
    }
}
