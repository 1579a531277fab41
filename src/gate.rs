//! Turn gate: decides whether a locally initiated move may be emitted now.
//!
//! The gate is a UI-responsiveness guard. The server rejects illegal moves on
//! its own; the client only avoids sending moves that cannot be accepted.

use crate::protocol::{GamePayload, GameState};
use crate::session::Phase;

/// Returns `true` iff the local player may move right now.
///
/// Holds exactly when the phase is [`Phase::Playing`], the payload's `turn` is
/// `local_player_id`, and the payload's game is not finished. Pure: no state is
/// read other than the arguments.
pub fn can_act(phase: Phase, payload: Option<&GamePayload>, local_player_id: &str) -> bool {
    if phase != Phase::Playing {
        return false;
    }
    payload.is_some_and(|p| {
        p.game_state != GameState::Finished && p.turn.as_deref() == Some(local_player_id)
    })
}
