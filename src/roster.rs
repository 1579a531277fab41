//! Roster store: the ordered set of players known to be in the room.
//!
//! Every mutation is an idempotent reducer. Duplicate joins, leaves for players
//! already gone, and ready updates for unknown ids are silent no-ops, because
//! the transport may redeliver and roster events may race game snapshots.

use crate::protocol::Player;

/// Label shown for a player id that is not (or no longer) in the roster.
pub const UNKNOWN_PLAYER_LABEL: &str = "Another player";

/// Players in join order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole roster with a server snapshot.
    ///
    /// Duplicate ids inside the snapshot collapse to the first occurrence.
    pub fn replace_all(&mut self, players: Vec<Player>) {
        self.players.clear();
        for player in players {
            self.apply_join(player);
        }
    }

    /// Append `player` unless a player with the same id is already present.
    pub fn apply_join(&mut self, player: Player) -> &[Player] {
        if !self.contains(&player.id) {
            self.players.push(player);
        }
        &self.players
    }

    /// Remove the player with `player_id`, if present.
    pub fn apply_leave(&mut self, player_id: &str) -> &[Player] {
        self.players.retain(|p| p.id != player_id);
        &self.players
    }

    /// Mark the player with `player_id` as ready, if present.
    pub fn apply_ready_update(&mut self, player_id: &str) -> &[Player] {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) {
            player.is_ready = true;
        }
        &self.players
    }

    /// Clear every readiness flag (restart back to the lobby).
    pub fn reset_ready(&mut self) {
        for player in &mut self.players {
            player.is_ready = false;
        }
    }

    /// Look up a player. `None` means "unknown", which callers must render.
    pub fn find(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Name of `player_id`, or [`UNKNOWN_PLAYER_LABEL`].
    pub fn display_name(&self, player_id: &str) -> &str {
        self.find(player_id)
            .map_or(UNKNOWN_PLAYER_LABEL, |p| p.name.as_str())
    }

    /// Returns `true` if `player_id` is in the roster.
    pub fn contains(&self, player_id: &str) -> bool {
        self.find(player_id).is_some()
    }

    /// Players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
