//! Chat relay: append-only transcript plus outbound message composition.

use tokio::sync::watch;

use crate::protocol::ChatMessagePayload;

/// Sender name used for lines the client generates itself.
pub const SYSTEM_SENDER: &str = "System";

/// One transcript line. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub sender: String,
    pub text: String,
    /// Server timestamp. Empty for locally generated lines.
    pub timestamp: String,
}

impl From<ChatMessagePayload> for ChatEntry {
    fn from(msg: ChatMessagePayload) -> Self {
        Self {
            sender: msg.player_name,
            text: msg.message,
            timestamp: msg.timestamp,
        }
    }
}

/// Transcript in arrival order, published through a `watch` channel so
/// readers always see the whole log.
#[derive(Debug)]
pub struct ChatLog {
    tx: watch::Sender<Vec<ChatEntry>>,
}

impl ChatLog {
    /// Create an empty log and a receiver that observes it.
    pub fn channel() -> (Self, watch::Receiver<Vec<ChatEntry>>) {
        let (tx, rx) = watch::channel(Vec::new());
        (Self { tx }, rx)
    }

    /// Append `entry` and return a copy for display.
    pub fn append(&self, entry: ChatEntry) -> ChatEntry {
        self.tx.send_modify(|entries| entries.push(entry.clone()));
        entry
    }

    /// Append the "joined the room" notice for `player_name`.
    pub fn announce_join(&self, player_name: &str) -> ChatEntry {
        self.append(ChatEntry {
            sender: SYSTEM_SENDER.to_string(),
            text: format!("{player_name} joined the room"),
            timestamp: String::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }
}

/// Normalize user input for sending. Blank input yields `None` and is not sent.
pub fn compose(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
