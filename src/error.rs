//! Error types for the Turnroom client.

use thiserror::Error;

/// Errors that can occur when using the Turnroom client.
///
/// Session anomalies (unknown player ids, duplicate roster events, moves
/// attempted out of turn) are absorbed by the session and never show up here.
#[derive(Debug, Error)]
pub enum TurnroomError {
    /// Failed to send a message through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a message from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was closed unexpectedly.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize or deserialize a protocol message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Attempted an operation that requires an active session, but the
    /// transport loop has already exited.
    #[error("not connected to server")]
    NotConnected,

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for Turnroom client operations.
pub type Result<T> = std::result::Result<T, TurnroomError>;
