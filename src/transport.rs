//! Transport abstraction for the Turnroom protocol.
//!
//! The [`Transport`] trait defines a bidirectional text message channel between
//! the client and the session server. Every named event travels as one JSON
//! text message (`{"event": "...", "data": {...}}`), so implementations only
//! need to handle framing (WebSocket frames, Engine.IO packets, length-prefixed
//! TCP, an in-process channel for tests).
//!
//! # Connection Setup
//!
//! Connection setup is NOT part of this trait. Construct a connected transport
//! externally, then pass it to `TurnroomClient::start`.
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use turnroom_client::error::TurnroomError;
//! use turnroom_client::transport::Transport;
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn send(&mut self, message: String) -> Result<(), TurnroomError> {
//!         // Send the JSON text message over your transport
//!         todo!()
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, TurnroomError>> {
//!         // Receive the next JSON text message
//!         // Return None when the connection is closed cleanly
//!         todo!()
//!     }
//!
//!     async fn close(&mut self) -> Result<(), TurnroomError> {
//!         todo!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::TurnroomError;

/// A bidirectional text message transport carrying Turnroom events.
///
/// The transport is expected to deliver messages in the order the server
/// emitted them. It does not need to deduplicate: the session tolerates
/// redundant roster events.
///
/// # Cancel Safety
///
/// [`recv`](Transport::recv) **MUST** be cancel-safe because the client polls
/// it inside `tokio::select!` next to the command channel and the countdown
/// timer. Channel-based implementations are naturally cancel-safe.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send one JSON text message to the server.
    ///
    /// # Errors
    ///
    /// Returns [`TurnroomError::TransportSend`] if the message could not be sent.
    async fn send(&mut self, message: String) -> Result<(), TurnroomError>;

    /// Receive the next JSON text message from the server.
    ///
    /// Returns:
    /// - `Some(Ok(text))`: a complete message was received
    /// - `Some(Err(e))`: a transport error occurred
    /// - `None`: the connection was closed cleanly by the server
    async fn recv(&mut self) -> Option<Result<String, TurnroomError>>;

    /// Close the transport connection gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the graceful shutdown fails. Implementations should
    /// still release resources even if the close handshake fails.
    async fn close(&mut self) -> Result<(), TurnroomError>;

    /// Id the server assigned to this connection, if the transport knows it.
    ///
    /// Rooms identify players by their connection, and `room-joined` does not
    /// repeat it. Transports that learn the id during their handshake (a
    /// Socket.IO bridge gets its `sid`) return it here so the session knows
    /// the local player from the start. The default knows nothing.
    fn connection_id(&self) -> Option<String> {
        None
    }
}
