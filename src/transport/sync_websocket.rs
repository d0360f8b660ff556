//! Synchronous WebSocket transport trait.
//!
//! The trait is the seam between the dispatch state machine and the wire:
//! production code plugs in [`crate::transport::WebSocketTransport`],
//! tests plug in scripted mocks. All calls block on the owning thread;
//! `receive_next_message` is the only long suspension point and is
//! bounded by the supplied deadline.

// ============================================================================
// Imports
// ============================================================================

use crate::timeout::Timeout;

// ============================================================================
// ReceiveResult
// ============================================================================

/// Outcome of [`SyncWebSocket::receive_next_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveResult {
    /// A text frame arrived.
    Message(String),
    /// The deadline expired before a frame arrived.
    Timeout,
    /// The connection is gone.
    Disconnected,
}

// ============================================================================
// SyncWebSocket
// ============================================================================

/// A blocking WebSocket connection carrying text frames.
pub trait SyncWebSocket {
    /// Returns `true` while the connection is established.
    fn is_connected(&self) -> bool;

    /// Connects to `url`. Returns `false` on failure.
    fn connect(&mut self, url: &str) -> bool;

    /// Sends one text frame. Returns `false` if the connection is gone.
    fn send(&mut self, message: &str) -> bool;

    /// Blocks until the next frame arrives, the deadline expires, or the
    /// connection drops.
    fn receive_next_message(&mut self, timeout: &Timeout) -> ReceiveResult;

    /// Returns `true` if a frame is already buffered and a receive would
    /// not block.
    fn has_next_message(&mut self) -> bool;
}

// ============================================================================
// SyncWebSocketFactory
// ============================================================================

/// Produces a fresh transport for each (re)connect.
pub type SyncWebSocketFactory = Box<dyn Fn() -> Box<dyn SyncWebSocket>>;
