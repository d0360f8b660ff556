//! WebSocket transport layer.
//!
//! The dispatch core owns exactly one transport at a time and talks to it
//! through the [`SyncWebSocket`] trait: a blocking, single-threaded
//! surface with deadline-bounded receives. A factory produces a fresh
//! transport for every (re)connect, so a torn-down connection never leaks
//! state into the next one.
//!
//! # Transport Contract
//!
//! | Operation | Behavior |
//! |-----------|----------|
//! | `connect` | Establish the connection; `false` on failure |
//! | `send` | Write one text frame; `false` means disconnected |
//! | `receive_next_message` | Block for the next frame, bounded by a deadline |
//! | `has_next_message` | Whether a buffered, not-yet-consumed frame exists |
//! | `is_connected` | Current connectivity |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `sync_websocket` | Transport trait, receive outcome, factory type |
//! | `websocket` | Production blocking implementation over `tungstenite` |

// ============================================================================
// Submodules
// ============================================================================

/// Transport trait and factory type.
pub mod sync_websocket;

/// Blocking `tungstenite` transport.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use sync_websocket::{ReceiveResult, SyncWebSocket, SyncWebSocketFactory};
pub use websocket::WebSocketTransport;
