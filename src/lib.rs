//! Synchronous Chrome DevTools Protocol client for test-automation
//! drivers.
//!
//! This library speaks CDP over a single persistent WebSocket: commands go
//! out with monotonically numbered envelopes, responses are correlated
//! back to their callers, and server-pushed events fan out to registered
//! listeners in strict receipt order.
//!
//! # Architecture
//!
//! The hard part is not the wire framing but the dispatch state machine.
//! Dispatch is single-threaded and reentrant by design:
//!
//! - A command pump only returns once its own response id is fulfilled;
//!   responses for outer callers wait in their slots.
//! - Listeners may issue commands from inside callbacks; the nested pump
//!   finishes the in-flight fan-outs before reading new frames, so
//!   `on_connected` always precedes the first `on_event` and every event
//!   reaches all listeners before the next frame.
//! - A modal JavaScript dialog poisons every in-flight command and every
//!   later send with `UnexpectedAlertOpen` until it closes or the client
//!   reconnects.
//! - On reconnect the client builds a fresh transport, runs the
//!   frontend-closer hook exactly once, and re-runs `on_connected` so
//!   managers can restore their state.
//!
//! # Quick Start
//!
//! ```no_run
//! use devtools_client::{
//!     DevToolsClient, DevToolsClientImpl, DeviceMetrics,
//!     MobileEmulationOverrideManager, Result, WebSocketTransport,
//! };
//!
//! fn main() -> Result<()> {
//!     let client = DevToolsClientImpl::new(
//!         "page-1",
//!         "",
//!         "ws://127.0.0.1:9222/devtools/page/1",
//!         WebSocketTransport::factory(),
//!     );
//!
//!     // Re-applies the overrides on connect and top-level navigation.
//!     let _manager = MobileEmulationOverrideManager::new(
//!         &client,
//!         Some(DeviceMetrics::new(390, 844, 3.0, true, true)),
//!     );
//!
//!     client.connect_if_necessary()?;
//!     client.send_command("Page.enable", serde_json::json!({}))?;
//!     let result =
//!         client.send_command_and_get_result("Page.getNavigationHistory", serde_json::json!({}))?;
//!     println!("history: {result}");
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Dispatch core: [`DevToolsClientImpl`], client and listener traits |
//! | [`emulation`] | Exemplar listener: device-metric override manager |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Inspector message parsing and error mapping |
//! | [`timeout`] | Deadline tracking |
//! | [`transport`] | WebSocket transport trait and implementation |

// ============================================================================
// Modules
// ============================================================================

/// DevTools client core.
///
/// The dispatch state machine, the public [`DevToolsClient`] trait, and
/// the [`DevToolsEventListener`] contract.
pub mod client;

/// Device emulation override manager.
///
/// The exemplar listener; domain managers follow its shape.
pub mod emulation;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for protocol entities.
pub mod identifiers;

/// Inspector wire message types.
///
/// Frame classification and inspector error translation.
pub mod protocol;

/// Deadline tracking for commands and event waits.
pub mod timeout;

/// WebSocket transport layer.
///
/// The blocking transport trait and its `tungstenite` implementation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{
    DevToolsClient, DevToolsClientImpl, DevToolsEventListener, FrontendCloserFunc,
    DEFAULT_COMMAND_TIMEOUT,
};

// Emulation types
pub use emulation::{DeviceMetrics, MobileEmulationOverrideManager};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::CommandId;

// Protocol types
pub use protocol::{
    parse_inspector_error, parse_inspector_message, InspectorCommandResponse, InspectorEvent,
    InspectorMessage, ParserFunc,
};

// Timeout type
pub use timeout::Timeout;

// Transport types
pub use transport::{ReceiveResult, SyncWebSocket, SyncWebSocketFactory, WebSocketTransport};
