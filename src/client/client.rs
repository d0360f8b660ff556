//! Public client trait.
//!
//! [`DevToolsClient`] is the surface handed to listeners and to the driver
//! layer. Commands are synchronous round trips: the caller blocks while
//! the client pumps frames, dispatching events inline, until the response
//! bearing the command's id arrives or the deadline expires.

// ============================================================================
// Imports
// ============================================================================

use std::rc::Weak;

use serde_json::Value;

use crate::client::listener::DevToolsEventListener;
use crate::error::Result;
use crate::identifiers::CommandId;
use crate::timeout::Timeout;

// ============================================================================
// DevToolsClient
// ============================================================================

/// A synchronous DevTools connection.
///
/// | Operation | Contract |
/// |-----------|----------|
/// | `connect_if_necessary` | No-op when connected; otherwise connect a fresh transport, run the frontend closer on a reconnect edge, then notify every listener's `on_connected` in order |
/// | `send_command` | Send and wait for the matching response; discard the result |
/// | `send_command_and_get_result` | Send, wait, and return the result payload |
/// | `send_command_and_ignore_response` | Send without blocking; the response is consumed by a later pump |
/// | `handle_received_events` | Drain and dispatch frames already buffered at the transport |
/// | `handle_events_until` | Pump events until the predicate is met or the deadline expires |
/// | `next_message_id` | The id the next outgoing command will bear, without consuming it |
pub trait DevToolsClient {
    /// Returns the client's debug/logging label.
    fn id(&self) -> &str;

    /// Returns the session this client speaks for; empty for the root
    /// session.
    fn session_id(&self) -> &str;

    /// Returns `true` while the transport is connected.
    fn is_connected(&self) -> bool;

    /// Connects if not already connected.
    ///
    /// On a reconnect (a transport existed before), the frontend-closer
    /// hook runs exactly once before listeners are notified.
    fn connect_if_necessary(&self) -> Result<()>;

    /// Sends a command and waits for its response, discarding the result.
    fn send_command(&self, method: &str, params: Value) -> Result<()>;

    /// [`send_command`](Self::send_command) with an explicit deadline.
    fn send_command_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: &Timeout,
    ) -> Result<()>;

    /// Sends a command and returns its result payload.
    fn send_command_and_get_result(&self, method: &str, params: Value) -> Result<Value>;

    /// [`send_command_and_get_result`](Self::send_command_and_get_result)
    /// with an explicit deadline.
    fn send_command_and_get_result_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: &Timeout,
    ) -> Result<Value>;

    /// Sends a command without waiting; any later pump consumes and
    /// discards the response.
    fn send_command_and_ignore_response(&self, method: &str, params: Value) -> Result<()>;

    /// Dispatches every frame currently buffered at the transport.
    ///
    /// Command responses encountered during the drain are routed to their
    /// slots; orphans are dropped.
    fn handle_received_events(&self) -> Result<()>;

    /// Pumps events until `is_condition_met` reports true or `timeout`
    /// expires.
    ///
    /// The predicate runs first on every iteration. A command response
    /// arriving during the wait is an error; this pump expects events
    /// only.
    fn handle_events_until(
        &self,
        is_condition_met: &mut dyn FnMut() -> Result<bool>,
        timeout: &Timeout,
    ) -> Result<()>;

    /// Returns the id the next outgoing command will bear.
    ///
    /// Lets a listener about to issue a command predict the id, e.g. to
    /// correlate a refusal while an alert is open.
    fn next_message_id(&self) -> CommandId;

    /// Appends a listener to the registry.
    ///
    /// The handle is non-owning; a listener dropped by its owner is
    /// skipped during dispatch. Listeners registered during a callback
    /// apply to future events only.
    fn add_listener(&self, listener: Weak<dyn DevToolsEventListener>);
}
