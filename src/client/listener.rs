//! Event listener contract.
//!
//! Listeners observe the client's lifecycle and traffic. Registration
//! order is dispatch order; listeners are never removed, and a listener
//! added during a callback only sees future events.
//!
//! Every callback receives the client so listeners can issue commands from
//! inside dispatch; such commands go through the normal send path and are
//! served by nested pumps on the same call stack.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::client::client::DevToolsClient;
use crate::error::Result;
use crate::timeout::Timeout;

// ============================================================================
// DevToolsEventListener
// ============================================================================

/// Observer of client connects, events, and command completions.
///
/// Default implementations succeed without doing anything; implementers
/// override only what they need. Returning an error from any callback
/// aborts the current dispatch and propagates to the originating caller.
pub trait DevToolsEventListener {
    /// Called after every successful (re)connect, before any event is
    /// dispatched on that connection.
    fn on_connected(&self, _client: &dyn DevToolsClient) -> Result<()> {
        Ok(())
    }

    /// Called for every event, in receipt order.
    fn on_event(
        &self,
        _client: &dyn DevToolsClient,
        _method: &str,
        _params: &Value,
    ) -> Result<()> {
        Ok(())
    }

    /// Called when a command completes successfully, before the response is
    /// returned to the command's caller.
    ///
    /// `command_timeout` is the deadline of the completed command; a
    /// listener that pumps further events in response should stay within
    /// it.
    fn on_command_success(
        &self,
        _client: &dyn DevToolsClient,
        _method: &str,
        _result: &Value,
        _command_timeout: &Timeout,
    ) -> Result<()> {
        Ok(())
    }
}
