//! Dispatch state machine.
//!
//! [`DevToolsClientImpl`] correlates command responses to in-flight
//! commands while events keep arriving, on a single thread, with listener
//! callbacks free to issue commands of their own mid-dispatch.
//!
//! # Reentrancy
//!
//! Dispatch is a stack. An outer `send_command` pumps frames; a received
//! event triggers a listener which calls `send_command` again; the inner
//! pump drains frames, possibly delivering the outer command's response
//! before its own. Three rules keep this safe:
//!
//! 1. A pump only returns to its caller once that caller's command id is
//!    fulfilled. Responses for outer waiters stay in their slots until
//!    control unwinds to them.
//! 2. Every pump first finishes the notification fan-outs already in
//!    flight (connects, the current event, the current command success)
//!    before receiving a new frame. This is what guarantees `on_connected`
//!    for all listeners strictly precedes the first `on_event`, and that
//!    an event reaches every listener before the next frame is read.
//! 3. A response whose id matches no slot is dropped; it belongs to a
//!    command already consumed or to a previous connection.
//!
//! # Alerts
//!
//! A `Page.javascriptDialogOpening` event poisons every command awaiting a
//! response and short-circuits every send issued after it (the id is still
//! consumed, so `next_message_id` stays predictive). The poison clears on
//! `Page.javascriptDialogClosed` or on reconnect.

// ============================================================================
// Imports
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Duration;

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::client::client::DevToolsClient;
use crate::client::listener::DevToolsEventListener;
use crate::error::{Error, Result};
use crate::identifiers::CommandId;
use crate::protocol::inspector_error::parse_inspector_error;
use crate::protocol::message::{
    parse_inspector_message, InspectorCommandResponse, InspectorEvent, InspectorMessage,
    ParserFunc,
};
use crate::timeout::Timeout;
use crate::transport::sync_websocket::{ReceiveResult, SyncWebSocket, SyncWebSocketFactory};

// ============================================================================
// Constants
// ============================================================================

/// Default deadline for a command round trip.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Event announcing a modal JavaScript dialog.
const DIALOG_OPENING_EVENT: &str = "Page.javascriptDialogOpening";

/// Event announcing that the dialog was handled.
const DIALOG_CLOSED_EVENT: &str = "Page.javascriptDialogClosed";

// ============================================================================
// Types
// ============================================================================

/// Caller-supplied hook run exactly once per detected reconnection edge,
/// before listeners are notified of the new connection.
pub type FrontendCloserFunc = Box<dyn Fn() -> Result<()>>;

/// State of one in-flight command slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseState {
    /// A pump is waiting for this response.
    Waiting,
    /// The response arrived and awaits consumption by its caller.
    Received,
    /// Nobody waits; the response is discarded on arrival.
    Ignored,
    /// Poisoned by an opening dialog; yields `UnexpectedAlertOpen`.
    Blocked,
}

/// Per-command bookkeeping, created at send and removed at consumption.
struct ResponseSlot {
    state: ResponseState,
    method: String,
    timeout: Timeout,
    result: Option<Value>,
    error: Option<String>,
}

/// What the active pump is entitled to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitMode {
    /// Waiting on a specific command response; events dispatch inline.
    Command(CommandId),
    /// Waiting for events only; a command response is a protocol fault.
    Event,
    /// Draining frames already buffered at the transport.
    Drain,
}

impl WaitMode {
    fn expected_id(self) -> Option<CommandId> {
        match self {
            Self::Command(id) => Some(id),
            _ => None,
        }
    }
}

/// An event mid-fan-out: the listeners still to be notified.
struct PendingEvent {
    method: String,
    params: Rc<Value>,
    queue: VecDeque<Weak<dyn DevToolsEventListener>>,
}

/// A command success mid-fan-out.
struct PendingCommandSuccess {
    method: String,
    result: Rc<Value>,
    timeout: Timeout,
    queue: VecDeque<Weak<dyn DevToolsEventListener>>,
}

/// Tracks nesting depth so `connect_if_necessary` can refuse to rebuild
/// the transport underneath an active pump.
struct StackDepthGuard<'a>(&'a Cell<usize>);

impl<'a> StackDepthGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self(depth)
    }
}

impl Drop for StackDepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

// ============================================================================
// DevToolsClientImpl
// ============================================================================

/// The dispatch core: one transport, one id counter, ordered listeners.
///
/// Owned by a single thread. Interior mutability lets listener callbacks
/// reenter the client through the `&dyn DevToolsClient` they receive; no
/// `RefCell` borrow is held across a callback or a blocking transport
/// call that could reenter.
pub struct DevToolsClientImpl {
    id: String,
    session_id: String,
    url: String,
    factory: SyncWebSocketFactory,
    socket: RefCell<Option<Box<dyn SyncWebSocket>>>,
    parser: RefCell<ParserFunc>,
    frontend_closer: RefCell<Option<FrontendCloserFunc>>,
    listeners: RefCell<Vec<Weak<dyn DevToolsEventListener>>>,
    next_id: Cell<CommandId>,
    stack_depth: Cell<usize>,
    was_connected: Cell<bool>,
    dialog_open: Cell<bool>,
    responses: RefCell<FxHashMap<CommandId, ResponseSlot>>,
    unnotified_connect: RefCell<VecDeque<Weak<dyn DevToolsEventListener>>>,
    pending_event: RefCell<Option<PendingEvent>>,
    pending_command_success: RefCell<Option<PendingCommandSuccess>>,
}

impl DevToolsClientImpl {
    /// Creates a disconnected client.
    ///
    /// `id` labels the client in logs; `session_id` is empty for the root
    /// session; `factory` produces a fresh transport per (re)connect.
    pub fn new(
        id: impl Into<String>,
        session_id: impl Into<String>,
        url: impl Into<String>,
        factory: SyncWebSocketFactory,
    ) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            url: url.into(),
            factory,
            socket: RefCell::new(None),
            parser: RefCell::new(Box::new(parse_inspector_message)),
            frontend_closer: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(CommandId::new(1)),
            stack_depth: Cell::new(0),
            was_connected: Cell::new(false),
            dialog_open: Cell::new(false),
            responses: RefCell::new(FxHashMap::default()),
            unnotified_connect: RefCell::new(VecDeque::new()),
            pending_event: RefCell::new(None),
            pending_command_success: RefCell::new(None),
        }
    }

    /// Registers the frontend-closer hook.
    pub fn set_frontend_closer_func(&self, closer: FrontendCloserFunc) {
        *self.frontend_closer.borrow_mut() = Some(closer);
    }

    /// Replaces the frame parser. Test seam.
    pub fn set_parser_func_for_testing(&self, parser: ParserFunc) {
        *self.parser.borrow_mut() = parser;
    }

    // ------------------------------------------------------------------------
    // Connectivity
    // ------------------------------------------------------------------------

    fn socket_connected(&self) -> bool {
        self.socket
            .borrow()
            .as_ref()
            .is_some_and(|socket| socket.is_connected())
    }

    fn mark_disconnected(&self) {
        debug!(client = %self.id, "devtools connection lost");
        *self.socket.borrow_mut() = None;
        self.responses.borrow_mut().clear();
        self.dialog_open.set(false);
    }

    fn take_command_id(&self) -> CommandId {
        let id = self.next_id.get();
        self.next_id.set(id.next());
        id
    }

    // ------------------------------------------------------------------------
    // Notification fan-outs
    // ------------------------------------------------------------------------

    fn ensure_listeners_notified_of_connect(&self) -> Result<()> {
        loop {
            let listener = self.unnotified_connect.borrow_mut().pop_front();
            let Some(listener) = listener else {
                return Ok(());
            };
            if let Some(listener) = listener.upgrade() {
                // On error the remainder stays queued; the next pump
                // resumes the fan-out.
                listener.on_connected(self)?;
            }
        }
    }

    fn ensure_listeners_notified_of_event(&self) -> Result<()> {
        loop {
            let next = {
                let mut pending = self.pending_event.borrow_mut();
                match pending.as_mut() {
                    Some(event) => match event.queue.pop_front() {
                        Some(listener) => {
                            Some((listener, event.method.clone(), Rc::clone(&event.params)))
                        }
                        None => {
                            *pending = None;
                            None
                        }
                    },
                    None => None,
                }
            };
            let Some((listener, method, params)) = next else {
                return Ok(());
            };
            if let Some(listener) = listener.upgrade() {
                if let Err(err) = listener.on_event(self, &method, &params) {
                    // Remaining listeners for this event are skipped.
                    *self.pending_event.borrow_mut() = None;
                    return Err(err);
                }
            }
        }
    }

    fn ensure_listeners_notified_of_command_success(&self) -> Result<()> {
        loop {
            let next = {
                let mut pending = self.pending_command_success.borrow_mut();
                match pending.as_mut() {
                    Some(success) => match success.queue.pop_front() {
                        Some(listener) => Some((
                            listener,
                            success.method.clone(),
                            Rc::clone(&success.result),
                            success.timeout,
                        )),
                        None => {
                            *pending = None;
                            None
                        }
                    },
                    None => None,
                }
            };
            let Some((listener, method, result, timeout)) = next else {
                return Ok(());
            };
            if let Some(listener) = listener.upgrade() {
                if let Err(err) = listener.on_command_success(self, &method, &result, &timeout) {
                    *self.pending_command_success.borrow_mut() = None;
                    return Err(err);
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Frame pump
    // ------------------------------------------------------------------------

    /// Receives and processes one frame.
    ///
    /// Finishes in-flight notification fan-outs first, so no frame is read
    /// while a previous connect/event/success is only partially delivered.
    fn process_next_message(&self, mode: WaitMode, timeout: &Timeout) -> Result<()> {
        self.ensure_listeners_notified_of_connect()?;
        self.ensure_listeners_notified_of_event()?;
        self.ensure_listeners_notified_of_command_success()?;

        // A nested pump may already have satisfied this wait.
        if let WaitMode::Command(id) = mode {
            let satisfied = self
                .responses
                .borrow()
                .get(&id)
                .is_some_and(|slot| slot.state != ResponseState::Waiting);
            if satisfied {
                return Ok(());
            }
        }

        let received = {
            let mut socket = self.socket.borrow_mut();
            let Some(socket) = socket.as_mut() else {
                return Err(Error::disconnected("not connected to DevTools"));
            };
            socket.receive_next_message(timeout)
        };
        let frame = match received {
            ReceiveResult::Message(frame) => frame,
            ReceiveResult::Timeout => {
                return Err(Error::timeout("timed out receiving message from DevTools"))
            }
            ReceiveResult::Disconnected => {
                self.mark_disconnected();
                return Err(Error::disconnected(
                    "unable to receive message from DevTools",
                ));
            }
        };
        trace!(client = %self.id, frame = %frame, "devtools frame");

        let message = {
            let parser = self.parser.borrow();
            (*parser)(&frame, mode.expected_id())
        };
        let Some(message) = message else {
            return Err(Error::unknown_error(format!(
                "bad inspector message: {frame}"
            )));
        };
        match message {
            InspectorMessage::Event(event) => self.process_event(event),
            InspectorMessage::CommandResponse(response) => {
                self.process_command_response(response, mode)
            }
        }
    }

    fn process_event(&self, event: InspectorEvent) -> Result<()> {
        debug!(client = %self.id, method = %event.method, "devtools event");
        if event.method == DIALOG_OPENING_EVENT {
            // Poison commands already in flight before any listener runs,
            // so a send issued from this event's fan-out is refused too.
            self.dialog_open.set(true);
            for slot in self.responses.borrow_mut().values_mut() {
                if slot.state == ResponseState::Waiting {
                    slot.state = ResponseState::Blocked;
                }
            }
        } else if event.method == DIALOG_CLOSED_EVENT {
            self.dialog_open.set(false);
        }
        let queue: VecDeque<_> = self.listeners.borrow().clone().into();
        *self.pending_event.borrow_mut() = Some(PendingEvent {
            method: event.method,
            params: Rc::new(event.params),
            queue,
        });
        self.ensure_listeners_notified_of_event()
    }

    fn process_command_response(
        &self,
        response: InspectorCommandResponse,
        mode: WaitMode,
    ) -> Result<()> {
        if mode == WaitMode::Event {
            return Err(Error::unknown_error(
                "unexpected command while waiting for event",
            ));
        }
        let success = {
            let mut responses = self.responses.borrow_mut();
            let Some(slot) = responses.get_mut(&response.id) else {
                // Response to a command already consumed, or sent before a
                // reconnect; tolerated so protocol races stay harmless.
                debug!(client = %self.id, id = %response.id, "dropping orphan command response");
                return Ok(());
            };
            if slot.state == ResponseState::Received {
                debug!(client = %self.id, id = %response.id, "dropping duplicate command response");
                return Ok(());
            }
            debug!(
                client = %self.id,
                id = %response.id,
                method = %slot.method,
                ok = response.error.is_none(),
                "devtools response"
            );
            let success = response.error.is_none().then(|| {
                (
                    slot.method.clone(),
                    Rc::new(
                        response
                            .result
                            .clone()
                            .unwrap_or_else(|| Value::Object(Map::new())),
                    ),
                    slot.timeout,
                )
            });
            let consumed = if slot.state == ResponseState::Ignored {
                true
            } else {
                if slot.state == ResponseState::Waiting {
                    slot.state = ResponseState::Received;
                }
                // A blocked slot keeps its poison; the payload is recorded
                // but the caller still fails.
                slot.result = response.result;
                slot.error = response.error;
                false
            };
            if consumed {
                responses.remove(&response.id);
            }
            success
        };
        if let Some((method, result, timeout)) = success {
            let queue: VecDeque<_> = self.listeners.borrow().clone().into();
            *self.pending_command_success.borrow_mut() = Some(PendingCommandSuccess {
                method,
                result,
                timeout,
                queue,
            });
            self.ensure_listeners_notified_of_command_success()?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Send path
    // ------------------------------------------------------------------------

    fn send_command_internal(
        &self,
        method: &str,
        params: Value,
        wait_for_response: bool,
        timeout: &Timeout,
    ) -> Result<Option<Value>> {
        if !self.socket_connected() {
            return Err(Error::disconnected("not connected to DevTools"));
        }
        let command_id = self.take_command_id();
        let mut envelope = Map::new();
        envelope.insert("id".into(), Value::from(command_id.raw()));
        envelope.insert("method".into(), Value::String(method.to_string()));
        envelope.insert("params".into(), params);
        if !self.session_id.is_empty() {
            envelope.insert("sessionId".into(), Value::String(self.session_id.clone()));
        }
        if self.dialog_open.get() {
            // The id was consumed so listeners can correlate the refusal.
            debug!(client = %self.id, id = %command_id, method, "command refused while dialog open");
            return Err(Error::UnexpectedAlertOpen);
        }
        let frame = Value::Object(envelope).to_string();
        debug!(client = %self.id, id = %command_id, method, "devtools command");
        let sent = {
            let mut socket = self.socket.borrow_mut();
            match socket.as_mut() {
                Some(socket) => socket.send(&frame),
                None => false,
            }
        };
        if !sent {
            self.mark_disconnected();
            return Err(Error::disconnected("unable to send message to DevTools"));
        }
        self.responses.borrow_mut().insert(
            command_id,
            ResponseSlot {
                state: if wait_for_response {
                    ResponseState::Waiting
                } else {
                    ResponseState::Ignored
                },
                method: method.to_string(),
                timeout: *timeout,
                result: None,
                error: None,
            },
        );
        if !wait_for_response {
            return Ok(None);
        }

        let outcome = {
            let _depth = StackDepthGuard::enter(&self.stack_depth);
            loop {
                let waiting = self
                    .responses
                    .borrow()
                    .get(&command_id)
                    .is_some_and(|slot| slot.state == ResponseState::Waiting);
                if !waiting {
                    break Ok(());
                }
                if let Err(err) = self.process_next_message(WaitMode::Command(command_id), timeout)
                {
                    break Err(err);
                }
            }
        };

        match outcome {
            Err(err) => {
                // If the response raced in before the failure, the slot is
                // dead weight; drop it.
                let mut responses = self.responses.borrow_mut();
                let received = responses
                    .get(&command_id)
                    .is_some_and(|slot| slot.state == ResponseState::Received);
                if received {
                    responses.remove(&command_id);
                }
                Err(err)
            }
            Ok(()) => {
                let slot = self.responses.borrow_mut().remove(&command_id);
                let Some(slot) = slot else {
                    // The table was cleared by a disconnect observed in a
                    // nested pump whose error a listener swallowed.
                    return Err(Error::disconnected(
                        "DevTools connection lost while awaiting response",
                    ));
                };
                if slot.state == ResponseState::Blocked {
                    return Err(Error::UnexpectedAlertOpen);
                }
                if let Some(error) = slot.error {
                    return Err(parse_inspector_error(&error));
                }
                Ok(slot.result)
            }
        }
    }
}

// ============================================================================
// DevToolsClient Implementation
// ============================================================================

impl DevToolsClient for DevToolsClientImpl {
    fn id(&self) -> &str {
        &self.id
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn is_connected(&self) -> bool {
        self.socket_connected()
    }

    fn connect_if_necessary(&self) -> Result<()> {
        if self.stack_depth.get() > 0 {
            return Err(Error::unknown_error("cannot connect when nested"));
        }
        if self.socket_connected() {
            return Ok(());
        }
        let reconnect = self.was_connected.get();
        let mut socket = (self.factory)();
        if !socket.connect(&self.url) {
            return Err(Error::disconnected("unable to connect to DevTools"));
        }
        debug!(client = %self.id, url = %self.url, reconnect, "devtools connected");
        *self.socket.borrow_mut() = Some(socket);
        self.dialog_open.set(false);
        self.responses.borrow_mut().clear();
        *self.pending_event.borrow_mut() = None;
        *self.pending_command_success.borrow_mut() = None;
        if reconnect {
            let closer = self.frontend_closer.borrow();
            if let Some(closer) = closer.as_ref() {
                debug!(client = %self.id, "running frontend closer");
                closer()?;
            }
        }
        self.was_connected.set(true);
        let listeners: VecDeque<_> = self.listeners.borrow().clone().into();
        *self.unnotified_connect.borrow_mut() = listeners;
        self.ensure_listeners_notified_of_connect()
    }

    fn send_command(&self, method: &str, params: Value) -> Result<()> {
        self.send_command_with_timeout(method, params, &Timeout::new(DEFAULT_COMMAND_TIMEOUT))
    }

    fn send_command_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: &Timeout,
    ) -> Result<()> {
        self.send_command_internal(method, params, true, timeout)
            .map(|_| ())
    }

    fn send_command_and_get_result(&self, method: &str, params: Value) -> Result<Value> {
        self.send_command_and_get_result_with_timeout(
            method,
            params,
            &Timeout::new(DEFAULT_COMMAND_TIMEOUT),
        )
    }

    fn send_command_and_get_result_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: &Timeout,
    ) -> Result<Value> {
        self.send_command_internal(method, params, true, timeout)
            .map(|result| result.unwrap_or_else(|| Value::Object(Map::new())))
    }

    fn send_command_and_ignore_response(&self, method: &str, params: Value) -> Result<()> {
        self.send_command_internal(
            method,
            params,
            false,
            &Timeout::new(DEFAULT_COMMAND_TIMEOUT),
        )
        .map(|_| ())
    }

    fn handle_received_events(&self) -> Result<()> {
        if !self.socket_connected() {
            return Err(Error::disconnected("not connected to DevTools"));
        }
        let _depth = StackDepthGuard::enter(&self.stack_depth);
        loop {
            let has_next = {
                let mut socket = self.socket.borrow_mut();
                match socket.as_mut() {
                    Some(socket) => socket.has_next_message(),
                    None => return Err(Error::disconnected("not connected to DevTools")),
                }
            };
            if !has_next {
                return Ok(());
            }
            self.process_next_message(WaitMode::Drain, &Timeout::none())?;
        }
    }

    fn handle_events_until(
        &self,
        is_condition_met: &mut dyn FnMut() -> Result<bool>,
        timeout: &Timeout,
    ) -> Result<()> {
        if !self.socket_connected() {
            return Err(Error::disconnected("not connected to DevTools"));
        }
        let _depth = StackDepthGuard::enter(&self.stack_depth);
        loop {
            if is_condition_met()? {
                return Ok(());
            }
            self.process_next_message(WaitMode::Event, timeout)?;
        }
    }

    fn next_message_id(&self) -> CommandId {
        self.next_id.get()
    }

    fn add_listener(&self, listener: Weak<dyn DevToolsEventListener>) {
        self.listeners.borrow_mut().push(listener);
    }
}

// ============================================================================
// Tests
// ============================================================================
