//! Blocking WebSocket transport over `tungstenite`.
//!
//! Wraps a synchronous `tungstenite` connection in the [`SyncWebSocket`]
//! contract. Incoming text frames are staged in an internal queue so
//! `has_next_message` can answer without consuming; receives honor the
//! caller's deadline by bounding the socket read timeout. Only text frames
//! are surfaced: binary frames and pings/pongs are ignored, a close frame
//! is a disconnect.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::Duration;

use tracing::{debug, trace, warn};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Error as WsError, Message, WebSocket};

use crate::timeout::Timeout;
use crate::transport::sync_websocket::{ReceiveResult, SyncWebSocket, SyncWebSocketFactory};

// ============================================================================
// WebSocketTransport
// ============================================================================

/// Production transport speaking the DevTools WebSocket endpoint.
#[derive(Default)]
pub struct WebSocketTransport {
    socket: Option<WebSocket<MaybeTlsStream<TcpStream>>>,
    pending: VecDeque<String>,
    connected: bool,
}

impl WebSocketTransport {
    /// Creates a transport in the disconnected state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a factory producing fresh transports, ready to hand to a
    /// client.
    #[must_use]
    pub fn factory() -> SyncWebSocketFactory {
        Box::new(|| {
            let transport: Box<dyn SyncWebSocket> = Box::new(Self::new());
            transport
        })
    }

    fn drop_connection(&mut self) {
        self.connected = false;
        self.socket = None;
    }

    /// Applies a read timeout to the underlying TCP stream.
    ///
    /// `None` blocks indefinitely. Must not be called with a zero
    /// duration; callers check deadline expiry first.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        if let Some(socket) = self.socket.as_mut() {
            if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
                if let Err(err) = stream.set_read_timeout(timeout) {
                    warn!(error = %err, "failed to set read timeout");
                }
            }
        }
    }

    fn set_nonblocking(&mut self, nonblocking: bool) {
        if let Some(socket) = self.socket.as_mut() {
            if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
                if let Err(err) = stream.set_nonblocking(nonblocking) {
                    warn!(error = %err, "failed to set nonblocking mode");
                }
            }
        }
    }

    /// Reads one frame from the socket.
    ///
    /// Returns `Ok(Some(text))` for a text frame, `Ok(None)` for a frame
    /// to skip or a retriable read miss, and `Err(())` on disconnect.
    fn read_frame(&mut self) -> Result<Option<String>, ()> {
        let Some(socket) = self.socket.as_mut() else {
            return Err(());
        };
        match socket.read() {
            Ok(Message::Text(text)) => Ok(Some(text.to_string())),
            Ok(Message::Close(_)) => {
                debug!("WebSocket closed by remote");
                self.drop_connection();
                Err(())
            }
            // Ignore Binary, Ping, Pong, raw frames.
            Ok(_) => Ok(None),
            Err(WsError::Io(err))
                if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                Ok(None)
            }
            Err(err) => {
                debug!(error = %err, "WebSocket read failed");
                self.drop_connection();
                Err(())
            }
        }
    }

    /// Drains frames that can be read without blocking into the queue.
    fn poll_pending(&mut self) {
        if self.socket.is_none() {
            return;
        }
        self.set_nonblocking(true);
        loop {
            match self.read_frame() {
                Ok(Some(text)) => self.pending.push_back(text),
                Ok(None) | Err(()) => break,
            }
        }
        self.set_nonblocking(false);
    }
}

impl SyncWebSocket for WebSocketTransport {
    fn is_connected(&self) -> bool {
        self.connected && self.socket.is_some()
    }

    fn connect(&mut self, url: &str) -> bool {
        self.drop_connection();
        self.pending.clear();
        match tungstenite::connect(url) {
            Ok((socket, _response)) => {
                debug!(url, "WebSocket connected");
                self.socket = Some(socket);
                self.connected = true;
                true
            }
            Err(err) => {
                warn!(url, error = %err, "WebSocket connect failed");
                false
            }
        }
    }

    fn send(&mut self, message: &str) -> bool {
        let Some(socket) = self.socket.as_mut() else {
            return false;
        };
        match socket.send(Message::text(message)) {
            Ok(()) => {
                trace!(len = message.len(), "frame sent");
                true
            }
            Err(err) => {
                debug!(error = %err, "WebSocket send failed");
                self.drop_connection();
                false
            }
        }
    }

    fn receive_next_message(&mut self, timeout: &Timeout) -> ReceiveResult {
        if let Some(message) = self.pending.pop_front() {
            return ReceiveResult::Message(message);
        }
        if self.socket.is_none() {
            return ReceiveResult::Disconnected;
        }
        loop {
            match timeout.remaining() {
                Some(remaining) if remaining.is_zero() => return ReceiveResult::Timeout,
                remaining => self.set_read_timeout(remaining),
            }
            match self.read_frame() {
                Ok(Some(text)) => return ReceiveResult::Message(text),
                Ok(None) => continue,
                Err(()) => return ReceiveResult::Disconnected,
            }
        }
    }

    fn has_next_message(&mut self) -> bool {
        if self.pending.is_empty() {
            self.poll_pending();
        }
        !self.pending.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::TcpListener;
    use std::thread;

    /// Spawns a one-connection WebSocket server; returns its URL.
    fn spawn_server<F>(handler: F) -> String
    where
        F: FnOnce(WebSocket<TcpStream>) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let socket = tungstenite::accept(stream).expect("handshake");
            handler(socket);
        });
        format!("ws://{addr}")
    }

    #[test]
    fn test_connect_send_receive() {
        let url = spawn_server(|mut socket| {
            let message = socket.read().expect("read");
            assert_eq!(message.to_text().expect("text"), "ping");
            socket.send(Message::text("pong")).expect("send");
        });

        let mut transport = WebSocketTransport::new();
        assert!(!transport.is_connected());
        assert!(transport.connect(&url));
        assert!(transport.is_connected());
        assert!(transport.send("ping"));

        let timeout = Timeout::new(Duration::from_secs(5));
        assert_eq!(
            transport.receive_next_message(&timeout),
            ReceiveResult::Message("pong".to_string())
        );
    }

    #[test]
    fn test_receive_timeout() {
        let url = spawn_server(|socket| {
            // Hold the connection open without sending anything.
            thread::sleep(Duration::from_millis(500));
            drop(socket);
        });

        let mut transport = WebSocketTransport::new();
        assert!(transport.connect(&url));
        let timeout = Timeout::new(Duration::from_millis(50));
        assert_eq!(
            transport.receive_next_message(&timeout),
            ReceiveResult::Timeout
        );
    }

    #[test]
    fn test_has_next_message_buffers_without_consuming() {
        let url = spawn_server(|mut socket| {
            socket.send(Message::text("first")).expect("send");
            socket.send(Message::text("second")).expect("send");
            thread::sleep(Duration::from_millis(500));
        });

        let mut transport = WebSocketTransport::new();
        assert!(transport.connect(&url));

        let timeout = Timeout::new(Duration::from_secs(5));
        assert_eq!(
            transport.receive_next_message(&timeout),
            ReceiveResult::Message("first".to_string())
        );

        // The second frame is in flight; poll until the transport sees it.
        let deadline = Timeout::new(Duration::from_secs(5));
        while !transport.has_next_message() {
            assert!(!deadline.is_expired(), "second frame never buffered");
            thread::sleep(Duration::from_millis(10));
        }
        assert!(transport.has_next_message());
        assert_eq!(
            transport.receive_next_message(&timeout),
            ReceiveResult::Message("second".to_string())
        );
    }

    #[test]
    fn test_remote_close_is_disconnect() {
        let url = spawn_server(|mut socket| {
            socket.close(None).expect("close");
            let _ = socket.flush();
        });

        let mut transport = WebSocketTransport::new();
        assert!(transport.connect(&url));
        let timeout = Timeout::new(Duration::from_secs(5));
        assert_eq!(
            transport.receive_next_message(&timeout),
            ReceiveResult::Disconnected
        );
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_connect_failure() {
        let mut transport = WebSocketTransport::new();
        // Reserved port with no listener.
        assert!(!transport.connect("ws://127.0.0.1:1"));
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_send_unconnected() {
        let mut transport = WebSocketTransport::new();
        assert!(!transport.send("ping"));
    }
}
