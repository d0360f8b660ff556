//! DevTools wire protocol message types.
//!
//! This module defines the message format spoken over the WebSocket to the
//! browser's inspector, and the translation of inspector error objects
//! into crate errors.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | Command | Local → Browser | `{"id":N,"method":"…","params":{…},"sessionId":"…"?}` |
//! | Command response | Browser → Local | `{"id":N,"result":{…}}` or `{"id":N,"error":{…}}` |
//! | Event | Browser → Local | `{"method":"…","params":{…},"sessionId":"…"?}` |
//!
//! A response carrying neither `result` nor `error` is treated as an empty
//! `result`; the inspector is permitted to omit both on trivially
//! successful commands.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Frame classification into events and command responses |
//! | `inspector_error` | Inspector `error` object to [`crate::Error`] mapping |

// ============================================================================
// Submodules
// ============================================================================

/// Frame classification into events and command responses.
pub mod message;

/// Inspector error object translation.
pub mod inspector_error;

// ============================================================================
// Re-exports
// ============================================================================

pub use inspector_error::parse_inspector_error;
pub use message::{
    parse_inspector_message, InspectorCommandResponse, InspectorEvent, InspectorMessage,
    ParserFunc,
};
