//! Error types for the DevTools client.
//!
//! This module defines the status taxonomy surfaced to the driver layer.
//! Every status renders with a stable lower-case tag prefix followed by a
//! human-readable message, so logs and assertion messages stay greppable
//! across releases.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use devtools_client::{DevToolsClient, Result};
//!
//! fn enable_page(client: &dyn DevToolsClient) -> Result<()> {
//!     client.send_command("Page.enable", serde_json::json!({}))?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Transport | [`Error::Disconnected`] |
//! | Timing | [`Error::Timeout`] |
//! | Protocol | [`Error::UnknownError`] |
//! | Command semantic | [`Error::UnknownCommand`], [`Error::InvalidArgument`], [`Error::NoSuchFrame`] |
//! | State | [`Error::UnexpectedAlertOpen`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// The variant set mirrors the statuses the DevTools wire protocol and the
/// dispatch state machine can produce. `Ok` is expressed as `Result::Ok`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// The DevTools connection is gone.
    ///
    /// Returned when the transport cannot connect, refuses a send, or
    /// reports a disconnect on receive. Never retried internally; the
    /// caller decides, typically via a fresh `connect_if_necessary`.
    #[error("disconnected: {message}")]
    Disconnected {
        /// Description of the disconnect.
        message: String,
    },

    // ========================================================================
    // Timing Errors
    // ========================================================================
    /// A command or waiter deadline expired.
    #[error("timeout: {message}")]
    Timeout {
        /// Description of the operation that timed out.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Catch-all for protocol violations and unmapped inspector errors.
    ///
    /// A frame that fails to parse is reported here; the transport stays
    /// open so subsequent frames can still be processed.
    #[error("unknown error: {message}")]
    UnknownError {
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Command Semantic Errors
    // ========================================================================
    /// The browser does not implement the command (CDP code -32601).
    #[error("unknown command: {message}")]
    UnknownCommand {
        /// Message reported by the inspector.
        message: String,
    },

    /// The command parameters were rejected (CDP code -32602).
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Message reported by the inspector.
        message: String,
    },

    /// The targeted frame or session no longer exists.
    #[error("no such frame: {message}")]
    NoSuchFrame {
        /// Message reported by the inspector.
        message: String,
    },

    // ========================================================================
    // State Errors
    // ========================================================================
    /// A modal JavaScript dialog is open.
    ///
    /// Poisons every command awaiting a response when the dialog opens and
    /// every command issued until the dialog closes or the client
    /// reconnects.
    #[error("unexpected alert open")]
    UnexpectedAlertOpen,
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a disconnected error.
    #[inline]
    pub fn disconnected(message: impl Into<String>) -> Self {
        Self::Disconnected {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Creates an unknown error.
    #[inline]
    pub fn unknown_error(message: impl Into<String>) -> Self {
        Self::UnknownError {
            message: message.into(),
        }
    }

    /// Creates an unknown command error.
    #[inline]
    pub fn unknown_command(message: impl Into<String>) -> Self {
        Self::UnknownCommand {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a no such frame error.
    #[inline]
    pub fn no_such_frame(message: impl Into<String>) -> Self {
        Self::NoSuchFrame {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a disconnect error.
    #[inline]
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected { .. })
    }

    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this is an open-alert error.
    #[inline]
    #[must_use]
    pub fn is_unexpected_alert_open(&self) -> bool {
        matches!(self, Self::UnexpectedAlertOpen)
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry: a timeout can be retried
    /// directly, a disconnect after `connect_if_necessary`, and an open
    /// alert after the dialog is handled.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Disconnected { .. } | Self::Timeout { .. } | Self::UnexpectedAlertOpen
        )
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::unknown_error(format!("JSON error: {err}"))
    }
}

// ============================================================================
// Tests
// ============================================================================
