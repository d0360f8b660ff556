//! Type-safe identifiers for protocol entities.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//! The DevTools wire protocol correlates command responses by a numeric
//! `id`; [`CommandId`] keeps that number from being confused with other
//! integers flowing through command parameters.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// CommandId
// ============================================================================

/// Identifier of an outgoing DevTools command.
///
/// Assigned from a monotonic per-client counter starting at 1; never
/// reused within the life of a client, including across reconnects.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CommandId(i64);

impl CommandId {
    /// Creates a command ID from its raw wire value.
    #[inline]
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw wire value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Returns the ID following this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_is_monotonic() {
        let id = CommandId::new(1);
        assert_eq!(id.next(), CommandId::new(2));
        assert!(id < id.next());
    }

    #[test]
    fn test_serializes_as_bare_integer() {
        let json = serde_json::to_string(&CommandId::new(42)).expect("serialize");
        assert_eq!(json, "42");
        let back: CommandId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, CommandId::new(42));
    }

    #[test]
    fn test_display() {
        assert_eq!(CommandId::new(7).to_string(), "7");
    }
}
