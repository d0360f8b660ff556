//! Inspector error translation.
//!
//! Maps the `error` object of a failed command response onto the crate's
//! status taxonomy. The mapping keys on the inspector's JSON-RPC error
//! codes, with one message-content check that must run first: invalid-URL
//! navigation failures arrive under a generic code but must surface as
//! `InvalidArgument`.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::error::Error;

// ============================================================================
// Error Codes
// ============================================================================

/// JSON-RPC: invalid method parameters.
const CODE_INVALID_PARAMS: i64 = -32602;

/// JSON-RPC: method not found.
const CODE_METHOD_NOT_FOUND: i64 = -32601;

/// Inspector server error; disambiguated by message content.
const CODE_SERVER_ERROR: i64 = -32000;

/// Inspector session/target not found.
const CODE_SESSION_NOT_FOUND: i64 = -32001;

// ============================================================================
// Mapping
// ============================================================================

/// Translates an inspector `error` JSON string into a typed [`Error`].
///
/// The input is the `error` object as preserved by the parser. An empty or
/// unparseable input maps to `UnknownError`, as does any code outside the
/// table; the raw text is kept in the message for diagnosis.
#[must_use]
pub fn parse_inspector_error(error: &str) -> Error {
    let parsed: Option<Value> = serde_json::from_str(error).ok();
    let Some(object) = parsed.as_ref().and_then(Value::as_object) else {
        return Error::unknown_error("inspector error with no error message");
    };

    let message = object
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default();

    // Checked before the code table: the inspector reports this under a
    // generic code.
    if message.contains("Cannot navigate to invalid URL") {
        return Error::invalid_argument(message);
    }

    match object.get("code").and_then(Value::as_i64) {
        Some(CODE_INVALID_PARAMS) => Error::invalid_argument(message),
        Some(CODE_METHOD_NOT_FOUND) => Error::unknown_command(message),
        Some(CODE_SERVER_ERROR) if message == "Frame with the given id was not found." => {
            Error::no_such_frame(message)
        }
        Some(CODE_SESSION_NOT_FOUND) => Error::no_such_frame(message),
        _ => Error::unknown_error(format!("unhandled inspector error: {error}")),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_error() {
        let err = parse_inspector_error("");
        assert!(matches!(err, Error::UnknownError { .. }));
        assert_eq!(
            err.to_string(),
            "unknown error: inspector error with no error message"
        );
    }

    #[test]
    fn test_unparseable_error() {
        let err = parse_inspector_error("err");
        assert!(matches!(err, Error::UnknownError { .. }));
    }

    #[test]
    fn test_invalid_url_error() {
        let err =
            parse_inspector_error(r#"{"message": "Cannot navigate to invalid URL"}"#);
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_invalid_url_precedes_code_table() {
        // Even with an otherwise-mapped code, the URL check wins.
        let err = parse_inspector_error(
            r#"{"code": -32601, "message": "Cannot navigate to invalid URL"}"#,
        );
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_invalid_argument_code() {
        let err =
            parse_inspector_error(r#"{"code": -32602, "message": "Error description"}"#);
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert_eq!(err.to_string(), "invalid argument: Error description");
    }

    #[test]
    fn test_unknown_code() {
        let raw = r#"{"code": 10, "message": "Error description"}"#;
        let err = parse_inspector_error(raw);
        assert!(matches!(err, Error::UnknownError { .. }));
        assert_eq!(
            err.to_string(),
            format!("unknown error: unhandled inspector error: {raw}")
        );
    }

    #[test]
    fn test_not_implemented_code() {
        let err = parse_inspector_error(r#"{"code":-32601,"message":"SOME MESSAGE"}"#);
        assert!(matches!(err, Error::UnknownCommand { .. }));
        assert_eq!(err.to_string(), "unknown command: SOME MESSAGE");
    }

    #[test]
    fn test_no_such_frame_server_error() {
        // The inspector reports a missing frame owner under the generic
        // server-error code; the message content is the only signal.
        let err = parse_inspector_error(
            r#"{"code":-32000,"message":"Frame with the given id was not found."}"#,
        );
        assert!(matches!(err, Error::NoSuchFrame { .. }));
        assert_eq!(
            err.to_string(),
            "no such frame: Frame with the given id was not found."
        );
    }

    #[test]
    fn test_other_server_error_unmapped() {
        let err = parse_inspector_error(r#"{"code":-32000,"message":"something else"}"#);
        assert!(matches!(err, Error::UnknownError { .. }));
    }

    #[test]
    fn test_session_not_found_code() {
        let err = parse_inspector_error(r#"{"code":-32001,"message":"SOME MESSAGE"}"#);
        assert!(matches!(err, Error::NoSuchFrame { .. }));
        assert_eq!(err.to_string(), "no such frame: SOME MESSAGE");
    }
}
