//! Inspector frame classification.
//!
//! The parser is the only place in the crate that reads raw JSON off the
//! wire; everything downstream consumes the tagged [`InspectorMessage`].
//!
//! Classification rules, applied in order:
//!
//! 1. The frame must parse as a JSON object.
//! 2. A string `method` key makes it an event; `params` defaults to an
//!    empty object, `sessionId` to the empty string.
//! 3. Otherwise an integer `id` key makes it a command response. A missing
//!    `result` with no `error` becomes an empty `result`; an `error`
//!    object is serialized back to a JSON string and preserved verbatim
//!    for the error mapper.
//! 4. Anything else is a parse failure.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};

use crate::identifiers::CommandId;

// ============================================================================
// Types
// ============================================================================

/// Parser hook used by the dispatch core.
///
/// The default is [`parse_inspector_message`]; tests substitute fakes that
/// fabricate frames. `expected_id` is the command id the active pump is
/// waiting on, if any; the real parser ignores it.
pub type ParserFunc = Box<dyn Fn(&str, Option<CommandId>) -> Option<InspectorMessage>>;

// ============================================================================
// InspectorMessage
// ============================================================================

/// A classified inspector frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InspectorMessage {
    /// A server-pushed event.
    Event(InspectorEvent),
    /// A response to a numbered command.
    CommandResponse(InspectorCommandResponse),
}

/// A server-pushed event notification.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectorEvent {
    /// Event name in `Domain.event` format.
    pub method: String,
    /// Event payload; an empty object when the frame omitted it.
    pub params: Value,
    /// Session the event belongs to; empty for the root session.
    pub session_id: String,
}

/// A response to a numbered command.
///
/// Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectorCommandResponse {
    /// Matches the id of the originating command.
    pub id: CommandId,
    /// Session the response belongs to; empty for the root session.
    pub session_id: String,
    /// Result payload on success.
    pub result: Option<Value>,
    /// The inspector `error` object on failure, re-serialized verbatim.
    pub error: Option<String>,
}

impl InspectorMessage {
    /// Serializes the message back to its wire form.
    #[must_use]
    pub fn render(&self) -> String {
        let mut object = Map::new();
        match self {
            Self::Event(event) => {
                object.insert("method".into(), Value::String(event.method.clone()));
                object.insert("params".into(), event.params.clone());
                if !event.session_id.is_empty() {
                    object.insert("sessionId".into(), Value::String(event.session_id.clone()));
                }
            }
            Self::CommandResponse(response) => {
                object.insert("id".into(), Value::from(response.id.raw()));
                if !response.session_id.is_empty() {
                    object.insert(
                        "sessionId".into(),
                        Value::String(response.session_id.clone()),
                    );
                }
                if let Some(error) = &response.error {
                    let error: Value =
                        serde_json::from_str(error).unwrap_or_else(|_| Value::String(error.clone()));
                    object.insert("error".into(), error);
                } else if let Some(result) = &response.result {
                    object.insert("result".into(), result.clone());
                }
            }
        }
        Value::Object(object).to_string()
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Classifies a raw frame as an event or a command response.
///
/// Returns `None` when the frame is not JSON, not an object, or neither
/// message shape. A parse failure is fatal for the current call but does
/// not disconnect the transport.
#[must_use]
pub fn parse_inspector_message(
    message: &str,
    _expected_id: Option<CommandId>,
) -> Option<InspectorMessage> {
    let value: Value = serde_json::from_str(message).ok()?;
    let object = value.as_object()?;

    let session_id = object
        .get("sessionId")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if let Some(method) = object.get("method").and_then(Value::as_str) {
        let params = match object.get("params") {
            Some(params @ Value::Object(_)) => params.clone(),
            _ => Value::Object(Map::new()),
        };
        return Some(InspectorMessage::Event(InspectorEvent {
            method: method.to_string(),
            params,
            session_id,
        }));
    }

    if let Some(id) = object.get("id").and_then(Value::as_i64) {
        let id = CommandId::new(id);
        if let Some(error) = object.get("error") {
            // Preserved verbatim; the error mapper re-reads it.
            let error = error.to_string();
            return Some(InspectorMessage::CommandResponse(InspectorCommandResponse {
                id,
                session_id,
                result: None,
                error: Some(error),
            }));
        }
        let result = object
            .get("result")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        return Some(InspectorMessage::CommandResponse(InspectorCommandResponse {
            id,
            session_id,
            result: Some(result),
            error: None,
        }));
    }

    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn parse(message: &str) -> Option<InspectorMessage> {
        parse_inspector_message(message, None)
    }

    #[test]
    fn test_non_json() {
        assert_eq!(parse("hi"), None);
    }

    #[test]
    fn test_non_object() {
        assert_eq!(parse("[1,2]"), None);
        assert_eq!(parse("42"), None);
    }

    #[test]
    fn test_neither_command_nor_event() {
        assert_eq!(parse("{}"), None);
        assert_eq!(parse(r#"{"sessionId":"X"}"#), None);
    }

    #[test]
    fn test_event_no_params() {
        let message = parse(r#"{"method":"method"}"#).expect("parses");
        let InspectorMessage::Event(event) = message else {
            panic!("expected event");
        };
        assert_eq!(event.method, "method");
        assert_eq!(event.params, json!({}));
        assert_eq!(event.session_id, "");
    }

    #[test]
    fn test_event_no_params_with_session_id() {
        let message =
            parse(r#"{"method":"method","sessionId":"B221AF2"}"#).expect("parses");
        let InspectorMessage::Event(event) = message else {
            panic!("expected event");
        };
        assert_eq!(event.method, "method");
        assert_eq!(event.params, json!({}));
        assert_eq!(event.session_id, "B221AF2");
    }

    #[test]
    fn test_event_with_params() {
        let message = parse(r#"{"method":"method","params":{"key":100},"sessionId":"AB3A"}"#)
            .expect("parses");
        let InspectorMessage::Event(event) = message else {
            panic!("expected event");
        };
        assert_eq!(event.params["key"], 100);
        assert_eq!(event.session_id, "AB3A");
    }

    #[test]
    fn test_command_no_error_or_result() {
        // The inspector does not necessarily return a result dictionary for
        // every valid response; a blank result is inferred.
        let message = parse(r#"{"id":1,"sessionId":"AB2AF3C"}"#).expect("parses");
        let InspectorMessage::CommandResponse(response) = message else {
            panic!("expected command response");
        };
        assert_eq!(response.id, CommandId::new(1));
        assert_eq!(response.result, Some(json!({})));
        assert_eq!(response.error, None);
        assert_eq!(response.session_id, "AB2AF3C");
    }

    #[test]
    fn test_command_error() {
        let message = parse(r#"{"id":1,"error":{}}"#).expect("parses");
        let InspectorMessage::CommandResponse(response) = message else {
            panic!("expected command response");
        };
        assert_eq!(response.id, CommandId::new(1));
        assert!(response.error.as_ref().is_some_and(|e| !e.is_empty()));
        assert_eq!(response.result, None);
    }

    #[test]
    fn test_command_result() {
        let message = parse(r#"{"id":1,"result":{"key":1}}"#).expect("parses");
        let InspectorMessage::CommandResponse(response) = message else {
            panic!("expected command response");
        };
        assert_eq!(response.id, CommandId::new(1));
        assert_eq!(response.error, None);
        assert_eq!(response.result, Some(json!({"key": 1})));
    }

    #[test]
    fn test_error_preserved_verbatim() {
        let message =
            parse(r#"{"id":3,"error":{"code":-32601,"message":"unknown"}}"#).expect("parses");
        let InspectorMessage::CommandResponse(response) = message else {
            panic!("expected command response");
        };
        let error: Value =
            serde_json::from_str(response.error.as_deref().expect("error set")).expect("json");
        assert_eq!(error["code"], -32601);
        assert_eq!(error["message"], "unknown");
    }

    #[test]
    fn test_render_round_trip_event() {
        let original = parse(r#"{"method":"Page.frameNavigated","params":{"key":1},"sessionId":"S1"}"#)
            .expect("parses");
        let rendered = original.render();
        let reparsed = parse(&rendered).expect("reparses");
        assert_eq!(original, reparsed);
    }

    #[test]
    fn test_render_round_trip_response() {
        for frame in [
            r#"{"id":7,"result":{"key":2}}"#,
            r#"{"id":8,"sessionId":"S2"}"#,
            r#"{"id":9,"error":{"code":-32000,"message":"ERR"}}"#,
        ] {
            let original = parse(frame).expect("parses");
            let reparsed = parse(&original.render()).expect("reparses");
            assert_eq!(original, reparsed);
        }
    }
}
