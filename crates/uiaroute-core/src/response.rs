//! Validation of UIA replies.
//!
//! The HTTP bridges return the engine's reply as JSON. A well-formed reply is
//! a one-element array holding a `{status, value}` map:
//!
//! ```text
//! [{"status": "success", "value": ...}]
//! ```
//!
//! [`handle_uia_results`] walks the reply through a fixed sequence of checks
//! and either unwraps the value into a normalized `Vec<Value>` or returns a
//! classified error:
//!
//! ```text
//! reply ─▶ is array ─▶ one element ─▶ element is map ─▶ valid status ─▶ has value
//!                                                                          │
//!                                       status "error" ─▶ UiaError::Backend ◀┤
//!                                       status "success" ─▶ Ok(Vec<Value>) ◀─┘
//! ```
//!
//! The device server may wrap the reply in an `{outcome, results}` envelope;
//! [`route_handle_response`] strips that first.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::{Result, UiaError};

/// Sentinel the engine uses for a `nil` return value.
pub const NIL_SENTINEL: &str = ":nil";

const STATUS_SUCCESS: &str = "success";
const STATUS_ERROR: &str = "error";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A reply whose shape does not match the UIA result contract.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// The response body was not valid JSON.
    #[error("could not parse response body as JSON: {message}; body: {body}")]
    InvalidJson {
        /// Parser error message.
        message: String,
        /// The raw body.
        body: String,
    },

    /// A server envelope reported success but carried no `results`.
    #[error("server response has no 'results' key: {body}")]
    MissingResults {
        /// The envelope as received.
        body: Value,
    },

    /// The reply was not an array.
    #[error("expected UIA results for command '{command}' to be an array, got: {reply}")]
    NotAnArray {
        /// The command that produced the reply.
        command: String,
        /// The reply as received.
        reply: Value,
    },

    /// The reply array did not contain exactly one element.
    #[error("expected UIA results for command '{command}' to have exactly one element, found {count}: {reply}")]
    WrongElementCount {
        /// Number of elements found.
        count: usize,
        /// The command that produced the reply.
        command: String,
        /// The reply as received.
        reply: Value,
    },

    /// The single reply element was not a map.
    #[error("expected UIA result element for command '{command}' to be a map, got: {element}. Response: {reply}")]
    ElementNotAMap {
        /// The offending element.
        element: Value,
        /// The command that produced the reply.
        command: String,
        /// The reply as received.
        reply: Value,
    },

    /// The `status` key was missing or not `success`/`error`.
    #[error("invalid UIA status {status} for command '{command}'; expected 'success' or 'error'. Response: {reply}")]
    InvalidStatus {
        /// The status found (`null` when the key was missing).
        status: Value,
        /// The command that produced the reply.
        command: String,
        /// The reply element.
        reply: Value,
    },

    /// The reply map had no `value` key.
    #[error("UIA result for command '{command}' has no 'value' key. Response: {reply}")]
    MissingValue {
        /// The command that produced the reply.
        command: String,
        /// The reply element.
        reply: Value,
    },
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// The two statuses a UIA reply may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiaStatus {
    /// The command ran and produced a value.
    Success,
    /// The engine reported an error; `value` holds the details.
    Error,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Parses an HTTP body and strips the device server's envelope, if any.
///
/// Bodies that are objects carrying an `outcome` key are envelopes:
/// `SUCCESS` yields the `results` field, any other outcome becomes
/// [`UiaError::Backend`]. Every other body is returned as-is.
pub fn route_handle_response(body: &str, command: &str) -> Result<Value> {
    let parsed: Value = serde_json::from_str(body).map_err(|e| ProtocolError::InvalidJson {
        message: e.to_string(),
        body: body.to_string(),
    })?;

    let envelope = match &parsed {
        Value::Object(map) if map.contains_key("outcome") => map,
        _ => return Ok(parsed),
    };

    match envelope.get("outcome").and_then(Value::as_str) {
        Some("SUCCESS") => envelope
            .get("results")
            .cloned()
            .ok_or_else(|| ProtocolError::MissingResults { body: parsed.clone() }.into()),
        _ => {
            let mut detail = Map::new();
            for key in ["reason", "details"] {
                if let Some(v) = envelope.get(key) {
                    detail.insert(key.to_string(), v.clone());
                }
            }
            Err(UiaError::Backend {
                command: command.to_string(),
                detail: Value::Object(detail),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Checks the reply is an array.
pub fn expect_uia_results_is_array<'a>(
    reply: &'a Value,
    command: &str,
) -> std::result::Result<&'a Vec<Value>, ProtocolError> {
    reply.as_array().ok_or_else(|| ProtocolError::NotAnArray {
        command: command.to_string(),
        reply: reply.clone(),
    })
}

/// Checks the reply array holds exactly one element and returns it.
pub fn expect_uia_results_has_one_element<'a>(
    results: &'a [Value],
    command: &str,
) -> std::result::Result<&'a Value, ProtocolError> {
    match results {
        [element] => Ok(element),
        _ => Err(ProtocolError::WrongElementCount {
            count: results.len(),
            command: command.to_string(),
            reply: Value::Array(results.to_vec()),
        }),
    }
}

/// Checks the reply element is a map.
///
/// `reply` is the whole reply the element came from.
pub fn expect_uia_response_element_is_map<'a>(
    element: &'a Value,
    reply: &Value,
    command: &str,
) -> std::result::Result<&'a Map<String, Value>, ProtocolError> {
    element.as_object().ok_or_else(|| ProtocolError::ElementNotAMap {
        element: element.clone(),
        command: command.to_string(),
        reply: reply.clone(),
    })
}

/// Checks the map carries a `status` of `success` or `error`.
pub fn expect_uia_result_has_valid_status_key(
    result: &Map<String, Value>,
    command: &str,
) -> std::result::Result<UiaStatus, ProtocolError> {
    match result.get("status").and_then(Value::as_str) {
        Some(STATUS_SUCCESS) => Ok(UiaStatus::Success),
        Some(STATUS_ERROR) => Ok(UiaStatus::Error),
        _ => Err(ProtocolError::InvalidStatus {
            status: result.get("status").cloned().unwrap_or(Value::Null),
            command: command.to_string(),
            reply: Value::Object(result.clone()),
        }),
    }
}

/// Checks the map carries a `value` key and returns it.
pub fn expect_uia_result_has_value_key<'a>(
    result: &'a Map<String, Value>,
    command: &str,
) -> std::result::Result<&'a Value, ProtocolError> {
    result.get("value").ok_or_else(|| ProtocolError::MissingValue {
        command: command.to_string(),
        reply: Value::Object(result.clone()),
    })
}

// ---------------------------------------------------------------------------
// Unwrapping
// ---------------------------------------------------------------------------

/// Normalizes a successful `value` into a sequence.
///
/// Arrays pass through, the `:nil` sentinel becomes `[null]`, anything else is
/// wrapped in a one-element vector.
pub fn handle_uia_result_with_success(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::String(s) if s == NIL_SENTINEL => vec![Value::Null],
        other => vec![other.clone()],
    }
}

/// Validates a UIA reply and returns its normalized value.
///
/// `command` is the serialized command that produced the reply; it is only
/// used for error context.
pub fn handle_uia_results(reply: &Value, command: &str) -> Result<Vec<Value>> {
    let results = expect_uia_results_is_array(reply, command)?;
    let element = expect_uia_results_has_one_element(results, command)?;
    let result = expect_uia_response_element_is_map(element, reply, command)?;
    let status = expect_uia_result_has_valid_status_key(result, command)?;
    let value = expect_uia_result_has_value_key(result, command)?;

    match status {
        UiaStatus::Success => Ok(handle_uia_result_with_success(value)),
        UiaStatus::Error => Err(UiaError::Backend {
            command: command.to_string(),
            detail: value.clone(),
        }),
    }
}
