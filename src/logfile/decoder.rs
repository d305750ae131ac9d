//! # Payload Decoder
//!
//! Turns the raw payload text of an envelope into a structured value.
//!
//! The two recognized kinds are encoded differently by the flight computer,
//! so decoding is kind-specific:
//!
//! - `REQ`: dict-literal text. A syntax error drops the envelope.
//! - `RESP`: bare digits become an integer, otherwise strict JSON. Text that
//!   is neither is kept as an unparsed string instead of being dropped.
//! - anything else: not decoded.

use serde_json::Value;

use super::literal::parse_literal;
use super::parser::MessageKind;
use crate::error::Result;

/// Structured payload, tagged with the decoding path that produced it
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPayload {
    /// Request payload decoded from dict-literal syntax
    Literal(Value),

    /// Response payload decoded as JSON
    Json(Value),

    /// Response payload made only of decimal digits (a status code)
    Integer(i64),

    /// Response payload that is neither digits nor valid JSON
    Unparsed(String),
}

impl DecodedPayload {
    /// Plain JSON value as written to the intermediate artifact
    pub fn into_value(self) -> Value {
        match self {
            DecodedPayload::Literal(value) | DecodedPayload::Json(value) => value,
            DecodedPayload::Integer(n) => Value::from(n),
            DecodedPayload::Unparsed(text) => Value::String(text),
        }
    }
}

/// Decode `raw` according to `kind`
///
/// # Returns
///
/// * `Ok(Some(payload))` - decoded (or, for responses, kept unparsed)
/// * `Ok(None)` - the kind is not one that gets decoded
///
/// # Errors
///
/// Returns `FlightLogError::Literal` when a request payload is not a valid
/// dict literal. The caller is expected to drop the envelope and carry on.
pub fn decode_payload(kind: &MessageKind, raw: &str) -> Result<Option<DecodedPayload>> {
    match kind {
        MessageKind::Request => parse_literal(raw).map(|value| Some(DecodedPayload::Literal(value))),
        MessageKind::Response => Ok(Some(decode_response(raw))),
        MessageKind::Other(_) => Ok(None),
    }
}

fn decode_response(raw: &str) -> DecodedPayload {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = trimmed.parse::<i64>() {
            return DecodedPayload::Integer(n);
        }
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(value) => DecodedPayload::Json(value),
        Err(_) => DecodedPayload::Unparsed(raw.to_string()),
    }
}
