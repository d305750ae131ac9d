//! # Log File Module
//!
//! Reading the flight computer's text log.
//!
//! This module handles:
//! - Matching `TIMESTAMP - LEVEL - KIND: PAYLOAD` lines into envelopes
//! - Decoding dict-literal request payloads without evaluating them
//! - Decoding JSON / status-code response payloads with a raw-text fallback

pub mod decoder;
pub mod literal;
pub mod parser;

pub use decoder::{decode_payload, DecodedPayload};
pub use parser::{LineParser, LogEnvelope, MessageKind};
