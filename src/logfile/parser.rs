//! # Log Line Parser
//!
//! Splits one raw log line into a [`LogEnvelope`].
//!
//! Expected shape:
//!
//! ```text
//! 2025-09-02 08:17:50,493 - INFO - REQ: {'takim_numarasi': 5, ...}
//! ^ timestamp               ^ level  ^ kind ^ payload (rest of line)
//! ```

use chrono::NaiveDateTime;
use regex::Regex;
use std::fmt;
use tracing::debug;

use crate::error::Result;

/// Envelope pattern. The payload group is greedy to end-of-line.
const LINE_PATTERN: &str =
    r"(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3}) - (\w+) - (\w+): (.*)";

/// chrono format matching the timestamp group
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Kind tag for self-reported telemetry
pub const KIND_REQUEST: &str = "REQ";

/// Kind tag for server responses carrying peer positions
pub const KIND_RESPONSE: &str = "RESP";

/// Message kind tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Outgoing self-report (`REQ`), payload is a dict literal
    Request,
    /// Incoming response (`RESP`), payload is JSON or a bare scalar
    Response,
    /// Any other tag; carried through but never decoded
    Other(String),
}

impl MessageKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            KIND_REQUEST => MessageKind::Request,
            KIND_RESPONSE => MessageKind::Response,
            other => MessageKind::Other(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            MessageKind::Request => KIND_REQUEST,
            MessageKind::Response => KIND_RESPONSE,
            MessageKind::Other(tag) => tag,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// One matched log line, before payload decoding
#[derive(Debug, Clone, PartialEq)]
pub struct LogEnvelope {
    /// `YYYY-MM-DD HH:MM:SS,mmm`, kept verbatim
    pub timestamp: String,

    /// Severity tag (unused downstream)
    pub level: String,

    /// Message kind
    pub kind: MessageKind,

    /// Remainder of the line after `": "`
    pub raw_payload: String,
}

/// Stateless line parser holding the compiled envelope pattern
pub struct LineParser {
    pattern: Regex,
}

impl fmt::Debug for LineParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineParser")
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

impl LineParser {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(LINE_PATTERN)?;
        Ok(Self { pattern })
    }

    /// Parse one line of text
    ///
    /// # Returns
    ///
    /// * `Some(LogEnvelope)` - the line matched the envelope shape
    /// * `None` - the line is malformed (missing a field, bad timestamp)
    ///
    /// The envelope may appear anywhere in the line; leading noise such as a
    /// BOM or a console prefix is ignored.
    pub fn parse_line(&self, line: &str) -> Option<LogEnvelope> {
        let caps = self.pattern.captures(line)?;

        let timestamp = caps.get(1)?.as_str();
        if NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).is_err() {
            debug!("Skipping line with impossible timestamp: {}", timestamp);
            return None;
        }

        Some(LogEnvelope {
            timestamp: timestamp.to_string(),
            level: caps.get(2)?.as_str().to_string(),
            kind: MessageKind::from_tag(caps.get(3)?.as_str()),
            raw_payload: caps.get(4)?.as_str().to_string(),
        })
    }

    /// Parse every line of `text`, silently skipping the ones that do not match
    pub fn parse_lines<'a>(&'a self, text: &'a str) -> impl Iterator<Item = LogEnvelope> + 'a {
        text.lines().filter_map(move |line| self.parse_line(line))
    }
}
