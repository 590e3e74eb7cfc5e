//! Error record handed back to the host when it asks.
//!
//! Decoders report failures through a single per-session slot rather than by
//! unwinding: the host must keep pulling audio after a recoverable error, so
//! the record travels alongside normal results instead of replacing them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Severity of a reported decoder error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The session is unusable; the host must close and discard it.
    Fatal,
    /// One frame was undecodable. The frame was skipped and decoding
    /// continues with the next packet.
    Stream,
}

/// A single decoder error: severity, backend sub-code, human message.
///
/// Overwritten in place each time the decoder records a new failure - the
/// slot never accumulates. Querying yields a copy and leaves the slot intact.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct DecoderError {
    /// Whether the session survived.
    pub kind: ErrorKind,
    /// Backend-specific sub-code; 0 when the backend gave none.
    pub code: i32,
    /// Human-readable description.
    pub message: String,
}

impl DecoderError {
    /// Build a fatal error record.
    pub fn fatal(code: i32, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Fatal,
            code,
            message: message.into(),
        }
    }

    /// Build a recoverable stream error record.
    pub fn stream(code: i32, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Stream,
            code,
            message: message.into(),
        }
    }

    /// Returns `true` if the session must be discarded.
    pub fn is_fatal(&self) -> bool {
        self.kind == ErrorKind::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_kind() {
        assert!(DecoderError::fatal(0, "open failed").is_fatal());
        assert!(!DecoderError::stream(0, "bad frame").is_fatal());
    }

    #[test]
    fn display_is_the_message() {
        let err = DecoderError::stream(-7, "error in the stream");
        assert_eq!(err.to_string(), "error in the stream");
    }
}
