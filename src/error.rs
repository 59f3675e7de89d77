//! Error types for the jamming monitor.
//!
//! Every fallible operation in the crate returns [`JammonError`]. Errors carry
//! enough structured context to log a useful diagnostic, and each one belongs
//! to exactly one [`ErrorClass`], which decides how far it propagates:
//!
//! - **Transient decode errors** (checksum mismatch, oversized frame) reset the
//!   frame decoder and are logged.
//! - **Schema mismatches** (wrong version or block count in a known message)
//!   skip that one message.
//! - **Handshake failures** abort startup.
//! - **Transport failures** end the steady-state decode loop.
//! - **Sink failures** are logged and otherwise ignored.
//!
//! ```rust
//! use jammon::{ErrorClass, JammonError};
//!
//! let error = JammonError::transport("device disconnected");
//! assert_eq!(error.class(), ErrorClass::Transport);
//! assert!(error.is_fatal());
//!
//! let error = JammonError::schema_mismatch("MON-RF", "block count", 2, 1);
//! assert!(!error.is_fatal());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::protocol::HandshakeOutcome;
use crate::types::MessageId;

/// Result type alias for monitor operations.
pub type Result<T, E = JammonError> = std::result::Result<T, E>;

/// Propagation class of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Recovered by resetting the frame decoder.
    TransientDecode,
    /// The offending message is skipped; other message types are unaffected.
    SchemaMismatch,
    /// Fatal to the configuration phase.
    Handshake,
    /// Fatal to the steady-state loop.
    Transport,
    /// Contained inside the sink that raised it.
    Sink,
    /// Invalid configuration, reported before anything is opened.
    Config,
    /// A snapshot could not be serialized for telemetry.
    Encode,
}

/// Main error type for monitor operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum JammonError {
    #[error("Transport failure: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("File error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Checksum mismatch for message {message}: computed {computed:02x?}, trailer {trailer:02x?}"
    )]
    Checksum { message: MessageId, computed: [u8; 2], trailer: [u8; 2] },

    #[error("Declared payload of {declared} bytes exceeds frame capacity of {capacity} bytes")]
    FrameTooLong { declared: usize, capacity: usize },

    #[error("Schema mismatch in {message}: {reason}")]
    Schema {
        message: &'static str,
        reason: String,
        expected: Option<u32>,
        found: Option<u32>,
    },

    #[error("Payload too short: need {needed} bytes at offset {offset}, have {available}")]
    Truncated { offset: usize, needed: usize, available: usize },

    #[error("Configuration command '{command}' failed: {outcome}")]
    Handshake { command: &'static str, outcome: HandshakeOutcome },

    #[error("Telemetry encoding failed: {details}")]
    Encode { details: String },

    #[error("Sink '{sink}' failed: {details}")]
    Sink { sink: &'static str, details: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl JammonError {
    /// Returns the propagation class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            JammonError::Transport { .. } => ErrorClass::Transport,
            JammonError::File { .. } => ErrorClass::Sink,
            JammonError::Checksum { .. } => ErrorClass::TransientDecode,
            JammonError::FrameTooLong { .. } => ErrorClass::TransientDecode,
            JammonError::Schema { .. } => ErrorClass::SchemaMismatch,
            JammonError::Truncated { .. } => ErrorClass::SchemaMismatch,
            JammonError::Handshake { .. } => ErrorClass::Handshake,
            JammonError::Encode { .. } => ErrorClass::Encode,
            JammonError::Sink { .. } => ErrorClass::Sink,
            JammonError::Config { .. } => ErrorClass::Config,
        }
    }

    /// Returns whether this error must terminate the program.
    pub fn is_fatal(&self) -> bool {
        matches!(self.class(), ErrorClass::Handshake | ErrorClass::Transport | ErrorClass::Config)
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self.class() {
            ErrorClass::TransientDecode => vec![
                "Check cabling and electrical noise on the receiver link",
                "Raise the frame capacity if large messages are expected",
            ],
            ErrorClass::SchemaMismatch => vec![
                "Check that the band mode matches the receiver (single vs dual band)",
                "Verify the receiver firmware message versions",
            ],
            ErrorClass::Handshake => vec![
                "Check that the receiver speaks UBX on this port",
                "Power-cycle the receiver or start with --reset",
                "Increase the handshake attempt bound",
            ],
            ErrorClass::Transport => vec![
                "Check the device path and permissions",
                "Verify the receiver is still connected",
            ],
            ErrorClass::Sink => vec![
                "Check the output directory exists and is writable",
                "Verify the telemetry host resolves",
            ],
            ErrorClass::Config => vec!["Check the configuration file and command-line flags"],
            ErrorClass::Encode => vec!["Check the snapshot band layout matches the band mode"],
        }
    }

    /// Helper constructor for transport failures without an I/O source.
    pub fn transport(reason: impl Into<String>) -> Self {
        JammonError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for transport failures caused by an I/O error.
    pub fn transport_io(reason: impl Into<String>, source: std::io::Error) -> Self {
        JammonError::Transport { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        JammonError::File { path, source }
    }

    /// Helper constructor for a header field that does not hold the expected value.
    pub fn schema_mismatch(
        message: &'static str,
        field: &'static str,
        expected: u32,
        found: u32,
    ) -> Self {
        JammonError::Schema {
            message,
            reason: format!("{} expected {}, received {}", field, expected, found),
            expected: Some(expected),
            found: Some(found),
        }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        JammonError::Config { reason: reason.into() }
    }
}

impl From<std::io::Error> for JammonError {
    fn from(err: std::io::Error) -> Self {
        JammonError::Transport { reason: "I/O error".to_string(), source: Some(err) }
    }
}
