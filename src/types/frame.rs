//! Frame types for the UBX wire protocol

use std::fmt;
use std::sync::Arc;

use crate::protocol::checksum;
use crate::{JammonError, Result};

/// First sync byte of every frame.
pub const SYNC_1: u8 = 0xB5;
/// Second sync byte of every frame.
pub const SYNC_2: u8 = 0x62;
/// Sync, class, id and two length bytes.
pub const HEADER_LEN: usize = 6;
/// Two-byte checksum trailer.
pub const CHECKSUM_LEN: usize = 2;
/// Bytes a frame occupies on the wire beyond its payload.
pub const FRAME_OVERHEAD: usize = HEADER_LEN + CHECKSUM_LEN;

/// Message class and id pair identifying a message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId {
    pub class: u8,
    pub id: u8,
}

impl MessageId {
    pub const fn new(class: u8, id: u8) -> Self {
        Self { class, id }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}/0x{:02x}", self.class, self.id)
    }
}

/// A complete, checksum-validated frame.
///
/// Frames are only ever produced whole: the decoder hands one out after the
/// trailer has been verified, and command frames are built from a payload in
/// one step. The payload is shared (`Arc<[u8]>`) so dispatching a frame to
/// several consumers never copies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Class and id of the message
    pub message: MessageId,

    /// Payload bytes, excluding header and checksum
    pub payload: Arc<[u8]>,
}

impl Frame {
    /// Create a frame, rejecting payloads the 16-bit length field cannot describe.
    pub fn new(message: MessageId, payload: impl Into<Vec<u8>>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > u16::MAX as usize {
            return Err(JammonError::FrameTooLong {
                declared: payload.len(),
                capacity: u16::MAX as usize,
            });
        }

        Ok(Self { message, payload: payload.into() })
    }

    pub fn class(&self) -> u8 {
        self.message.class
    }

    pub fn id(&self) -> u8 {
        self.message.id
    }

    /// Declared payload length; always equal to `payload.len()`.
    pub fn length(&self) -> u16 {
        self.payload.len() as u16
    }

    /// Serialize to the wire layout, computing the checksum trailer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload.len() + FRAME_OVERHEAD);
        out.extend_from_slice(&[SYNC_1, SYNC_2, self.message.class, self.message.id]);
        out.extend_from_slice(&self.length().to_le_bytes());
        out.extend_from_slice(&self.payload);

        let trailer = checksum::compute(&out[2..]);
        out.extend_from_slice(&trailer);
        out
    }
}
