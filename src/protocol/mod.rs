//! UBX wire protocol: checksum, frame decoding, configuration commands and
//! the acknowledgment handshake.

pub mod checksum;
pub mod commands;
mod decoder;
mod handshake;

pub use commands::Command;
pub use decoder::{DEFAULT_FRAME_CAPACITY, DecoderStats, FrameDecoder};
pub use handshake::{
    ACK_HEADER, AckMatcher, AckProgress, DEFAULT_ACK_DEADLINE, DEFAULT_MAX_ATTEMPTS, Handshake,
    HandshakeOutcome, NACK_HEADER,
};
