//! Core types for frames, decoded field groups and snapshots.
//!
//! ## Architecture
//!
//! - [`Frame`] is one complete, checksum-validated UBX message with its payload
//!   shared behind an `Arc`
//! - [`LeField`] reads fixed-width little-endian integers at explicit offsets
//! - [`FieldGroup`] is the typed result of decoding one message
//! - [`Snapshot`] fuses the latest value of every group
//!
//! ## Usage Example
//!
//! ```rust
//! use jammon::types::{Frame, MessageId, le_field};
//!
//! let frame = Frame::new(MessageId::new(0x0a, 0x38), vec![0x00, 0x01, 0x00, 0x00]).unwrap();
//! let blocks: u8 = le_field::read(&frame.payload, 1).unwrap();
//! assert_eq!(blocks, 1);
//! assert_eq!(frame.to_bytes().len(), 12);
//! ```

mod band;
mod frame;
mod groups;
pub mod le_field;
mod snapshot;

pub use band::{BandMode, MAX_BANDS};
pub use frame::{CHECKSUM_LEN, FRAME_OVERHEAD, Frame, HEADER_LEN, MessageId, SYNC_1, SYNC_2};
pub use groups::{
    FieldGroup, GroupKind, PositionTime, RfBand, RfStatus, SPECTRUM_BINS, SatelliteUsage,
    SignalCounts, Spectrum, SpectrumBlock,
};
pub use le_field::LeField;
pub use snapshot::Snapshot;
