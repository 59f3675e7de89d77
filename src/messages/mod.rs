//! Message registry and field extractors
//!
//! Every supported message maps a validated frame payload onto one
//! [`FieldGroup`]. Extractors read fields at explicit offsets and check the
//! header (version, record count, total length) before decoding anything,
//! so a payload from an unexpected firmware or band layout is rejected as a
//! schema mismatch instead of being decoded as garbage.

use std::collections::HashMap;

use crate::types::{BandMode, FieldGroup, Frame, MessageId, le_field};
use crate::{JammonError, Result};

pub mod mon_rf;
pub mod mon_span;
pub mod nav_pvt;
pub mod nav_sat;
pub mod nav_sig;

pub const MON_RF: MessageId = MessageId::new(0x0a, 0x38);
pub const MON_SPAN: MessageId = MessageId::new(0x0a, 0x31);
pub const NAV_PVT: MessageId = MessageId::new(0x01, 0x07);
pub const NAV_SAT: MessageId = MessageId::new(0x01, 0x35);
pub const NAV_SIG: MessageId = MessageId::new(0x01, 0x43);

/// Decoding parameters shared by every extractor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeContext {
    pub band_mode: BandMode,
}

impl DecodeContext {
    pub fn new(band_mode: BandMode) -> Self {
        Self { band_mode }
    }
}

/// Static layout of a message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// Exactly this many bytes
    Fixed(usize),

    /// A header followed by a counted list of fixed-size records
    Repeated { header: usize, record: usize },
}

impl PayloadShape {
    /// Payload length for `count` records.
    pub const fn expected_len(&self, count: usize) -> usize {
        match *self {
            PayloadShape::Fixed(len) => len,
            PayloadShape::Repeated { header, record } => header + count * record,
        }
    }

    /// Byte offset of record `index`.
    pub const fn record_offset(&self, index: usize) -> usize {
        match *self {
            PayloadShape::Fixed(_) => 0,
            PayloadShape::Repeated { header, record } => header + index * record,
        }
    }
}

pub type DecodeFn = fn(&[u8], &DecodeContext) -> Result<FieldGroup>;

/// Registry entry for one message type.
#[derive(Debug, Clone, Copy)]
pub struct MessageSpec {
    pub name: &'static str,
    pub message: MessageId,
    pub shape: PayloadShape,
    pub decode: DecodeFn,
}

/// Maps (class, id) to an extractor.
#[derive(Debug, Clone, Default)]
pub struct MessageRegistry {
    specs: HashMap<MessageId, MessageSpec>,
}

impl MessageRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every message the monitor tracks.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(mon_rf::SPEC);
        registry.register(mon_span::SPEC);
        registry.register(nav_pvt::SPEC);
        registry.register(nav_sat::SPEC);
        registry.register(nav_sig::SPEC);
        registry
    }

    /// Add or replace the extractor for `spec.message`.
    pub fn register(&mut self, spec: MessageSpec) -> Option<MessageSpec> {
        self.specs.insert(spec.message, spec)
    }

    pub fn get(&self, message: MessageId) -> Option<&MessageSpec> {
        self.specs.get(&message)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Decode `frame` with its registered extractor.
    ///
    /// Returns `Ok(None)` for messages nobody registered.
    pub fn dispatch(&self, frame: &Frame, context: &DecodeContext) -> Result<Option<FieldGroup>> {
        match self.specs.get(&frame.message) {
            Some(spec) => (spec.decode)(&frame.payload, context).map(Some),
            None => Ok(None),
        }
    }
}

/// Reject a payload whose version byte is not `expected`.
pub(crate) fn expect_version(
    name: &'static str,
    payload: &[u8],
    offset: usize,
    expected: u8,
) -> Result<()> {
    let version: u8 = le_field::read(payload, offset)?;
    if version != expected {
        return Err(JammonError::schema_mismatch(name, "version", expected.into(), version.into()));
    }
    Ok(())
}

/// Reject a per-band block count that does not match the band mode.
pub(crate) fn expect_band_blocks(
    name: &'static str,
    payload: &[u8],
    offset: usize,
    context: &DecodeContext,
) -> Result<usize> {
    let blocks: u8 = le_field::read(payload, offset)?;
    let expected = context.band_mode.block_count();
    if usize::from(blocks) != expected {
        return Err(JammonError::schema_mismatch(
            name,
            "block count",
            expected as u32,
            blocks.into(),
        ));
    }
    Ok(expected)
}

/// Reject a payload whose length disagrees with its shape.
pub(crate) fn expect_length(
    name: &'static str,
    payload: &[u8],
    shape: PayloadShape,
    count: usize,
) -> Result<()> {
    let expected = shape.expected_len(count);
    if payload.len() != expected {
        return Err(JammonError::schema_mismatch(
            name,
            "payload length",
            expected as u32,
            payload.len() as u32,
        ));
    }
    Ok(())
}
