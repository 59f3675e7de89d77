//! MessagePack telemetry encoding
//!
//! A snapshot becomes a map keyed by small integers. Which keys are present
//! depends only on the snapshot's band mode, so identical snapshots always
//! encode to identical bytes.

use rmp::encode::{self, ValueWriteError};

use crate::types::{BandMode, Snapshot};
use crate::{JammonError, Result};

/// Largest datagram the encoder will produce.
pub const MAX_DATAGRAM: usize = 4096;

/// Stable map keys.
pub mod keys {
    pub const TIMESTAMP: u8 = 0;
    pub const POSITION: u8 = 1;
    pub const ACCURACY: u8 = 2;
    pub const SIGNALS: u8 = 3;
    pub const RF_L1: u8 = 4;
    pub const JAMMING_L1: u8 = 5;
    pub const RF_L2: u8 = 6;
    pub const JAMMING_L2: u8 = 7;
    pub const SPECTRUM_L1: u8 = 10;
    pub const SPECTRUM_L2: u8 = 11;
}

/// Encodes snapshots into a reusable bounded buffer.
#[derive(Debug)]
pub struct TelemetryEncoder {
    buffer: Box<[u8]>,
}

impl Default for TelemetryEncoder {
    fn default() -> Self {
        Self::with_capacity(MAX_DATAGRAM)
    }
}

impl TelemetryEncoder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buffer: vec![0u8; capacity].into_boxed_slice() }
    }

    /// Encode `snapshot`, returning the written prefix of the buffer.
    ///
    /// Fails with [`JammonError::Encode`] if the snapshot does not fit.
    pub fn encode(&mut self, snapshot: &Snapshot) -> Result<&[u8]> {
        let capacity = self.buffer.len();
        let mut cursor: &mut [u8] = &mut self.buffer;
        write_snapshot(&mut cursor, snapshot).map_err(|e| JammonError::Encode {
            details: format!("{} (buffer of {} bytes)", e, capacity),
        })?;

        let written = capacity - cursor.len();
        Ok(&self.buffer[..written])
    }

    /// Encode into a freshly allocated vector.
    pub fn encode_to_vec(&mut self, snapshot: &Snapshot) -> Result<Vec<u8>> {
        self.encode(snapshot).map(<[u8]>::to_vec)
    }
}

type WriteResult = std::result::Result<(), ValueWriteError>;

fn write_snapshot(wr: &mut &mut [u8], snapshot: &Snapshot) -> WriteResult {
    let bands = snapshot.band_count();
    if snapshot.rf.bands.len() < bands || snapshot.spectrum.bands.len() < bands {
        return Err(ValueWriteError::InvalidDataWrite(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "snapshot carries fewer bands than its band mode",
        )));
    }

    let dual = snapshot.band_mode == BandMode::Dual;
    encode::write_map_len(wr, if dual { 10 } else { 7 })?;

    let position = &snapshot.position;
    encode::write_uint(wr, keys::TIMESTAMP.into())?;
    encode::write_uint(wr, u64::try_from(position.timestamp).unwrap_or(0))?;

    encode::write_uint(wr, keys::POSITION.into())?;
    encode::write_array_len(wr, 3)?;
    encode::write_sint(wr, position.lat.into())?;
    encode::write_sint(wr, position.lon.into())?;
    encode::write_sint(wr, position.height.into())?;

    encode::write_uint(wr, keys::ACCURACY.into())?;
    encode::write_array_len(wr, 2)?;
    encode::write_uint(wr, position.h_acc.into())?;
    encode::write_uint(wr, position.v_acc.into())?;

    let signals = &snapshot.signals;
    encode::write_uint(wr, keys::SIGNALS.into())?;
    encode::write_array_len(wr, 5)?;
    encode::write_uint(wr, signals.acquired[0].into())?;
    encode::write_uint(wr, signals.acquired[1].into())?;
    encode::write_uint(wr, signals.locked[0].into())?;
    encode::write_uint(wr, signals.locked[1].into())?;
    encode::write_uint(wr, snapshot.satellites.used_in_nav.into())?;

    let rf_keys: &[(u8, u8)] = if dual {
        &[(keys::RF_L1, keys::JAMMING_L1), (keys::RF_L2, keys::JAMMING_L2)]
    } else {
        &[(keys::RF_L1, keys::JAMMING_L1)]
    };
    for (band, &(rf_key, jamming_key)) in snapshot.rf.bands.iter().zip(rf_keys) {
        encode::write_uint(wr, rf_key.into())?;
        encode::write_array_len(wr, 2)?;
        encode::write_uint(wr, band.agc.into())?;
        encode::write_uint(wr, band.noise.into())?;

        encode::write_uint(wr, jamming_key.into())?;
        encode::write_array_len(wr, 2)?;
        encode::write_uint(wr, band.jam_cw.into())?;
        encode::write_uint(wr, band.jam_bb.into())?;
    }

    let spectrum_keys: &[u8] =
        if dual { &[keys::SPECTRUM_L1, keys::SPECTRUM_L2] } else { &[keys::SPECTRUM_L1] };
    for (block, &key) in snapshot.spectrum.bands.iter().zip(spectrum_keys) {
        encode::write_uint(wr, key.into())?;
        encode::write_array_len(wr, 4)?;
        encode::write_uint(wr, block.center.into())?;
        encode::write_uint(wr, block.resolution.into())?;
        encode::write_bin(wr, &block.spectrum)?;
        encode::write_uint(wr, block.pga.into())?;
    }

    Ok(())
}
