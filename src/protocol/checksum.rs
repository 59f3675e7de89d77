//! 8-bit Fletcher checksum used by UBX frames
//!
//! Two running sums, both modulo 256, computed over class, id, the two
//! length bytes and the payload. Sync bytes and the trailer are excluded.

use crate::types::{CHECKSUM_LEN, SYNC_1, SYNC_2};

/// Incremental checksum state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fletcher {
    a: u8,
    b: u8,
}

impl Fletcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn update(&mut self, byte: u8) {
        self.a = self.a.wrapping_add(byte);
        self.b = self.b.wrapping_add(self.a);
    }

    pub fn update_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.update(byte);
        }
    }

    /// Current `[ckA, ckB]`.
    pub fn finish(&self) -> [u8; 2] {
        [self.a, self.b]
    }
}

/// Checksum over `bytes` (class through end of payload).
pub fn compute(bytes: &[u8]) -> [u8; 2] {
    let mut fletcher = Fletcher::new();
    fletcher.update_slice(bytes);
    fletcher.finish()
}

/// Verify a span laid out as `[class, id, len_lo, len_hi, payload.., ckA, ckB]`.
pub fn verify(span: &[u8]) -> bool {
    if span.len() < CHECKSUM_LEN {
        return false;
    }
    let (body, trailer) = span.split_at(span.len() - CHECKSUM_LEN);
    compute(body) == [trailer[0], trailer[1]]
}

/// Verify a complete wire frame including its two sync bytes.
pub fn verify_frame(bytes: &[u8]) -> bool {
    match bytes {
        [SYNC_1, SYNC_2, span @ ..] => verify(span),
        _ => false,
    }
}
