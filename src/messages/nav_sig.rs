//! NAV-SIG: per-signal tracking information
//!
//! Reduced to acquired and locked counts per band. A locked signal is also
//! counted as acquired.

use super::{DecodeContext, MessageSpec, NAV_SIG, PayloadShape};
use crate::Result;
use crate::types::{FieldGroup, SignalCounts, le_field::read};

pub const NAME: &str = "NAV-SIG";
pub const SHAPE: PayloadShape = PayloadShape::Repeated { header: 8, record: 16 };

pub const SPEC: MessageSpec = MessageSpec { name: NAME, message: NAV_SIG, shape: SHAPE, decode };

const VERSION: usize = 4;
const NUM_SIGS: usize = 5;
const SIG_ID: usize = 2;
const QUALITY_IND: usize = 7;

/// Signal acquired (code lock may still be pending).
pub const ACQUIRED_QUALITY: u8 = 2;
/// Code and carrier locked.
pub const LOCKED_QUALITY: u8 = 4;

/// Band index a signal id contributes to: 0 and 1 are L1 signals.
fn band_of(sig_id: u8) -> usize {
    match sig_id {
        0 | 1 => 0,
        _ => 1,
    }
}

pub fn parse(payload: &[u8], _context: &DecodeContext) -> Result<SignalCounts> {
    super::expect_version(NAME, payload, VERSION, 0x00)?;
    let count = usize::from(read::<u8>(payload, NUM_SIGS)?);
    super::expect_length(NAME, payload, SHAPE, count)?;

    let mut counts = SignalCounts::default();
    for index in 0..count {
        let base = SHAPE.record_offset(index);
        let sig_id: u8 = read(payload, base + SIG_ID)?;
        let quality: u8 = read(payload, base + QUALITY_IND)?;
        let band = band_of(sig_id);

        if quality >= ACQUIRED_QUALITY {
            counts.acquired[band] = counts.acquired[band].saturating_add(1);
        }
        if quality >= LOCKED_QUALITY {
            counts.locked[band] = counts.locked[band].saturating_add(1);
        }
    }

    Ok(counts)
}

fn decode(payload: &[u8], context: &DecodeContext) -> Result<FieldGroup> {
    parse(payload, context).map(FieldGroup::SignalCounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JammonError;
    use crate::test_utils::nav_sig_payload;

    #[test]
    fn thresholds_and_bands() {
        let signals = [
            (0, 7), // L1, locked
            (1, 4), // L1, locked
            (0, 3), // L1, acquired
            (0, 1), // L1, searching
            (4, 5), // L2, locked
            (3, 2), // L2, acquired
            (6, 0), // L2, idle
        ];
        let counts = parse(&nav_sig_payload(&signals), &DecodeContext::default()).unwrap();

        assert_eq!(counts.acquired, [3, 2]);
        assert_eq!(counts.locked, [2, 1]);
    }

    #[test]
    fn locked_never_exceeds_acquired() {
        let signals: Vec<(u8, u8)> = (0..40).map(|i| (i % 7, i % 8)).collect();
        let counts = parse(&nav_sig_payload(&signals), &DecodeContext::default()).unwrap();

        for band in 0..2 {
            assert!(counts.locked[band] <= counts.acquired[band]);
        }
    }

    #[test]
    fn version_must_be_zero() {
        let mut payload = nav_sig_payload(&[(0, 7)]);
        payload[VERSION] = 1;
        assert!(matches!(
            parse(&payload, &DecodeContext::default()),
            Err(JammonError::Schema { .. })
        ));
    }
}
