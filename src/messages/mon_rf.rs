//! MON-RF: RF front-end status per band

use super::{DecodeContext, MON_RF, MessageSpec, PayloadShape};
use crate::Result;
use crate::types::{FieldGroup, RfBand, RfStatus, le_field::read};

pub const NAME: &str = "MON-RF";
pub const SHAPE: PayloadShape = PayloadShape::Repeated { header: 4, record: 24 };

pub const SPEC: MessageSpec = MessageSpec { name: NAME, message: MON_RF, shape: SHAPE, decode };

const FLAGS: usize = 1;
const NOISE_PER_MS: usize = 12;
const AGC_CNT: usize = 14;
const JAM_IND: usize = 16;

/// Broadband jamming state lives in the two low bits of `flags`.
const JAMMING_STATE_MASK: u8 = 0x03;

pub fn parse(payload: &[u8], context: &DecodeContext) -> Result<RfStatus> {
    super::expect_version(NAME, payload, 0, 0x00)?;
    let count = super::expect_band_blocks(NAME, payload, 1, context)?;
    super::expect_length(NAME, payload, SHAPE, count)?;

    let bands = (0..count)
        .map(|index| {
            let base = SHAPE.record_offset(index);
            Ok(RfBand {
                agc: read(payload, base + AGC_CNT)?,
                noise: read(payload, base + NOISE_PER_MS)?,
                jam_cw: read(payload, base + JAM_IND)?,
                jam_bb: read::<u8>(payload, base + FLAGS)? & JAMMING_STATE_MASK,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RfStatus { bands })
}

fn decode(payload: &[u8], context: &DecodeContext) -> Result<FieldGroup> {
    parse(payload, context).map(FieldGroup::RfStatus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JammonError;
    use crate::test_utils::mon_rf_payload;
    use crate::types::BandMode;

    const L1: RfBand = RfBand { agc: 5120, noise: 87, jam_cw: 12, jam_bb: 1 };
    const L2: RfBand = RfBand { agc: 4012, noise: 93, jam_cw: 40, jam_bb: 2 };

    #[test]
    fn single_band() {
        let status = parse(&mon_rf_payload(&[L1]), &DecodeContext::new(BandMode::Single)).unwrap();
        assert_eq!(status.bands, vec![L1]);
    }

    #[test]
    fn dual_band_reads_second_block() {
        let status =
            parse(&mon_rf_payload(&[L1, L2]), &DecodeContext::new(BandMode::Dual)).unwrap();
        assert_eq!(status.bands, vec![L1, L2]);
    }

    #[test]
    fn jamming_state_ignores_upper_flag_bits() {
        let mut payload = mon_rf_payload(&[L1]);
        payload[4 + FLAGS] = 0b1111_1110;

        let status = parse(&payload, &DecodeContext::default()).unwrap();
        assert_eq!(status.bands[0].jam_bb, 2);
    }

    #[test]
    fn block_count_must_match_band_mode() {
        let payload = mon_rf_payload(&[L1]);
        match parse(&payload, &DecodeContext::new(BandMode::Dual)) {
            Err(JammonError::Schema { message, expected, found, .. }) => {
                assert_eq!(message, NAME);
                assert_eq!((expected, found), (Some(2), Some(1)));
            }
            other => panic!("Expected schema mismatch, got {:?}", other),
        }
    }

    #[test]
    fn version_must_be_zero() {
        let mut payload = mon_rf_payload(&[L1]);
        payload[0] = 0x01;
        assert!(matches!(
            parse(&payload, &DecodeContext::default()),
            Err(JammonError::Schema { .. })
        ));
    }

    #[test]
    fn truncated_block_is_rejected() {
        let mut payload = mon_rf_payload(&[L1]);
        payload.truncate(20);
        assert!(matches!(
            parse(&payload, &DecodeContext::default()),
            Err(JammonError::Schema { .. })
        ));
        assert!(parse(&[], &DecodeContext::default()).is_err());
    }
}
