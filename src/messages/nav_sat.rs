//! NAV-SAT: per-satellite tracking information

use super::{DecodeContext, MessageSpec, NAV_SAT, PayloadShape};
use crate::Result;
use crate::types::{FieldGroup, SatelliteUsage, le_field::read};

pub const NAME: &str = "NAV-SAT";
pub const SHAPE: PayloadShape = PayloadShape::Repeated { header: 8, record: 12 };

pub const SPEC: MessageSpec = MessageSpec { name: NAME, message: NAV_SAT, shape: SHAPE, decode };

const VERSION: usize = 4;
const NUM_SVS: usize = 5;
const SV_FLAGS: usize = 8;
const SV_USED: u32 = 1 << 3;

pub fn parse(payload: &[u8], _context: &DecodeContext) -> Result<SatelliteUsage> {
    super::expect_version(NAME, payload, VERSION, 0x01)?;
    let count = usize::from(read::<u8>(payload, NUM_SVS)?);
    super::expect_length(NAME, payload, SHAPE, count)?;

    let mut used_in_nav = 0u8;
    for index in 0..count {
        let flags: u32 = read(payload, SHAPE.record_offset(index) + SV_FLAGS)?;
        if flags & SV_USED != 0 {
            used_in_nav = used_in_nav.saturating_add(1);
        }
    }

    Ok(SatelliteUsage { used_in_nav })
}

fn decode(payload: &[u8], context: &DecodeContext) -> Result<FieldGroup> {
    parse(payload, context).map(FieldGroup::SatelliteUsage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JammonError;
    use crate::test_utils::nav_sat_payload;

    #[test]
    fn counts_satellites_used_in_navigation() {
        let payload = nav_sat_payload(&[true, false, true, true, false]);
        let usage = parse(&payload, &DecodeContext::default()).unwrap();
        assert_eq!(usage.used_in_nav, 3);
    }

    #[test]
    fn other_flag_bits_do_not_count() {
        let mut payload = nav_sat_payload(&[false]);
        payload[8 + SV_FLAGS..8 + SV_FLAGS + 4].copy_from_slice(&0xffff_fff7u32.to_le_bytes());
        assert_eq!(parse(&payload, &DecodeContext::default()).unwrap().used_in_nav, 0);
    }

    #[test]
    fn empty_list() {
        let usage = parse(&nav_sat_payload(&[]), &DecodeContext::default()).unwrap();
        assert_eq!(usage.used_in_nav, 0);
    }

    #[test]
    fn count_disagreeing_with_length_is_rejected() {
        let mut payload = nav_sat_payload(&[true, true]);
        payload[NUM_SVS] = 3;
        assert!(matches!(
            parse(&payload, &DecodeContext::default()),
            Err(JammonError::Schema { .. })
        ));
    }
}
