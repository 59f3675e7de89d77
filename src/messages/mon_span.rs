//! MON-SPAN: spectrum analyzer output per band

use super::{DecodeContext, MON_SPAN, MessageSpec, PayloadShape};
use crate::Result;
use crate::types::{FieldGroup, SPECTRUM_BINS, Spectrum, SpectrumBlock, le_field};

pub const NAME: &str = "MON-SPAN";
pub const SHAPE: PayloadShape = PayloadShape::Repeated { header: 4, record: 272 };

pub const SPEC: MessageSpec = MessageSpec { name: NAME, message: MON_SPAN, shape: SHAPE, decode };

const SPAN: usize = 256;
const RES: usize = 260;
const CENTER: usize = 264;
const PGA: usize = 268;

pub fn parse(payload: &[u8], context: &DecodeContext) -> Result<Spectrum> {
    super::expect_version(NAME, payload, 0, 0x00)?;
    let count = super::expect_band_blocks(NAME, payload, 1, context)?;
    super::expect_length(NAME, payload, SHAPE, count)?;

    let mut bands = Vec::with_capacity(count);
    for index in 0..count {
        let base = SHAPE.record_offset(index);
        bands.push(SpectrumBlock {
            spectrum: le_field::take::<SPECTRUM_BINS>(payload, base)?,
            span: le_field::read(payload, base + SPAN)?,
            resolution: le_field::read(payload, base + RES)?,
            center: le_field::read(payload, base + CENTER)?,
            pga: le_field::read(payload, base + PGA)?,
        });
    }

    Ok(Spectrum { bands })
}

fn decode(payload: &[u8], context: &DecodeContext) -> Result<FieldGroup> {
    parse(payload, context).map(FieldGroup::Spectrum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JammonError;
    use crate::test_utils::{mon_span_payload, ramp_spectrum};
    use crate::types::BandMode;

    fn block(center: u32, seed: u8) -> SpectrumBlock {
        SpectrumBlock {
            spectrum: ramp_spectrum(seed),
            span: 128_000_000,
            resolution: 500_000,
            center,
            pga: 54,
        }
    }

    #[test]
    fn single_band_keeps_all_bins_in_order() {
        let expected = block(1_575_420_000, 0);
        let spectrum =
            parse(&mon_span_payload(&[expected.clone()]), &DecodeContext::default()).unwrap();

        assert_eq!(spectrum.bands.len(), 1);
        assert_eq!(spectrum.bands[0], expected);
        assert_eq!(spectrum.bands[0].spectrum[0], 0);
        assert_eq!(spectrum.bands[0].spectrum[255], 255);
    }

    #[test]
    fn dual_band_second_block_at_record_offset() {
        let l1 = block(1_575_420_000, 0);
        let l2 = block(1_227_600_000, 100);
        let payload = mon_span_payload(&[l1.clone(), l2.clone()]);
        assert_eq!(payload.len(), 4 + 2 * 272);

        let spectrum = parse(&payload, &DecodeContext::new(BandMode::Dual)).unwrap();
        assert_eq!(spectrum.bands, vec![l1, l2]);
    }

    #[test]
    fn wrong_block_count_is_rejected() {
        let payload = mon_span_payload(&[block(1, 0), block(2, 0)]);
        assert!(matches!(
            parse(&payload, &DecodeContext::new(BandMode::Single)),
            Err(JammonError::Schema { .. })
        ));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut payload = mon_span_payload(&[block(1, 0)]);
        payload.push(0);
        assert!(matches!(
            parse(&payload, &DecodeContext::default()),
            Err(JammonError::Schema { .. })
        ));
    }
}
