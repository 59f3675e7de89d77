//! Payload and frame builders for tests and benchmarks
//!
//! Builders produce byte-exact receiver payloads from typed values, so tests
//! state the decoded result they expect instead of hand-writing offsets.

#![cfg(any(test, feature = "benchmark"))]

use crate::messages::{MON_RF, MON_SPAN, NAV_PVT, NAV_SAT, NAV_SIG};
use crate::types::{BandMode, Frame, MessageId, RfBand, SPECTRUM_BINS, SpectrumBlock};

/// Field values for a NAV-PVT payload; unset fields are zero.
#[derive(Debug, Clone, Copy)]
pub struct PvtFixture {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub min: u8,
    pub sec: u8,
    pub valid: u8,
    pub lat: i32,
    pub lon: i32,
    pub height: i32,
    pub h_acc: u32,
    pub v_acc: u32,
}

impl Default for PvtFixture {
    fn default() -> Self {
        Self {
            year: 2024,
            month: 6,
            day: 1,
            hour: 12,
            min: 0,
            sec: 0,
            valid: 0x07,
            lat: 515_000_000,
            lon: -1_000_000,
            height: 100_000,
            h_acc: 1_800,
            v_acc: 2_900,
        }
    }
}

impl PvtFixture {
    pub fn payload(&self) -> Vec<u8> {
        let mut payload = vec![0u8; 92];
        payload[4..6].copy_from_slice(&self.year.to_le_bytes());
        payload[6] = self.month;
        payload[7] = self.day;
        payload[8] = self.hour;
        payload[9] = self.min;
        payload[10] = self.sec;
        payload[11] = self.valid;
        payload[24..28].copy_from_slice(&self.lon.to_le_bytes());
        payload[28..32].copy_from_slice(&self.lat.to_le_bytes());
        payload[32..36].copy_from_slice(&self.height.to_le_bytes());
        payload[40..44].copy_from_slice(&self.h_acc.to_le_bytes());
        payload[44..48].copy_from_slice(&self.v_acc.to_le_bytes());
        payload
    }
}

/// MON-RF payload with one 24-byte block per band.
pub fn mon_rf_payload(bands: &[RfBand]) -> Vec<u8> {
    let mut payload = vec![0x00, bands.len() as u8, 0x00, 0x00];
    for (index, band) in bands.iter().enumerate() {
        let mut block = [0u8; 24];
        block[0] = index as u8;
        block[1] = band.jam_bb;
        block[12..14].copy_from_slice(&band.noise.to_le_bytes());
        block[14..16].copy_from_slice(&band.agc.to_le_bytes());
        block[16] = band.jam_cw;
        payload.extend_from_slice(&block);
    }
    payload
}

/// MON-SPAN payload with one 272-byte block per band.
pub fn mon_span_payload(blocks: &[SpectrumBlock]) -> Vec<u8> {
    let mut payload = vec![0x00, blocks.len() as u8, 0x00, 0x00];
    for block in blocks {
        payload.extend_from_slice(&block.spectrum);
        payload.extend_from_slice(&block.span.to_le_bytes());
        payload.extend_from_slice(&block.resolution.to_le_bytes());
        payload.extend_from_slice(&block.center.to_le_bytes());
        payload.push(block.pga);
        payload.extend_from_slice(&[0u8; 3]);
    }
    payload
}

/// Spectrum whose bins count up from `seed`, wrapping.
pub fn ramp_spectrum(seed: u8) -> [u8; SPECTRUM_BINS] {
    std::array::from_fn(|i| seed.wrapping_add(i as u8))
}

/// NAV-SAT payload, one record per satellite, flagged used or not.
pub fn nav_sat_payload(used: &[bool]) -> Vec<u8> {
    let mut payload = vec![0u8; 8];
    payload[4] = 0x01;
    payload[5] = used.len() as u8;
    for (index, &in_use) in used.iter().enumerate() {
        let mut record = [0u8; 12];
        record[1] = index as u8 + 1;
        // Quality 7 plus the used flag
        let flags: u32 = 0x07 | if in_use { 1 << 3 } else { 0 };
        record[8..12].copy_from_slice(&flags.to_le_bytes());
        payload.extend_from_slice(&record);
    }
    payload
}

/// NAV-SIG payload from `(sigId, qualityInd)` pairs.
pub fn nav_sig_payload(signals: &[(u8, u8)]) -> Vec<u8> {
    let mut payload = vec![0u8; 8];
    payload[5] = signals.len() as u8;
    for (index, &(sig_id, quality)) in signals.iter().enumerate() {
        let mut record = [0u8; 16];
        record[1] = index as u8 + 1;
        record[2] = sig_id;
        record[7] = quality;
        payload.extend_from_slice(&record);
    }
    payload
}

/// Frame from a payload known to fit.
pub fn frame(message: MessageId, payload: Vec<u8>) -> Frame {
    Frame::new(message, payload).expect("test payload fits in a frame")
}

/// ACK-ACK wire bytes for `target`.
pub fn ack_bytes(target: MessageId) -> Vec<u8> {
    frame(MessageId::new(0x05, 0x01), vec![target.class, target.id]).to_bytes()
}

/// One navigation epoch: every tracked message once, in receiver order.
pub fn epoch_frames(band_mode: BandMode) -> Vec<Frame> {
    let rf = RfBand { agc: 5_000, noise: 90, jam_cw: 10, jam_bb: 1 };
    let block = SpectrumBlock {
        spectrum: ramp_spectrum(0),
        span: 128_000_000,
        resolution: 500_000,
        center: 1_575_420_000,
        pga: 54,
    };
    let bands = band_mode.block_count();

    vec![
        frame(NAV_PVT, PvtFixture::default().payload()),
        frame(NAV_SAT, nav_sat_payload(&[true; 12])),
        frame(NAV_SIG, nav_sig_payload(&[(0, 7), (0, 5), (3, 4), (5, 2)])),
        frame(MON_RF, mon_rf_payload(&vec![rf; bands])),
        frame(MON_SPAN, mon_span_payload(&vec![block; bands])),
    ]
}

/// Wire bytes for a sequence of frames.
pub fn wire(frames: &[Frame]) -> Vec<u8> {
    frames.iter().flat_map(Frame::to_bytes).collect()
}
