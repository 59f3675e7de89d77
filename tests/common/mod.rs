//! Scripted receiver for integration tests
//!
//! Speaks just enough UBX to get through the startup handshake and then
//! replays navigation epochs, so the whole monitor runs over an in-memory
//! duplex instead of a device.

#![allow(dead_code)]

use jammon::Frame;
use jammon::MessageId;
use jammon::protocol::FrameDecoder;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

pub const NAV_PVT: MessageId = MessageId::new(0x01, 0x07);
pub const NAV_SAT: MessageId = MessageId::new(0x01, 0x35);
pub const NAV_SIG: MessageId = MessageId::new(0x01, 0x43);
pub const MON_RF: MessageId = MessageId::new(0x0a, 0x38);
pub const MON_SPAN: MessageId = MessageId::new(0x0a, 0x31);

const ACK_ACK: MessageId = MessageId::new(0x05, 0x01);

/// Number of commands sent during startup.
pub const STARTUP_COMMANDS: usize = 8;

pub fn frame(message: MessageId, payload: Vec<u8>) -> Frame {
    Frame::new(message, payload).unwrap()
}

/// NAV-PVT for 2024-06-01 12:00:00 UTC at 51.5 N, 0.1 W, 100 m.
pub fn nav_pvt() -> Frame {
    let mut payload = vec![0u8; 92];
    payload[4..6].copy_from_slice(&2024u16.to_le_bytes());
    payload[6] = 6;
    payload[7] = 1;
    payload[8] = 12;
    payload[11] = 0x07;
    payload[24..28].copy_from_slice(&(-1_000_000i32).to_le_bytes());
    payload[28..32].copy_from_slice(&515_000_000i32.to_le_bytes());
    payload[32..36].copy_from_slice(&100_000i32.to_le_bytes());
    payload[40..44].copy_from_slice(&1_800u32.to_le_bytes());
    payload[44..48].copy_from_slice(&2_900u32.to_le_bytes());
    frame(NAV_PVT, payload)
}

/// NAV-SAT with `used` of `total` satellites in the navigation solution.
pub fn nav_sat(total: u8, used: u8) -> Frame {
    let mut payload = vec![0u8; 8];
    payload[4] = 0x01;
    payload[5] = total;
    for index in 0..total {
        let mut record = [0u8; 12];
        record[1] = index + 1;
        let flags: u32 = if index < used { 0x0f } else { 0x07 };
        record[8..12].copy_from_slice(&flags.to_le_bytes());
        payload.extend_from_slice(&record);
    }
    frame(NAV_SAT, payload)
}

/// NAV-SIG with one L1 and one L2 signal, both locked.
pub fn nav_sig() -> Frame {
    let mut payload = vec![0u8; 8];
    payload[5] = 2;
    for (index, sig_id) in [0u8, 3].into_iter().enumerate() {
        let mut record = [0u8; 16];
        record[1] = index as u8 + 1;
        record[2] = sig_id;
        record[7] = 7;
        payload.extend_from_slice(&record);
    }
    frame(NAV_SIG, payload)
}

/// MON-RF with `bands` blocks, each reporting `jam_cw` on the CW indicator.
pub fn mon_rf(bands: u8, jam_cw: u8) -> Frame {
    let mut payload = vec![0x00, bands, 0x00, 0x00];
    for index in 0..bands {
        let mut block = [0u8; 24];
        block[0] = index;
        block[1] = 0x01;
        block[12..14].copy_from_slice(&90u16.to_le_bytes());
        block[14..16].copy_from_slice(&5_000u16.to_le_bytes());
        block[16] = jam_cw;
        payload.extend_from_slice(&block);
    }
    frame(MON_RF, payload)
}

/// MON-SPAN with `bands` flat spectra.
pub fn mon_span(bands: u8) -> Frame {
    let mut payload = vec![0x00, bands, 0x00, 0x00];
    for _ in 0..bands {
        payload.extend_from_slice(&[0x40; 256]);
        payload.extend_from_slice(&128_000_000u32.to_le_bytes());
        payload.extend_from_slice(&500_000u32.to_le_bytes());
        payload.extend_from_slice(&1_575_420_000u32.to_le_bytes());
        payload.extend_from_slice(&[54, 0, 0, 0]);
    }
    frame(MON_SPAN, payload)
}

/// Wire bytes of one navigation epoch.
pub fn epoch(bands: u8, jam_cw: u8) -> Vec<u8> {
    [nav_pvt(), nav_sat(12, 9), nav_sig(), mon_rf(bands, jam_cw), mon_span(bands)]
        .iter()
        .flat_map(Frame::to_bytes)
        .collect()
}

/// Acknowledge every startup command. Returns the command messages seen.
pub async fn acknowledge_startup(device: &mut DuplexStream) -> Vec<MessageId> {
    let mut decoder = FrameDecoder::default();
    let mut buf = [0u8; 256];
    let mut seen = Vec::new();

    while seen.len() < STARTUP_COMMANDS {
        let n = device.read(&mut buf).await.unwrap();
        assert!(n > 0, "monitor closed the link during startup");

        for command in decoder.decode_all(&buf[..n]) {
            let target = command.message;
            device.write_all(&frame(ACK_ACK, vec![target.class, target.id]).to_bytes()).await.unwrap();
            seen.push(target);
        }
    }
    seen
}
