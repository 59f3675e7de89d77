//! Receiver configuration commands
//!
//! Payloads are built field by field and wrapped in [`Frame`]s, so the
//! checksum trailer is always computed.

use crate::Result;
use crate::messages::{MON_RF, MON_SPAN, NAV_PVT, NAV_SAT, NAV_SIG};
use crate::types::{Frame, MessageId};

pub const CFG_PRT: MessageId = MessageId::new(0x06, 0x00);
pub const CFG_MSG: MessageId = MessageId::new(0x06, 0x01);
pub const CFG_RST: MessageId = MessageId::new(0x06, 0x04);
pub const CFG_NAV5: MessageId = MessageId::new(0x06, 0x24);
pub const CFG_VALSET: MessageId = MessageId::new(0x06, 0x8a);

/// USB port identifier in CFG-PRT.
const PORT_USB: u8 = 3;
/// Index of the USB port in the CFG-MSG per-port rate array.
const CFG_MSG_USB_RATE: usize = 3;
/// Automotive platform model in CFG-NAV5.
const DYN_MODEL_AUTOMOTIVE: u8 = 4;
/// CFG-VALSET layer bit for the RAM layer.
const LAYER_RAM: u8 = 0x01;

/// Interference detection enable (bool).
const KEY_ITFM_ENABLE: u32 = 0x1041_000d;
/// Antenna setting for interference detection (enum, 2 = active).
const KEY_ITFM_ANTSETTING: u32 = 0x2041_0010;
const ANTENNA_ACTIVE: u8 = 2;

/// One named configuration command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Human-readable name used in logs and errors
    pub name: &'static str,
    pub frame: Frame,
}

impl Command {
    fn new(name: &'static str, message: MessageId, payload: Vec<u8>) -> Result<Self> {
        Ok(Self { name, frame: Frame::new(message, payload)? })
    }
}

/// Hardware watchdog reset with a hot start.
pub fn reset() -> Result<Command> {
    // navBbrMask 0x0000 keeps all battery-backed data
    let nav_bbr_mask = 0u16.to_le_bytes();
    let reset_mode = 0x04;
    Command::new("reset", CFG_RST, vec![nav_bbr_mask[0], nav_bbr_mask[1], reset_mode, 0x00])
}

/// Accept UBX and NMEA on USB but only output UBX.
pub fn disable_nmea_output() -> Result<Command> {
    let mut payload = vec![0u8; 20];
    payload[0] = PORT_USB;
    payload[12..14].copy_from_slice(&0x0003u16.to_le_bytes());
    payload[14..16].copy_from_slice(&0x0001u16.to_le_bytes());
    Command::new("disable NMEA output", CFG_PRT, payload)
}

/// Enable interference detection with an active antenna, in RAM.
pub fn enable_interference_detection() -> Result<Command> {
    let mut payload = vec![0x00, LAYER_RAM, 0x00, 0x00];
    payload.extend_from_slice(&KEY_ITFM_ENABLE.to_le_bytes());
    payload.push(0x01);
    payload.extend_from_slice(&KEY_ITFM_ANTSETTING.to_le_bytes());
    payload.push(ANTENNA_ACTIVE);
    Command::new("enable interference detection", CFG_VALSET, payload)
}

/// Select the automotive dynamic platform model.
pub fn automotive_dynamics() -> Result<Command> {
    let mut payload = vec![0u8; 36];
    // Mask bit 0: apply dynamic model
    payload[0..2].copy_from_slice(&0x0001u16.to_le_bytes());
    payload[2] = DYN_MODEL_AUTOMOTIVE;
    Command::new("automotive dynamic model", CFG_NAV5, payload)
}

/// Output `message` on USB every `rate` navigation epochs.
pub fn enable_message(name: &'static str, message: MessageId, rate: u8) -> Result<Command> {
    let mut payload = vec![message.class, message.id, 0, 0, 0, 0, 0, 0];
    payload[2 + CFG_MSG_USB_RATE] = rate;
    Command::new(name, CFG_MSG, payload)
}

/// Startup commands, in the order they are sent.
pub fn catalogue(rate: u8) -> Result<Vec<Command>> {
    Ok(vec![
        disable_nmea_output()?,
        enable_interference_detection()?,
        automotive_dynamics()?,
        enable_message("enable NAV-PVT", NAV_PVT, rate)?,
        enable_message("enable NAV-SAT", NAV_SAT, rate)?,
        enable_message("enable NAV-SIG", NAV_SIG, rate)?,
        enable_message("enable MON-RF", MON_RF, rate)?,
        enable_message("enable MON-SPAN", MON_SPAN, rate)?,
    ])
}
