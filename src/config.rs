//! Monitor configuration
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration. The binary loads an optional file and then applies its
//! command-line flags on top.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregator::{DEFAULT_FRESHNESS_WINDOW, DEFAULT_MIN_REEMIT, FreshnessPolicy};
use crate::messages::mon_span;
use crate::protocol::{
    DEFAULT_ACK_DEADLINE, DEFAULT_FRAME_CAPACITY, DEFAULT_MAX_ATTEMPTS, Handshake,
};
use crate::types::{BandMode, FRAME_OVERHEAD, MAX_BANDS};
use crate::{JammonError, Result};

pub const DEFAULT_UDP_HOST: &str = "localhost";
pub const DEFAULT_UDP_PORT: u16 = 44333;
/// Time the receiver needs to come back after a reset.
pub const DEFAULT_RESET_SETTLE: Duration = Duration::from_secs(5);

/// Smallest frame capacity that still fits a dual-band spectrum frame.
pub const MIN_FRAME_CAPACITY: usize = mon_span::SHAPE.expected_len(MAX_BANDS) + FRAME_OVERHEAD;

/// Runtime configuration of the monitor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Receiver device node; required to start
    pub device: Option<PathBuf>,
    pub band_mode: BandMode,
    /// Send a receiver reset before configuring
    pub reset: bool,
    pub reset_settle_ms: u64,
    pub freshness_ms: u64,
    pub reemit_ms: u64,
    pub handshake_attempts: usize,
    pub ack_deadline_ms: u64,
    pub frame_capacity: usize,
    /// Output rate (per navigation epoch) requested for each message
    pub message_rate: u8,
    pub csv: CsvConfig,
    pub udp: UdpConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsvConfig {
    pub enabled: bool,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UdpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            device: None,
            band_mode: BandMode::Single,
            reset: false,
            reset_settle_ms: millis(DEFAULT_RESET_SETTLE),
            freshness_ms: millis(DEFAULT_FRESHNESS_WINDOW),
            reemit_ms: millis(DEFAULT_MIN_REEMIT),
            handshake_attempts: DEFAULT_MAX_ATTEMPTS,
            ack_deadline_ms: millis(DEFAULT_ACK_DEADLINE),
            frame_capacity: DEFAULT_FRAME_CAPACITY,
            message_rate: 1,
            csv: CsvConfig::default(),
            udp: UdpConfig::default(),
        }
    }
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self { enabled: true, directory: PathBuf::from(".") }
    }
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self { enabled: true, host: DEFAULT_UDP_HOST.to_string(), port: DEFAULT_UDP_PORT }
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

impl MonitorConfig {
    /// Load a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| JammonError::config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
            .map_err(|e| JammonError::config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a defaulted struct
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(text).map_err(|e| JammonError::config(e.to_string()))
    }

    /// Check invariants that deserialization cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.freshness_ms == 0 {
            return Err(JammonError::config("freshness window must be greater than zero"));
        }
        if self.frame_capacity < MIN_FRAME_CAPACITY {
            return Err(JammonError::config(format!(
                "frame capacity of {} bytes cannot hold a {} byte spectrum frame",
                self.frame_capacity, MIN_FRAME_CAPACITY
            )));
        }
        if self.handshake_attempts == 0 {
            return Err(JammonError::config("handshake attempt bound must be greater than zero"));
        }
        if self.message_rate == 0 {
            return Err(JammonError::config("message rate 0 would disable every message"));
        }
        if self.udp.enabled && self.udp.host.is_empty() {
            return Err(JammonError::config("UDP telemetry enabled without a host"));
        }
        Ok(())
    }

    pub fn freshness(&self) -> FreshnessPolicy {
        FreshnessPolicy::new(
            Duration::from_millis(self.freshness_ms),
            Duration::from_millis(self.reemit_ms),
        )
    }

    pub fn handshake(&self) -> Handshake {
        Handshake {
            max_attempts: self.handshake_attempts,
            ack_deadline: Duration::from_millis(self.ack_deadline_ms),
        }
    }

    pub fn reset_settle(&self) -> Duration {
        Duration::from_millis(self.reset_settle_ms)
    }
}
