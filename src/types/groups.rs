//! Decoded field groups
//!
//! Each supported message decodes into exactly one [`FieldGroup`]. The
//! aggregator stores the latest group of every [`GroupKind`] and replaces it
//! wholesale on each arrival; groups are never merged field by field.

use chrono::{DateTime, Utc};

/// Number of bytes in one spectrum block.
pub const SPECTRUM_BINS: usize = 256;

/// Identifies one tracked field group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKind {
    RfStatus,
    Spectrum,
    PositionTime,
    SatelliteUsage,
    SignalCounts,
}

impl GroupKind {
    /// Number of tracked groups.
    pub const COUNT: usize = 5;

    /// Every group required before a snapshot can be emitted.
    pub const ALL: [GroupKind; Self::COUNT] = [
        GroupKind::RfStatus,
        GroupKind::Spectrum,
        GroupKind::PositionTime,
        GroupKind::SatelliteUsage,
        GroupKind::SignalCounts,
    ];

    /// Dense index into per-group storage.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            GroupKind::RfStatus => "rf-status",
            GroupKind::Spectrum => "spectrum",
            GroupKind::PositionTime => "position-time",
            GroupKind::SatelliteUsage => "satellite-usage",
            GroupKind::SignalCounts => "signal-counts",
        }
    }
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// RF front-end status of one band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RfBand {
    /// AGC monitor count
    pub agc: u16,
    /// Noise level per millisecond
    pub noise: u16,
    /// CW jamming indicator (0 = none, 255 = strong)
    pub jam_cw: u8,
    /// Broadband jamming state (0 = unknown, 1 = ok, 2 = warning, 3 = critical)
    pub jam_bb: u8,
}

/// RF status of every configured band, indexed by band.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RfStatus {
    pub bands: Vec<RfBand>,
}

/// One spectrum analyzer block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectrumBlock {
    /// Power per bin, in 0.25 dB units
    pub spectrum: [u8; SPECTRUM_BINS],
    /// Spectrum span in Hz
    pub span: u32,
    /// Bin resolution in Hz
    pub resolution: u32,
    /// Center frequency in Hz
    pub center: u32,
    /// Programmable gain in dB
    pub pga: u8,
}

impl Default for SpectrumBlock {
    fn default() -> Self {
        Self { spectrum: [0; SPECTRUM_BINS], span: 0, resolution: 0, center: 0, pga: 0 }
    }
}

/// Spectrum of every configured band, indexed by band.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spectrum {
    pub bands: Vec<SpectrumBlock>,
}

/// Position and time solution.
///
/// Raw integer units are kept as received; the accessors convert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionTime {
    /// Both the date and time-of-day validity bits were set
    pub time_valid: bool,
    /// UTC Unix seconds, 0 when the calendar fields do not form a date
    pub timestamp: i64,
    /// Latitude, 1e-7 degrees
    pub lat: i32,
    /// Longitude, 1e-7 degrees
    pub lon: i32,
    /// Height above ellipsoid, mm
    pub height: i32,
    /// Horizontal accuracy estimate, mm
    pub h_acc: u32,
    /// Vertical accuracy estimate, mm
    pub v_acc: u32,
}

impl PositionTime {
    pub fn latitude_deg(&self) -> f64 {
        f64::from(self.lat) / 1e7
    }

    pub fn longitude_deg(&self) -> f64 {
        f64::from(self.lon) / 1e7
    }

    pub fn height_m(&self) -> f64 {
        f64::from(self.height) / 1e3
    }

    pub fn h_acc_m(&self) -> f64 {
        f64::from(self.h_acc) / 1e3
    }

    pub fn v_acc_m(&self) -> f64 {
        f64::from(self.v_acc) / 1e3
    }

    /// GNSS time as a UTC datetime, when valid.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        if !self.time_valid {
            return None;
        }
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

/// Satellites used in the navigation solution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SatelliteUsage {
    pub used_in_nav: u8,
}

/// Acquired and locked signal counts per band (index 0 = L1, 1 = L2).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalCounts {
    pub acquired: [u8; 2],
    pub locked: [u8; 2],
}

/// One decoded message, ready for the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldGroup {
    RfStatus(RfStatus),
    Spectrum(Spectrum),
    PositionTime(PositionTime),
    SatelliteUsage(SatelliteUsage),
    SignalCounts(SignalCounts),
}

impl FieldGroup {
    pub fn kind(&self) -> GroupKind {
        match self {
            FieldGroup::RfStatus(_) => GroupKind::RfStatus,
            FieldGroup::Spectrum(_) => GroupKind::Spectrum,
            FieldGroup::PositionTime(_) => GroupKind::PositionTime,
            FieldGroup::SatelliteUsage(_) => GroupKind::SatelliteUsage,
            FieldGroup::SignalCounts(_) => GroupKind::SignalCounts,
        }
    }
}
