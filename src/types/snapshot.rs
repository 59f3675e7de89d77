//! Fused per-epoch snapshot

use super::band::BandMode;
use super::groups::{PositionTime, RfStatus, SatelliteUsage, SignalCounts, Spectrum};

/// Latest value of every tracked group at the moment they were all fresh.
///
/// Immutable once built. The aggregator hands it to sinks and keeps no
/// reference to it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Band layout the snapshot was decoded under
    pub band_mode: BandMode,

    /// Emission counter, starting at 1
    pub sequence: u64,

    pub rf: RfStatus,
    pub spectrum: Spectrum,
    pub position: PositionTime,
    pub satellites: SatelliteUsage,
    pub signals: SignalCounts,
}

impl Snapshot {
    /// Number of bands carried, as configured.
    pub fn band_count(&self) -> usize {
        self.band_mode.block_count()
    }

    /// Whether the snapshot carries a valid GNSS time.
    pub fn time_valid(&self) -> bool {
        self.position.time_valid
    }
}
