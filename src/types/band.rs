//! Receiver band configuration

use serde::Deserialize;

/// Largest number of RF chains a supported receiver reports.
pub const MAX_BANDS: usize = 2;

/// Number of RF chains the receiver is expected to report.
///
/// Decides how many blocks MON-RF and MON-SPAN must carry and which
/// telemetry keys and CSV columns are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandMode {
    /// One RF chain (L1 only)
    #[default]
    Single,

    /// Two RF chains (L1 and L2)
    Dual,
}

impl BandMode {
    /// Number of per-band blocks expected in RF and spectrum messages.
    pub fn block_count(self) -> usize {
        match self {
            BandMode::Single => 1,
            BandMode::Dual => MAX_BANDS,
        }
    }
}
