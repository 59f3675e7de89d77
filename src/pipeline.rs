//! Frame to snapshot pipeline
//!
//! Owns the registry, the aggregator and the sinks. One call to
//! [`Pipeline::ingest`] performs dispatch, the aggregator update, the
//! freshness check and sink fan-out as a single step, so a snapshot is never
//! assembled from a half-applied update.

use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::aggregator::{FreshnessPolicy, SnapshotAggregator};
use crate::messages::{DecodeContext, MessageRegistry};
use crate::sinks::SnapshotSink;
use crate::types::{BandMode, Frame, Snapshot};

/// Counters for what the pipeline has processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Frames handed to `ingest`
    pub frames: u64,
    /// Frames decoded into a field group
    pub decoded: u64,
    /// Frames of unregistered message types
    pub ignored: u64,
    /// Frames skipped on a schema mismatch
    pub rejected: u64,
    /// Snapshots emitted
    pub emitted: u64,
    /// Sink calls that returned an error
    pub sink_failures: u64,
}

/// Decode, aggregate and fan out.
pub struct Pipeline {
    registry: MessageRegistry,
    context: DecodeContext,
    aggregator: SnapshotAggregator,
    sinks: Vec<Box<dyn SnapshotSink>>,
    stats: PipelineStats,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sinks: Vec<&str> = self.sinks.iter().map(|sink| sink.name()).collect();
        f.debug_struct("Pipeline")
            .field("context", &self.context)
            .field("policy", &self.aggregator.policy())
            .field("sinks", &sinks)
            .field("stats", &self.stats)
            .finish()
    }
}

impl Pipeline {
    /// Pipeline over the standard registry, with no sinks.
    pub fn new(band_mode: BandMode, policy: FreshnessPolicy) -> Self {
        Self::with_registry(MessageRegistry::standard(), band_mode, policy)
    }

    pub fn with_registry(
        registry: MessageRegistry,
        band_mode: BandMode,
        policy: FreshnessPolicy,
    ) -> Self {
        Self {
            registry,
            context: DecodeContext::new(band_mode),
            aggregator: SnapshotAggregator::new(band_mode, policy),
            sinks: Vec::new(),
            stats: PipelineStats::default(),
        }
    }

    /// Register a sink; sinks run in registration order.
    pub fn add_sink(&mut self, sink: impl SnapshotSink) -> &mut Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|sink| sink.name()).collect()
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn band_mode(&self) -> BandMode {
        self.context.band_mode
    }

    /// Process one frame that arrived at `now`.
    ///
    /// Returns the snapshot if this arrival triggered one.
    pub fn ingest(&mut self, frame: &Frame, now: Instant) -> Option<Arc<Snapshot>> {
        self.stats.frames += 1;

        let group = match self.registry.dispatch(frame, &self.context) {
            Ok(Some(group)) => group,
            Ok(None) => {
                trace!("Ignoring message {}", frame.message);
                self.stats.ignored += 1;
                return None;
            }
            Err(e) => {
                warn!("Skipping message {}: {}", frame.message, e);
                self.stats.rejected += 1;
                return None;
            }
        };

        self.stats.decoded += 1;
        debug!("Decoded {} from {} at {:?}", group.kind(), frame.message, now);

        let snapshot = Arc::new(self.aggregator.update(group, now)?);
        self.stats.emitted += 1;
        log_snapshot(&snapshot);

        for sink in &mut self.sinks {
            if let Err(e) = sink.accept(&snapshot) {
                self.stats.sink_failures += 1;
                warn!("Sink '{}' failed: {}", sink.name(), e);
            }
        }

        Some(snapshot)
    }
}

fn log_snapshot(snapshot: &Snapshot) {
    let position = &snapshot.position;
    let signals = &snapshot.signals;
    debug!(
        "Snapshot {}: t={} pos=({:.5}, {:.5}, {:.1} m) acc=(H {:.1} m, V {:.1} m) \
         acquired={:?} locked={:?} nav={}",
        snapshot.sequence,
        position.timestamp,
        position.latitude_deg(),
        position.longitude_deg(),
        position.height_m(),
        position.h_acc_m(),
        position.v_acc_m(),
        signals.acquired,
        signals.locked,
        snapshot.satellites.used_in_nav,
    );
    for (index, band) in snapshot.rf.bands.iter().enumerate() {
        debug!(
            "  L{}: agc={} noise={} jamming cw={}/255 bb={}/3",
            index + 1,
            band.agc,
            band.noise,
            band.jam_cw,
            band.jam_bb
        );
    }
}
