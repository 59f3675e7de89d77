//! Freshness-gated snapshot aggregation
//!
//! Messages arrive at different rates and out of phase. The aggregator keeps
//! the latest value of each tracked group with its arrival time and emits a
//! [`Snapshot`] only when every group arrived within the freshness window of
//! the triggering arrival, and no snapshot was emitted within the minimum
//! re-emit interval.

use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

use crate::types::{BandMode, FieldGroup, GroupKind, Snapshot};

/// Default maximum age of a group relative to the triggering arrival.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_millis(900);
/// Default minimum spacing between emitted snapshots.
pub const DEFAULT_MIN_REEMIT: Duration = Duration::from_millis(900);

/// Timing rules for emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    /// A group is fresh while strictly younger than this
    pub window: Duration,
    /// Minimum time between two emits
    pub min_reemit: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self { window: DEFAULT_FRESHNESS_WINDOW, min_reemit: DEFAULT_MIN_REEMIT }
    }
}

impl FreshnessPolicy {
    pub fn new(window: Duration, min_reemit: Duration) -> Self {
        Self { window, min_reemit }
    }

    /// Whether a group received at `at` is still fresh at `now`.
    pub fn is_fresh(&self, at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(at) < self.window
    }

    /// Whether an emit at `now` respects the re-emit floor.
    pub fn may_emit(&self, last_emit: Option<Instant>, now: Instant) -> bool {
        match last_emit {
            None => true,
            Some(last) => now > last && now - last >= self.min_reemit,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    group: FieldGroup,
    at: Instant,
}

/// Owns the live per-group state between emits.
#[derive(Debug)]
pub struct SnapshotAggregator {
    band_mode: BandMode,
    policy: FreshnessPolicy,
    slots: [Option<Slot>; GroupKind::COUNT],
    last_emit: Option<Instant>,
    emitted: u64,
}

impl SnapshotAggregator {
    pub fn new(band_mode: BandMode, policy: FreshnessPolicy) -> Self {
        Self { band_mode, policy, slots: Default::default(), last_emit: None, emitted: 0 }
    }

    pub fn policy(&self) -> FreshnessPolicy {
        self.policy
    }

    /// Number of snapshots emitted so far.
    pub fn emitted_count(&self) -> u64 {
        self.emitted
    }

    /// Arrival time of the stored value of `kind`, if any.
    pub fn last_update(&self, kind: GroupKind) -> Option<Instant> {
        self.slots[kind.index()].as_ref().map(|slot| slot.at)
    }

    /// Whether every group has a value that is fresh at `now`.
    pub fn is_synchronized(&self, now: Instant) -> bool {
        self.slots
            .iter()
            .all(|slot| slot.as_ref().is_some_and(|slot| self.policy.is_fresh(slot.at, now)))
    }

    /// Replace the stored value of the group's kind, then emit if due.
    ///
    /// The stored value is overwritten unconditionally. Repeating an update
    /// with the same timestamp never emits twice.
    pub fn update(&mut self, group: FieldGroup, now: Instant) -> Option<Snapshot> {
        let kind = group.kind();
        self.slots[kind.index()] = Some(Slot { group, at: now });

        if !self.is_synchronized(now) {
            trace!("Update of {}: groups not synchronized", kind);
            return None;
        }
        if !self.policy.may_emit(self.last_emit, now) {
            trace!("Update of {}: inside re-emit interval", kind);
            return None;
        }

        let snapshot = self.assemble()?;
        self.last_emit = Some(now);
        self.emitted += 1;
        Some(snapshot)
    }

    fn assemble(&self) -> Option<Snapshot> {
        let mut rf = None;
        let mut spectrum = None;
        let mut position = None;
        let mut satellites = None;
        let mut signals = None;

        for slot in self.slots.iter().flatten() {
            match &slot.group {
                FieldGroup::RfStatus(value) => rf = Some(value.clone()),
                FieldGroup::Spectrum(value) => spectrum = Some(value.clone()),
                FieldGroup::PositionTime(value) => position = Some(*value),
                FieldGroup::SatelliteUsage(value) => satellites = Some(*value),
                FieldGroup::SignalCounts(value) => signals = Some(*value),
            }
        }

        Some(Snapshot {
            band_mode: self.band_mode,
            sequence: self.emitted + 1,
            rf: rf?,
            spectrum: spectrum?,
            position: position?,
            satellites: satellites?,
            signals: signals?,
        })
    }
}
