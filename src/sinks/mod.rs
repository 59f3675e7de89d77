//! Snapshot sinks
//!
//! A sink receives every emitted snapshot. Sink failures never stop
//! decoding: the pipeline logs them and moves on to the next sink.

mod csv;
mod udp;

pub use csv::CsvSink;
pub use udp::{DEFAULT_QUEUE_DEPTH, UdpSink};

use crate::Result;
use crate::types::Snapshot;

/// Consumer of emitted snapshots.
pub trait SnapshotSink: Send + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Handle one snapshot. Must not block on the network.
    fn accept(&mut self, snapshot: &Snapshot) -> Result<()>;
}

/// Adapts a closure into a sink.
///
/// ```rust
/// use jammon::sinks::{FnSink, SnapshotSink};
///
/// let mut count = 0u32;
/// let sink = FnSink::new("counter", move |_snapshot| count += 1);
/// assert_eq!(sink.name(), "counter");
/// ```
pub struct FnSink<F> {
    name: &'static str,
    callback: F,
}

impl<F> FnSink<F>
where
    F: FnMut(&Snapshot) + Send + 'static,
{
    pub fn new(name: &'static str, callback: F) -> Self {
        Self { name, callback }
    }
}

impl<F> SnapshotSink for FnSink<F>
where
    F: FnMut(&Snapshot) + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn accept(&mut self, snapshot: &Snapshot) -> Result<()> {
        (self.callback)(snapshot);
        Ok(())
    }
}
