//! Driver spawns and manages the decode loop task

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::JammonError;
use crate::pipeline::{Pipeline, PipelineStats};
use crate::provider::FrameProvider;
use crate::types::Snapshot;

/// Why the decode loop stopped.
#[derive(Debug)]
pub enum Termination {
    /// The cancellation token fired
    Cancelled,
    /// The provider reported end of stream
    EndOfStream,
    /// The provider failed
    Transport(JammonError),
}

/// Summary returned when the decode loop ends.
#[derive(Debug)]
pub struct DriverReport {
    pub frames: u64,
    pub snapshots: u64,
    pub pipeline: PipelineStats,
    pub termination: Termination,
}

impl DriverReport {
    /// Whether the loop ended on request rather than on its own.
    pub fn was_cancelled(&self) -> bool {
        matches!(self.termination, Termination::Cancelled)
    }
}

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Receiver for the latest emitted snapshot; closed when the loop ends
    pub snapshots: watch::Receiver<Option<Arc<Snapshot>>>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    /// Resolves once the loop has stopped
    pub handle: JoinHandle<DriverReport>,
}

/// Driver spawns and manages the decode loop
///
/// The spawned task owns both the provider and the pipeline, so frames are
/// decoded, aggregated and fanned out strictly one at a time.
pub struct Driver;

impl Driver {
    /// Spawn the decode loop for the given provider
    pub fn spawn<P>(provider: P, pipeline: Pipeline) -> DriverChannels
    where
        P: FrameProvider,
    {
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let cancel_loop = cancel.clone();

        let handle = tokio::spawn(async move {
            Self::decode_loop(provider, pipeline, snapshot_tx, cancel_loop).await
        });

        DriverChannels { snapshots: snapshot_rx, cancel, handle }
    }

    async fn decode_loop<P>(
        mut provider: P,
        mut pipeline: Pipeline,
        snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
        cancel: CancellationToken,
    ) -> DriverReport
    where
        P: FrameProvider,
    {
        info!("Decode loop started");
        let mut frames = 0u64;
        let mut snapshots = 0u64;

        let termination = loop {
            // Reads are cancel safe, so a half-received frame is never lost
            // to a select that picked the other branch.
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Decode loop cancelled");
                    break Termination::Cancelled;
                }
                result = provider.next_frame() => result,
            };

            match result {
                Ok(Some(frame)) => {
                    frames += 1;
                    trace!("Frame {}: {} ({} bytes)", frames, frame.message, frame.length());

                    if let Some(snapshot) = pipeline.ingest(&frame, Instant::now()) {
                        snapshots += 1;
                        // No receivers left is fine; sinks still run
                        let _ = snapshot_tx.send(Some(snapshot));
                    }
                }
                Ok(None) => {
                    info!("Frame stream ended after {} frames", frames);
                    break Termination::EndOfStream;
                }
                Err(e) => {
                    error!("Receiver link failed: {}", e);
                    break Termination::Transport(e);
                }
            }
        };

        debug!("Pipeline stats at exit: {:?}", pipeline.stats());
        info!("Decode loop ended ({} frames, {} snapshots)", frames, snapshots);

        DriverReport { frames, snapshots, pipeline: pipeline.stats(), termination }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::FreshnessPolicy;
    use crate::provider::FrameList;
    use crate::test_utils::epoch_frames;
    use crate::types::{BandMode, Frame};
    use crate::Result;

    struct FailingProvider {
        remaining: Vec<Frame>,
    }

    #[async_trait::async_trait]
    impl FrameProvider for FailingProvider {
        async fn next_frame(&mut self) -> Result<Option<Frame>> {
            match self.remaining.pop() {
                Some(frame) => Ok(Some(frame)),
                None => Err(JammonError::transport("device unplugged")),
            }
        }
    }

    struct PendingProvider;

    #[async_trait::async_trait]
    impl FrameProvider for PendingProvider {
        async fn next_frame(&mut self) -> Result<Option<Frame>> {
            std::future::pending().await
        }
    }

    fn pipeline(band_mode: BandMode) -> Pipeline {
        Pipeline::new(band_mode, FreshnessPolicy::default())
    }

    #[tokio::test]
    async fn end_of_stream_keeps_last_snapshot_and_closes() {
        let channels =
            Driver::spawn(FrameList::new(epoch_frames(BandMode::Dual)), pipeline(BandMode::Dual));
        let mut snapshots = channels.snapshots;

        let report = channels.handle.await.unwrap();
        assert!(matches!(report.termination, Termination::EndOfStream));
        assert_eq!((report.frames, report.snapshots), (5, 1));
        assert_eq!(report.pipeline.emitted, 1);

        let last = snapshots.borrow_and_update().clone().unwrap();
        assert_eq!(last.sequence, 1);
        assert!(snapshots.changed().await.is_err());
    }

    #[tokio::test]
    async fn transport_error_ends_the_loop() {
        let provider = FailingProvider { remaining: epoch_frames(BandMode::Single) };
        let channels = Driver::spawn(provider, pipeline(BandMode::Single));

        let report = channels.handle.await.unwrap();
        match report.termination {
            Termination::Transport(e) => assert!(e.is_fatal()),
            other => panic!("Expected transport termination, got {:?}", other),
        }
        assert_eq!(report.frames, 5);
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_pending_read() {
        let channels = Driver::spawn(PendingProvider, pipeline(BandMode::Single));
        channels.cancel.cancel();

        let report = channels.handle.await.unwrap();
        assert!(report.was_cancelled());
        assert_eq!(report.frames, 0);
    }
}
