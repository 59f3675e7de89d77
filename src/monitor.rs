//! Monitor lifecycle: open, configure, stream
//!
//! [`Monitor::start`] owns the whole startup sequence: open the receiver,
//! optionally reset it, run the configuration handshake (any command that is
//! not acknowledged aborts startup), then hand the link to the decode loop.

use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::driver::{Driver, DriverReport, Termination};
use crate::link::{Link, open_device};
use crate::pipeline::Pipeline;
use crate::protocol::commands;
use crate::providers::LinkProvider;
use crate::sinks::{CsvSink, UdpSink};
use crate::types::Snapshot;
use crate::{JammonError, Result};

/// A configured receiver feeding the decode loop.
pub struct Monitor {
    snapshots: watch::Receiver<Option<Arc<Snapshot>>>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<DriverReport>>,
}

impl Monitor {
    /// Open the configured device and start monitoring.
    ///
    /// Sinks are created from `config`. Must be called from within a Tokio
    /// runtime.
    pub async fn start(config: &MonitorConfig) -> Result<Self> {
        config.validate()?;
        let device = config
            .device
            .as_deref()
            .ok_or_else(|| JammonError::config("no receiver device configured"))?;

        let mut link = open_device(device).await?;
        info!("Opened receiver {}", device.display());

        if config.reset {
            let reset = commands::reset()?;
            config.handshake().send_unconfirmed(&mut link, &reset.frame).await?;
            drop(link);

            info!("Receiver reset, waiting {:?} before reopening", config.reset_settle());
            tokio::time::sleep(config.reset_settle()).await;
            link = open_device(device).await?;
        }

        let pipeline = Self::pipeline_for(config);
        Self::with_link(link, config, pipeline).await
    }

    /// Configure the receiver behind `link` and start the decode loop.
    ///
    /// No reset is sent; `config.reset` only applies to [`Monitor::start`].
    pub async fn with_link<R, W>(
        mut link: Link<R, W>,
        config: &MonitorConfig,
        pipeline: Pipeline,
    ) -> Result<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        config.validate()?;

        let catalogue = commands::catalogue(config.message_rate)?;
        config.handshake().configure(&mut link, &catalogue).await?;

        let provider = LinkProvider::new(link, config.frame_capacity);
        let channels = Driver::spawn(provider, pipeline);
        info!("Monitoring started ({:?} band mode)", config.band_mode);

        Ok(Self {
            snapshots: channels.snapshots,
            cancel: channels.cancel,
            handle: Some(channels.handle),
        })
    }

    /// Pipeline with the sinks enabled in `config`.
    pub fn pipeline_for(config: &MonitorConfig) -> Pipeline {
        let mut pipeline = Pipeline::new(config.band_mode, config.freshness());

        if config.csv.enabled {
            debug!("CSV logging to {}", config.csv.directory.display());
            pipeline.add_sink(CsvSink::new(&config.csv.directory));
        }
        if config.udp.enabled {
            debug!("UDP telemetry to {}:{}", config.udp.host, config.udp.port);
            pipeline.add_sink(UdpSink::spawn(config.udp.host.clone(), config.udp.port));
        }
        pipeline
    }

    /// Stream of emitted snapshots.
    ///
    /// Yields the most recent snapshot first if one exists, then the latest
    /// one after each change; a slow consumer skips intermediate snapshots.
    /// Ends once the decode loop has stopped and its last snapshot was seen.
    pub fn snapshots(&self) -> impl Stream<Item = Arc<Snapshot>> + 'static {
        WatchStream::new(self.snapshots.clone()).filter_map(|snapshot| async move { snapshot })
    }

    /// Most recent snapshot, if any.
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.snapshots.borrow().clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Ask the decode loop to stop.
    pub fn shutdown(&self) {
        debug!("Monitor shutdown requested");
        self.cancel.cancel();
    }

    /// Wait for the decode loop to stop.
    ///
    /// A transport failure that ended the loop is returned as the error.
    pub async fn join(mut self) -> Result<DriverReport> {
        let Some(handle) = self.handle.take() else {
            return Err(JammonError::transport("decode loop already joined"));
        };

        let mut report = handle
            .await
            .map_err(|e| JammonError::transport(format!("decode loop task failed: {}", e)))?;

        match std::mem::replace(&mut report.termination, Termination::EndOfStream) {
            Termination::Transport(e) => Err(e),
            termination => {
                report.termination = termination;
                Ok(report)
            }
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        if self.handle.is_some() && !self.cancel.is_cancelled() {
            warn!("Monitor dropped without shutdown, cancelling decode loop");
        }
        self.cancel.cancel();
    }
}
