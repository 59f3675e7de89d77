//! Best-effort UDP telemetry
//!
//! `accept` encodes on the caller's task and hands the datagram to a
//! background sender through a bounded queue, so the decode loop never waits
//! on name resolution or the network. The sender resolves the target for
//! every datagram and sends it once.

use std::net::SocketAddr;
use tokio::net::{UdpSocket, lookup_host};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::SnapshotSink;
use crate::encoder::TelemetryEncoder;
use crate::types::Snapshot;
use crate::{JammonError, Result};

/// Datagrams buffered before new ones are dropped.
pub const DEFAULT_QUEUE_DEPTH: usize = 16;

/// Sends each snapshot as one MessagePack datagram.
#[derive(Debug)]
pub struct UdpSink {
    encoder: TelemetryEncoder,
    queue: mpsc::Sender<Vec<u8>>,
    sender: JoinHandle<()>,
}

impl UdpSink {
    /// Start the background sender for `host:port`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(host: impl Into<String>, port: u16) -> Self {
        Self::with_queue_depth(host, port, DEFAULT_QUEUE_DEPTH)
    }

    pub fn with_queue_depth(host: impl Into<String>, port: u16, depth: usize) -> Self {
        let target = format!("{}:{}", host.into(), port);
        let (queue, datagrams) = mpsc::channel(depth.max(1));
        let sender = tokio::spawn(Self::sender_task(target, datagrams));

        Self { encoder: TelemetryEncoder::default(), queue, sender }
    }

    async fn sender_task(target: String, mut datagrams: mpsc::Receiver<Vec<u8>>) {
        debug!("UDP telemetry sender started for {}", target);

        while let Some(datagram) = datagrams.recv().await {
            match send_once(&target, &datagram).await {
                Ok(addr) => trace!("Sent {} byte datagram to {}", datagram.len(), addr),
                Err(e) => warn!("Telemetry datagram to {} not sent: {}", target, e),
            }
        }

        debug!("UDP telemetry sender stopped");
    }
}

impl Drop for UdpSink {
    fn drop(&mut self) {
        // Queued datagrams are best-effort; do not wait for them
        self.sender.abort();
    }
}

async fn send_once(target: &str, datagram: &[u8]) -> Result<SocketAddr> {
    let sink_error = |details: String| JammonError::Sink { sink: "udp", details };

    let addr = lookup_host(target)
        .await
        .map_err(|e| sink_error(format!("cannot resolve {}: {}", target, e)))?
        .next()
        .ok_or_else(|| sink_error(format!("{} resolved to no address", target)))?;

    let local = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let socket =
        UdpSocket::bind(local).await.map_err(|e| sink_error(format!("bind failed: {}", e)))?;
    socket.send_to(datagram, addr).await.map_err(|e| sink_error(format!("send failed: {}", e)))?;

    Ok(addr)
}

impl SnapshotSink for UdpSink {
    fn name(&self) -> &'static str {
        "udp"
    }

    fn accept(&mut self, snapshot: &Snapshot) -> Result<()> {
        let datagram = self.encoder.encode_to_vec(snapshot)?;

        self.queue.try_send(datagram).map_err(|e| {
            let details = match e {
                mpsc::error::TrySendError::Full(_) => "queue full, datagram dropped",
                mpsc::error::TrySendError::Closed(_) => "sender stopped, datagram dropped",
            };
            JammonError::Sink { sink: "udp", details: details.to_string() }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{FreshnessPolicy, SnapshotAggregator};
    use crate::messages::{DecodeContext, MessageRegistry};
    use crate::test_utils::epoch_frames;
    use crate::types::BandMode;
    use std::time::Duration;
    use tokio::time::Instant;

    fn emitted_snapshot() -> Snapshot {
        let registry = MessageRegistry::standard();
        let context = DecodeContext::new(BandMode::Single);
        let mut aggregator = SnapshotAggregator::new(BandMode::Single, FreshnessPolicy::default());
        let now = Instant::now();

        epoch_frames(BandMode::Single)
            .iter()
            .filter_map(|frame| registry.dispatch(frame, &context).unwrap())
            .filter_map(|group| aggregator.update(group, now))
            .last()
            .unwrap()
    }

    #[tokio::test]
    async fn delivers_encoded_snapshot() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = receiver.local_addr().unwrap().port();
        let mut sink = UdpSink::spawn("127.0.0.1", port);
        let snapshot = emitted_snapshot();

        sink.accept(&snapshot).unwrap();

        let mut buf = [0u8; 4096];
        let (len, _) = tokio::time::timeout(Duration::from_secs(5), receiver.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let expected = TelemetryEncoder::default().encode_to_vec(&snapshot).unwrap();
        assert_eq!(&buf[..len], &expected[..]);
    }

    #[tokio::test]
    async fn bad_target_is_a_sink_error() {
        let error = send_once("no-port-here", &[1, 2, 3]).await.unwrap_err();
        assert_eq!(error.class(), crate::ErrorClass::Sink);
    }

    #[tokio::test]
    async fn full_queue_drops_datagrams() {
        let (queue, _datagrams) = mpsc::channel(1);
        let mut sink = UdpSink {
            encoder: TelemetryEncoder::default(),
            queue,
            sender: tokio::spawn(async {}),
        };
        let snapshot = emitted_snapshot();

        assert!(sink.accept(&snapshot).is_ok());
        let error = sink.accept(&snapshot).unwrap_err();
        assert!(error.to_string().contains("queue full"));
        assert!(!error.is_fatal());
    }
}
