//! End-to-end: handshake, decode, aggregate and fan out over a scripted
//! receiver.

mod common;

use common::*;
use futures::StreamExt;
use jammon::link::Link;
use jammon::protocol::commands::{CFG_MSG, CFG_NAV5, CFG_PRT, CFG_VALSET};
use jammon::{BandMode, Monitor, MonitorConfig};
use std::time::Duration;
use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf, duplex};
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

fn link(host: DuplexStream) -> Link<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>> {
    let (reader, writer) = tokio::io::split(host);
    Link::new(reader, writer)
}

fn quiet_config(band_mode: BandMode) -> MonitorConfig {
    let mut config = MonitorConfig { band_mode, ..Default::default() };
    config.csv.enabled = false;
    config.udp.enabled = false;
    config
}

#[tokio::test]
async fn snapshot_reaches_csv_and_udp() {
    let _ = tracing_subscriber::fmt::try_init();

    let logs = tempfile::tempdir().unwrap();
    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let mut config = MonitorConfig { band_mode: BandMode::Single, ..Default::default() };
    config.csv.directory = logs.path().to_path_buf();
    config.udp.host = "127.0.0.1".to_string();
    config.udp.port = receiver.local_addr().unwrap().port();

    let (mut device, host) = duplex(16 * 1024);
    let (done_tx, done_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        acknowledge_startup(&mut device).await;
        device.write_all(&epoch(1, 42)).await.unwrap();
        // Stay connected until the test has seen the datagram
        let _ = done_rx.await;
    });

    let monitor =
        Monitor::with_link(link(host), &config, Monitor::pipeline_for(&config)).await.unwrap();

    let mut snapshots = Box::pin(monitor.snapshots());
    let snapshot = tokio::time::timeout(Duration::from_secs(5), snapshots.next())
        .await
        .expect("no snapshot within 5 s")
        .expect("snapshot stream ended early");

    assert_eq!(snapshot.sequence, 1);
    assert_eq!(snapshot.position.timestamp, 1_717_243_200);
    assert_eq!(snapshot.satellites.used_in_nav, 9);
    assert_eq!(snapshot.signals.locked, [1, 1]);
    assert_eq!(snapshot.rf.bands[0].jam_cw, 42);

    let mut buf = [0u8; 4096];
    let (len, _) = tokio::time::timeout(Duration::from_secs(5), receiver.recv_from(&mut buf))
        .await
        .expect("no datagram within 5 s")
        .unwrap();
    let value = rmpv::decode::read_value(&mut &buf[..len]).unwrap();
    let map = value.as_map().unwrap();
    assert_eq!(map.len(), 7);
    assert_eq!(map[0].1.as_u64(), Some(1_717_243_200));
    let jamming: Vec<u64> =
        map[5].1.as_array().unwrap().iter().map(|v| v.as_u64().unwrap()).collect();
    assert_eq!(jamming, vec![42, 1]);

    let log = std::fs::read_to_string(logs.path().join("log-jammon-2024-06-01.csv")).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.starts_with("1717243200,Sat Jun  1 12:00:00 2024,51.50000,-0.10000,100.0,"));
    assert!(logs.path().join("spectruml1-jammon-2024-06-01.csv").exists());

    done_tx.send(()).unwrap();
    let report = monitor.join().await.unwrap();
    assert_eq!(report.frames, 5);
    assert_eq!(report.snapshots, 1);
}

#[tokio::test]
async fn startup_commands_run_in_order() {
    let config = quiet_config(BandMode::Single);
    let (mut device, host) = duplex(16 * 1024);
    let script = tokio::spawn(async move { acknowledge_startup(&mut device).await });

    let monitor =
        Monitor::with_link(link(host), &config, Monitor::pipeline_for(&config)).await.unwrap();
    let seen = script.await.unwrap();

    assert_eq!(&seen[..3], &[CFG_PRT, CFG_VALSET, CFG_NAV5]);
    assert!(seen[3..].iter().all(|message| *message == CFG_MSG));
    assert_eq!(seen.len(), STARTUP_COMMANDS);

    // The device end is gone, so the loop sees end of stream
    let report = monitor.join().await.unwrap();
    assert_eq!(report.frames, 0);
}

#[tokio::test(start_paused = true)]
async fn one_snapshot_per_epoch() {
    let config = quiet_config(BandMode::Dual);
    let (mut device, host) = duplex(16 * 1024);
    tokio::spawn(async move {
        acknowledge_startup(&mut device).await;
        for jam_cw in [10, 200] {
            device.write_all(&epoch(2, jam_cw)).await.unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    });

    let monitor =
        Monitor::with_link(link(host), &config, Monitor::pipeline_for(&config)).await.unwrap();
    let snapshots: Vec<_> = monitor.snapshots().collect().await;

    let sequences: Vec<u64> = snapshots.iter().map(|s| s.sequence).collect();
    assert_eq!(sequences, vec![1, 2]);
    let jamming: Vec<u8> = snapshots.iter().map(|s| s.rf.bands[1].jam_cw).collect();
    assert_eq!(jamming, vec![10, 200]);
    assert!(snapshots.iter().all(|s| s.band_count() == 2));

    let report = monitor.join().await.unwrap();
    assert_eq!(report.frames, 10);
}

#[tokio::test]
async fn band_mode_mismatch_never_emits() {
    // Monitor expects two bands but the receiver reports one
    let config = quiet_config(BandMode::Dual);
    let (mut device, host) = duplex(16 * 1024);
    tokio::spawn(async move {
        acknowledge_startup(&mut device).await;
        device.write_all(&epoch(1, 0)).await.unwrap();
    });

    let monitor =
        Monitor::with_link(link(host), &config, Monitor::pipeline_for(&config)).await.unwrap();
    let snapshots: Vec<_> = monitor.snapshots().collect().await;
    assert!(snapshots.is_empty());

    let report = monitor.join().await.unwrap();
    assert_eq!(report.pipeline.rejected, 2);
    assert_eq!(report.pipeline.decoded, 3);
}
