//! GNSS jamming and interference monitor.
//!
//! Jammon configures a u-blox receiver over its UBX binary protocol, decodes
//! the navigation and RF monitoring messages it streams back, and combines
//! them into time-coherent [`Snapshot`]s. Each snapshot is logged to daily
//! CSV files and sent as a MessagePack datagram over UDP.
//!
//! # Architecture
//!
//! - [`protocol`]: frame decoding, checksums, configuration commands and the
//!   acknowledgment handshake
//! - [`messages`]: the registry mapping message types to field extractors
//! - [`aggregator`]: freshness-gated snapshot assembly
//! - [`sinks`] and [`encoder`]: CSV logs and UDP telemetry
//! - [`driver`] and [`monitor`]: the async decode loop and its lifecycle
//!
//! # Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use jammon::{Monitor, MonitorConfig};
//!
//! #[tokio::main]
//! async fn main() -> jammon::Result<()> {
//!     let config = MonitorConfig {
//!         device: Some("/dev/ttyACM0".into()),
//!         ..Default::default()
//!     };
//!     let monitor = Monitor::start(&config).await?;
//!
//!     let mut snapshots = std::pin::pin!(monitor.snapshots());
//!     while let Some(snapshot) = snapshots.next().await {
//!         println!("L1 jamming: {}/255", snapshot.rf.bands[0].jam_cw);
//!     }
//!
//!     monitor.join().await?;
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Wire protocol and decoding
pub mod link;
pub mod messages;
pub mod protocol;

// Aggregation and output
pub mod aggregator;
pub mod encoder;
pub mod pipeline;
pub mod sinks;

// Stream-based runtime
pub mod config;
pub mod driver;
pub mod monitor;
pub mod provider;
pub mod providers;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use aggregator::{FreshnessPolicy, SnapshotAggregator};
pub use config::MonitorConfig;
pub use monitor::Monitor;
pub use pipeline::Pipeline;
pub use provider::FrameProvider;
