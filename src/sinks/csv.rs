//! Daily CSV logs
//!
//! One snapshot record per line in `log-jammon-YYYY-MM-DD.csv`, and one
//! spectrum record per band in `spectruml<N>-jammon-YYYY-MM-DD.csv`. The
//! date comes from the GNSS time (UTC), so snapshots without a valid time
//! are not logged.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::trace;

use super::SnapshotSink;
use crate::types::{Snapshot, SpectrumBlock};
use crate::{JammonError, Result};

/// Appends snapshot and spectrum records to date-stamped files.
#[derive(Debug, Clone)]
pub struct CsvSink {
    directory: PathBuf,
}

impl CsvSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the snapshot log for `date`.
    pub fn log_path(&self, date: &DateTime<Utc>) -> PathBuf {
        self.directory.join(date.format("log-jammon-%Y-%m-%d.csv").to_string())
    }

    /// Path of the spectrum log of band `index` (0-based) for `date`.
    pub fn spectrum_path(&self, index: usize, date: &DateTime<Utc>) -> PathBuf {
        let name = format!("spectruml{}-jammon-{}.csv", index + 1, date.format("%Y-%m-%d"));
        self.directory.join(name)
    }
}

impl SnapshotSink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn accept(&mut self, snapshot: &Snapshot) -> Result<()> {
        let Some(date) = snapshot.position.datetime() else {
            trace!("Snapshot {} has no valid time, not logged", snapshot.sequence);
            return Ok(());
        };

        blocking(|| -> Result<()> {
            append_line(&self.log_path(&date), &snapshot_record(snapshot, &date))?;

            let timestamp = snapshot.position.timestamp;
            let bands = snapshot.spectrum.bands.iter().take(snapshot.band_count());
            for (index, block) in bands.enumerate() {
                append_line(&self.spectrum_path(index, &date), &spectrum_record(timestamp, block))?;
            }
            Ok(())
        })
    }
}

/// Run file I/O on the calling thread, first handing its other tasks to
/// another worker when the runtime has one.
///
/// A single-threaded runtime (and plain threads) just run `f`; the appends
/// are short and at most once per snapshot.
fn blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| JammonError::file_error(path.to_path_buf(), e))?;
    file.write_all(line.as_bytes()).map_err(|e| JammonError::file_error(path.to_path_buf(), e))
}

/// `ts,ctime,lat,lon,alt,hAcc,vAcc,acqL1,acqL2,lockL1,lockL2,nav,agc,noise,cw,bb[,agc2,noise2,cw2,bb2]`
pub(crate) fn snapshot_record(snapshot: &Snapshot, date: &DateTime<Utc>) -> String {
    let position = &snapshot.position;
    let signals = &snapshot.signals;

    let mut line = format!(
        "{},{},{:.5},{:.5},{:.1},{:.1},{:.1},{},{},{},{},{}",
        position.timestamp,
        date.format("%a %b %e %H:%M:%S %Y"),
        position.latitude_deg(),
        position.longitude_deg(),
        position.height_m(),
        position.h_acc_m(),
        position.v_acc_m(),
        signals.acquired[0],
        signals.acquired[1],
        signals.locked[0],
        signals.locked[1],
        snapshot.satellites.used_in_nav,
    );
    for band in snapshot.rf.bands.iter().take(snapshot.band_count()) {
        let _ = write!(line, ",{},{},{},{}", band.agc, band.noise, band.jam_cw, band.jam_bb);
    }
    line.push('\n');
    line
}

/// `ts,span,res,center,pga,"<512 hex digits>"`
pub(crate) fn spectrum_record(timestamp: i64, block: &SpectrumBlock) -> String {
    let mut hex = String::with_capacity(block.spectrum.len() * 2);
    for byte in &block.spectrum {
        let _ = write!(hex, "{:02x}", byte);
    }
    format!(
        "{},{},{},{},{},\"{}\"\n",
        timestamp, block.span, block.resolution, block.center, block.pga, hex
    )
}
