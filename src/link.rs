//! Byte-level link to the receiver
//!
//! Wraps an async reader and writer pair. On a real device both halves are
//! the same character device opened twice; in tests they are the two ends of
//! a `tokio::io::duplex`. Serial line settings (baud rate, raw mode) are
//! configured outside the monitor.

use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::types::Frame;
use crate::{JammonError, Result};

const READ_CHUNK: usize = 512;

/// Link to a device node.
///
/// On Unix the node is opened non-blocking and driven by the reactor, so a
/// pending read on a silent receiver is dropped as soon as the decode loop is
/// cancelled.
#[cfg(unix)]
pub type DeviceLink = Link<tokio::net::unix::pipe::Receiver, tokio::net::unix::pipe::Sender>;

/// Link to a device file.
#[cfg(not(unix))]
pub type DeviceLink = Link<tokio::fs::File, tokio::fs::File>;

/// Buffered byte source and frame sink.
#[derive(Debug)]
pub struct Link<R, W> {
    reader: R,
    writer: W,
    buffer: Box<[u8]>,
    position: usize,
    filled: usize,
    bytes_read: u64,
}

impl<R, W> Link<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            buffer: vec![0u8; READ_CHUNK].into_boxed_slice(),
            position: 0,
            filled: 0,
            bytes_read: 0,
        }
    }

    /// Read the next byte, suspending until one is available.
    ///
    /// Returns `Ok(None)` at end of stream. Cancel safe: dropping the future
    /// before it completes loses no buffered bytes.
    pub async fn read_byte(&mut self) -> Result<Option<u8>> {
        if self.position == self.filled {
            let n = self
                .reader
                .read(&mut self.buffer)
                .await
                .map_err(|e| JammonError::transport_io("read from receiver failed", e))?;
            if n == 0 {
                return Ok(None);
            }
            self.position = 0;
            self.filled = n;
            self.bytes_read += n as u64;
        }

        let byte = self.buffer[self.position];
        self.position += 1;
        Ok(Some(byte))
    }

    /// Write a complete frame and flush it.
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let bytes = frame.to_bytes();
        trace!("Writing {} bytes for message {}", bytes.len(), frame.message);

        self.writer
            .write_all(&bytes)
            .await
            .map_err(|e| JammonError::transport_io("write to receiver failed", e))?;
        self.writer
            .flush()
            .await
            .map_err(|e| JammonError::transport_io("flush to receiver failed", e))?;
        Ok(())
    }

    /// Drop bytes already received but not yet consumed.
    ///
    /// Returns how many bytes were discarded.
    pub fn discard_input(&mut self) -> usize {
        let dropped = self.filled - self.position;
        if dropped > 0 {
            trace!("Discarding {} stale input bytes", dropped);
        }
        self.position = 0;
        self.filled = 0;
        dropped
    }

    /// Total bytes received over the lifetime of the link.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

/// Open a receiver device for reading and writing.
///
/// The node must support readiness polling (a tty or a FIFO). Regular files
/// are rejected on Unix.
#[cfg(unix)]
pub async fn open_device(path: &Path) -> Result<DeviceLink> {
    use tokio::net::unix::pipe::OpenOptions;

    debug!("Opening receiver device {}", path.display());
    let cannot_open =
        |e: std::io::Error| JammonError::transport_io(format!("cannot open {}", path.display()), e);

    // Reader first: a FIFO refuses a non-blocking writer until it has one
    let reader = OpenOptions::new().unchecked(true).open_receiver(path).map_err(cannot_open)?;
    let writer = OpenOptions::new().unchecked(true).open_sender(path).map_err(cannot_open)?;

    Ok(Link::new(reader, writer))
}

/// Open a receiver device for reading and writing.
#[cfg(not(unix))]
pub async fn open_device(path: &Path) -> Result<DeviceLink> {
    use tokio::fs::{File, OpenOptions};

    debug!("Opening receiver device {}", path.display());
    let cannot_open =
        |e: std::io::Error| JammonError::transport_io(format!("cannot open {}", path.display()), e);

    let reader = File::open(path).await.map_err(cannot_open)?;
    let writer = OpenOptions::new().write(true).open(path).await.map_err(cannot_open)?;

    Ok(Link::new(reader, writer))
}
