//! Command acknowledgment handshake
//!
//! Each configuration command is written to the receiver, then the input is
//! scanned byte by byte for the 8-byte ACK envelope naming that command. The
//! scan skips over unrelated frames and noise, and is bounded by both a byte
//! attempt count and a wall-clock deadline.

use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use super::commands::Command;
use crate::link::Link;
use crate::types::{Frame, MessageId, SYNC_1};
use crate::{JammonError, Result};

/// ACK-ACK header: sync, class 0x05, id 0x01.
pub const ACK_HEADER: [u8; 4] = [0xB5, 0x62, 0x05, 0x01];
/// ACK-NAK header: sync, class 0x05, id 0x00.
pub const NACK_HEADER: [u8; 4] = [0xB5, 0x62, 0x05, 0x00];

/// Default number of single-byte reads before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 2000;
/// Default time allowed for an acknowledgment to arrive.
pub const DEFAULT_ACK_DEADLINE: Duration = Duration::from_secs(3);

/// Result of sending one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeOutcome {
    Ack,
    Nack,
    Timeout,
    WriteError,
}

impl fmt::Display for HandshakeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            HandshakeOutcome::Ack => "acknowledged",
            HandshakeOutcome::Nack => "rejected by receiver",
            HandshakeOutcome::Timeout => "no acknowledgment received",
            HandshakeOutcome::WriteError => "write failed",
        };
        f.write_str(text)
    }
}

/// Progress of an [`AckMatcher`] after one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckProgress {
    Pending,
    Ack,
    Nack,
}

/// Incremental matcher for the acknowledgment of one command.
///
/// Positions 0..3 must match the ACK header, except that a NACK id byte at
/// position 3 ends the match immediately. Positions 4 and 5 (the length) are
/// not checked. Positions 6 and 7 must echo the command's class and id.
#[derive(Debug, Clone)]
pub struct AckMatcher {
    target: MessageId,
    position: usize,
}

impl AckMatcher {
    pub fn new(target: MessageId) -> Self {
        Self { target, position: 0 }
    }

    pub fn push(&mut self, byte: u8) -> AckProgress {
        let matched = match self.position {
            0..=2 => byte == ACK_HEADER[self.position],
            3 if byte == NACK_HEADER[3] => {
                self.position = 0;
                return AckProgress::Nack;
            }
            3 => byte == ACK_HEADER[3],
            4 | 5 => true,
            6 => byte == self.target.class,
            _ => byte == self.target.id,
        };

        if !matched {
            self.position = if byte == SYNC_1 { 1 } else { 0 };
            return AckProgress::Pending;
        }

        self.position += 1;
        if self.position == 8 {
            self.position = 0;
            return AckProgress::Ack;
        }
        AckProgress::Pending
    }
}

/// Bounds for acknowledgment scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handshake {
    /// Single-byte reads allowed per command
    pub max_attempts: usize,
    /// Wall-clock limit per command
    pub ack_deadline: Duration,
}

impl Default for Handshake {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, ack_deadline: DEFAULT_ACK_DEADLINE }
    }
}

impl Handshake {
    /// Send `frame` and wait for its acknowledgment.
    ///
    /// Only bytes already buffered by the link are discarded before the
    /// write. Stale bytes still queued by the OS are not flushed; the scanner
    /// reads past them, as it does for any frame that is not this command's
    /// ACK or NACK.
    pub async fn send_and_confirm<R, W>(
        &self,
        link: &mut Link<R, W>,
        frame: &Frame,
    ) -> HandshakeOutcome
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        link.discard_input();
        if let Err(e) = link.write_frame(frame).await {
            warn!("Writing {} failed: {}", frame.message, e);
            return HandshakeOutcome::WriteError;
        }

        let scan = self.scan_for_ack(link, frame.message);
        match tokio::time::timeout(self.ack_deadline, scan).await {
            Ok(outcome) => outcome,
            Err(_) => {
                debug!("Deadline of {:?} passed waiting for {}", self.ack_deadline, frame.message);
                HandshakeOutcome::Timeout
            }
        }
    }

    async fn scan_for_ack<R, W>(
        &self,
        link: &mut Link<R, W>,
        target: MessageId,
    ) -> HandshakeOutcome
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let mut matcher = AckMatcher::new(target);

        for _ in 0..self.max_attempts {
            let byte = match link.read_byte().await {
                Ok(Some(byte)) => byte,
                Ok(None) => {
                    warn!("Receiver closed while waiting for acknowledgment of {}", target);
                    return HandshakeOutcome::Timeout;
                }
                Err(e) => {
                    warn!("Read failed while waiting for acknowledgment of {}: {}", target, e);
                    return HandshakeOutcome::Timeout;
                }
            };

            match matcher.push(byte) {
                AckProgress::Pending => {}
                AckProgress::Ack => return HandshakeOutcome::Ack,
                AckProgress::Nack => return HandshakeOutcome::Nack,
            }
        }

        debug!("No acknowledgment for {} within {} bytes", target, self.max_attempts);
        HandshakeOutcome::Timeout
    }

    /// Send `frame` without waiting for any acknowledgment.
    ///
    /// Used for the receiver reset, which restarts the receiver before it
    /// could answer. Input is discarded after the write.
    pub async fn send_unconfirmed<R, W>(&self, link: &mut Link<R, W>, frame: &Frame) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        link.write_frame(frame).await?;
        link.discard_input();
        Ok(())
    }

    /// Run `commands` in order, stopping at the first one not acknowledged.
    pub async fn configure<R, W>(&self, link: &mut Link<R, W>, commands: &[Command]) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        for command in commands {
            match self.send_and_confirm(link, &command.frame).await {
                HandshakeOutcome::Ack => debug!("Receiver acknowledged '{}'", command.name),
                outcome => {
                    error!("Configuration command '{}' failed: {}", command.name, outcome);
                    return Err(JammonError::Handshake { command: command.name, outcome });
                }
            }
        }

        info!("Receiver configured ({} commands acknowledged)", commands.len());
        Ok(())
    }
}
