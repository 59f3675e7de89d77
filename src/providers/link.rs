//! Provider reading frames off a receiver link

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::link::Link;
use crate::protocol::{DecoderStats, FrameDecoder};
use crate::provider::FrameProvider;
use crate::types::Frame;
use crate::Result;

/// Runs bytes from a [`Link`] through a [`FrameDecoder`].
///
/// Checksum failures and oversized frames are logged and skipped; the
/// decoder has already resynchronized by the time they are reported. Read
/// failures end the stream with an error.
#[derive(Debug)]
pub struct LinkProvider<R, W> {
    link: Link<R, W>,
    decoder: FrameDecoder,
}

impl<R, W> LinkProvider<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(link: Link<R, W>, frame_capacity: usize) -> Self {
        Self { link, decoder: FrameDecoder::new(frame_capacity) }
    }

    pub fn decoder_stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    pub fn bytes_read(&self) -> u64 {
        self.link.bytes_read()
    }

    pub fn into_link(self) -> Link<R, W> {
        self.link
    }
}

#[async_trait::async_trait]
impl<R, W> FrameProvider for LinkProvider<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            let Some(byte) = self.link.read_byte().await? else {
                if !self.decoder.is_idle() {
                    debug!("Link closed in the middle of a frame");
                }
                info!("Receiver link closed after {} bytes", self.link.bytes_read());
                return Ok(None);
            };

            match self.decoder.push(byte) {
                Ok(Some(frame)) => return Ok(Some(frame)),
                Ok(None) => {}
                Err(e) => warn!("Dropped frame: {}", e),
            }
        }
    }
}
