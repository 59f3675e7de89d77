//! Provider trait for frame sources

use crate::Result;
use crate::types::Frame;

/// Source of decoded UBX frames.
///
/// Providers hide where frames come from (a device link, a recorded capture,
/// a test fixture) and how long each one takes to arrive.
#[async_trait::async_trait]
pub trait FrameProvider: Send + 'static {
    /// Get the next frame with a valid checksum.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` - New frame available
    /// - `Ok(None)` - Stream ended (normal termination)
    /// - `Err(e)` - The source failed and cannot continue
    ///
    /// Corrupt or oversized frames are skipped by the provider, never
    /// surfaced here.
    async fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Replays a fixed list of frames, then ends.
///
/// Useful for feeding recorded traffic through a pipeline.
#[derive(Debug, Default)]
pub struct FrameList {
    frames: std::collections::VecDeque<Frame>,
}

impl FrameList {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self { frames: frames.into_iter().collect() }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

#[async_trait::async_trait]
impl FrameProvider for FrameList {
    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.pop_front())
    }
}
