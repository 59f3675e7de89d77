//! Byte-at-a-time UBX frame decoder
//!
//! A forward-only automaton: every byte either advances the state or resets
//! it to waiting for the first sync byte. Partial frames are never exposed.

use tracing::{trace, warn};

use super::checksum::Fletcher;
use crate::types::{FRAME_OVERHEAD, Frame, MessageId, SYNC_1, SYNC_2};
use crate::{JammonError, Result};

/// Default receive buffer size, large enough for a dual-band MON-SPAN.
pub const DEFAULT_FRAME_CAPACITY: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitSync1,
    AwaitSync2,
    Class,
    Id,
    LengthLow,
    LengthHigh,
    Payload,
    ChecksumA,
    ChecksumB,
}

/// Counters describing what the decoder has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Frames surfaced with a valid checksum
    pub frames: u64,
    /// Frames discarded on checksum mismatch
    pub checksum_failures: u64,
    /// Frames rejected because the declared length exceeded capacity
    pub oversized: u64,
    /// Automaton resets caused by an unexpected byte after the first sync byte
    pub resyncs: u64,
}

/// Stateful frame decoder.
#[derive(Debug)]
pub struct FrameDecoder {
    state: State,
    capacity: usize,
    class: u8,
    id: u8,
    length: usize,
    payload: Vec<u8>,
    fletcher: Fletcher,
    trailer_a: u8,
    stats: DecoderStats,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_CAPACITY)
    }
}

impl FrameDecoder {
    /// Create a decoder whose frames (overhead included) fit in `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: State::AwaitSync1,
            capacity,
            class: 0,
            id: 0,
            length: 0,
            payload: Vec::with_capacity(capacity.saturating_sub(FRAME_OVERHEAD)),
            fletcher: Fletcher::new(),
            trailer_a: 0,
            stats: DecoderStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Whether the decoder is between frames.
    pub fn is_idle(&self) -> bool {
        self.state == State::AwaitSync1
    }

    /// Drop any partially captured frame.
    pub fn reset(&mut self) {
        self.state = State::AwaitSync1;
        self.payload.clear();
        self.fletcher = Fletcher::new();
    }

    /// Feed one byte.
    ///
    /// Returns `Ok(Some(frame))` when `byte` completes a valid frame and
    /// `Ok(None)` while more bytes are needed. Checksum mismatches and
    /// oversized frames return an error after the decoder has already reset,
    /// so callers can log and keep feeding.
    pub fn push(&mut self, byte: u8) -> Result<Option<Frame>> {
        match self.state {
            State::AwaitSync1 => {
                if byte == SYNC_1 {
                    self.state = State::AwaitSync2;
                }
            }
            State::AwaitSync2 => match byte {
                SYNC_2 => {
                    self.fletcher = Fletcher::new();
                    self.state = State::Class;
                }
                // A repeated first sync byte may itself start the frame
                SYNC_1 => {}
                _ => {
                    trace!("Unexpected byte 0x{:02x} after sync, resynchronizing", byte);
                    self.stats.resyncs += 1;
                    self.reset();
                }
            },
            State::Class => {
                self.class = byte;
                self.fletcher.update(byte);
                self.state = State::Id;
            }
            State::Id => {
                self.id = byte;
                self.fletcher.update(byte);
                self.state = State::LengthLow;
            }
            State::LengthLow => {
                self.length = byte as usize;
                self.fletcher.update(byte);
                self.state = State::LengthHigh;
            }
            State::LengthHigh => {
                self.length |= (byte as usize) << 8;
                self.fletcher.update(byte);

                if self.length + FRAME_OVERHEAD > self.capacity {
                    let declared = self.length;
                    self.stats.oversized += 1;
                    self.reset();
                    return Err(JammonError::FrameTooLong { declared, capacity: self.capacity });
                }

                self.payload.clear();
                self.state = if self.length == 0 { State::ChecksumA } else { State::Payload };
            }
            State::Payload => {
                self.payload.push(byte);
                self.fletcher.update(byte);
                if self.payload.len() == self.length {
                    self.state = State::ChecksumA;
                }
            }
            State::ChecksumA => {
                self.trailer_a = byte;
                self.state = State::ChecksumB;
            }
            State::ChecksumB => {
                let message = MessageId::new(self.class, self.id);
                let computed = self.fletcher.finish();
                let trailer = [self.trailer_a, byte];

                if computed != trailer {
                    self.stats.checksum_failures += 1;
                    self.reset();
                    return Err(JammonError::Checksum { message, computed, trailer });
                }

                let payload = std::mem::take(&mut self.payload);
                self.reset();
                self.stats.frames += 1;
                return Frame::new(message, payload).map(Some);
            }
        }

        Ok(None)
    }

    /// Feed a slice, collecting every completed frame.
    ///
    /// Transient decode errors are logged and skipped.
    pub fn decode_all(&mut self, bytes: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        for &byte in bytes {
            match self.push(byte) {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => {}
                Err(e) => warn!("Discarding frame: {}", e),
            }
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::checksum;
    use proptest::prelude::*;

    fn wire(class: u8, id: u8, payload: &[u8]) -> Vec<u8> {
        Frame::new(MessageId::new(class, id), payload.to_vec()).unwrap().to_bytes()
    }

    #[test]
    fn decodes_a_single_frame() {
        let bytes = wire(0x01, 0x07, &[1, 2, 3, 4]);
        let mut decoder = FrameDecoder::default();

        let frames = decoder.decode_all(&bytes);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].message, MessageId::new(0x01, 0x07));
        assert_eq!(&*frames[0].payload, &[1, 2, 3, 4]);
        assert_eq!(frames[0].length(), 4);
        assert!(decoder.is_idle());
    }

    #[test]
    fn zero_length_payload() {
        let bytes = wire(0x0a, 0x04, &[]);
        let mut decoder = FrameDecoder::default();
        assert_eq!(decoder.decode_all(&bytes).len(), 1);
    }

    #[test]
    fn checksum_mismatch_is_reported_and_resets() {
        let mut bytes = wire(0x01, 0x35, &[9, 9, 9]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;

        let mut decoder = FrameDecoder::default();
        let mut errors = 0;
        for &byte in &bytes {
            if let Err(e) = decoder.push(byte) {
                assert!(matches!(e, JammonError::Checksum { .. }));
                errors += 1;
            }
        }

        assert_eq!(errors, 1);
        assert!(decoder.is_idle());
        assert_eq!(decoder.stats().checksum_failures, 1);
    }

    #[test]
    fn oversized_length_is_rejected_then_resyncs() {
        let mut decoder = FrameDecoder::new(64);
        let mut bytes = vec![SYNC_1, SYNC_2, 0x0a, 0x31, 0x00, 0x10];
        bytes.extend(wire(0x0a, 0x38, &[0, 1, 0, 0]));

        let mut rejected = 0;
        let mut frames = Vec::new();
        for &byte in &bytes {
            match decoder.push(byte) {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => {}
                Err(JammonError::FrameTooLong { declared, capacity }) => {
                    assert_eq!((declared, capacity), (0x1000, 64));
                    rejected += 1;
                }
                Err(other) => panic!("Unexpected error: {}", other),
            }
        }

        assert_eq!(rejected, 1);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].message, MessageId::new(0x0a, 0x38));
    }

    #[test]
    fn frame_exactly_at_capacity_is_accepted() {
        let payload = vec![0x55; 56];
        let mut decoder = FrameDecoder::new(64);
        assert_eq!(decoder.decode_all(&wire(0x01, 0x43, &payload)).len(), 1);

        let payload = vec![0x55; 57];
        assert!(decoder.decode_all(&wire(0x01, 0x43, &payload)).is_empty());
        assert_eq!(decoder.stats().oversized, 1);
    }

    #[test]
    fn repeated_first_sync_byte_is_tolerated() {
        let mut bytes = vec![SYNC_1, SYNC_1, SYNC_1];
        bytes.extend(wire(0x01, 0x07, &[7]));

        let mut decoder = FrameDecoder::default();
        assert_eq!(decoder.decode_all(&bytes).len(), 1);
    }

    #[test]
    fn sync_byte_inside_payload_is_data() {
        let payload = [SYNC_1, SYNC_2, SYNC_1, 0x00];
        let bytes = wire(0x0a, 0x38, &payload);
        assert!(checksum::verify_frame(&bytes));

        let mut decoder = FrameDecoder::default();
        let frames = decoder.decode_all(&bytes);
        assert_eq!(frames.len(), 1);
        assert_eq!(&*frames[0].payload, &payload);
    }

    #[test]
    fn bad_second_sync_counts_a_resync() {
        let mut decoder = FrameDecoder::default();
        decoder.decode_all(&[SYNC_1, 0x00, SYNC_1, 0x61]);
        assert_eq!(decoder.stats().resyncs, 2);
        assert!(decoder.is_idle());
    }

    proptest! {
        #[test]
        fn frame_followed_by_noise_is_found_once(
            prefix in prop::collection::vec(any::<u8>().prop_filter("no sync", |b| *b != SYNC_1), 0..64),
            payload in prop::collection::vec(any::<u8>(), 0..300),
            noise in prop::collection::vec(any::<u8>(), 0..256),
        ) {
            let frame = Frame::new(MessageId::new(0x01, 0x43), payload).unwrap();
            let mut bytes = prefix;
            bytes.extend(frame.to_bytes());
            bytes.extend(&noise);

            let mut decoder = FrameDecoder::default();
            let frames = decoder.decode_all(&bytes);

            prop_assert!(!frames.is_empty());
            prop_assert_eq!(&frames[0], &frame);
            // Noise might contain an unrelated valid frame, never this one again
            let resurfaced = frames.iter().skip(1).any(|f| f == &frame);
            prop_assert!(!resurfaced || noise.windows(2).any(|w| w == [SYNC_1, SYNC_2]));
        }

        #[test]
        fn arbitrary_input_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..4096)) {
            let mut decoder = FrameDecoder::new(128);
            for frame in decoder.decode_all(&bytes) {
                prop_assert!(frame.payload.len() + FRAME_OVERHEAD <= 128);
            }
        }

        #[test]
        fn oversized_declarations_always_resync(declared in 2041u16..=u16::MAX) {
            let mut bytes = vec![SYNC_1, SYNC_2, 0x0a, 0x31];
            bytes.extend(declared.to_le_bytes());
            let good = Frame::new(MessageId::new(0x01, 0x07), vec![0u8; 92]).unwrap();
            bytes.extend(good.to_bytes());

            let mut decoder = FrameDecoder::default();
            let frames = decoder.decode_all(&bytes);
            prop_assert_eq!(frames, vec![good]);
            prop_assert_eq!(decoder.stats().oversized, 1);
        }
    }
}
