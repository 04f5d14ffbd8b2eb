//! # OpenYGE Frame Reassembler
//!
//! Rebuilds length-delimited frames from a raw serial byte stream. One
//! reassembler belongs to one channel; it holds no shared state.
//!
//! ```text
//!            0xA5                      len == expected
//!   Idle ─────────────▶ Collecting ─────────────────────▶ emit frame, Idle
//!    ▲ other: discard        │ byte 4: declared length out of range
//!    └───────────────────────┘ (silent reset, not counted)
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::protocol::{OPENYGE_MAX_FRAME_LENGTH, OPENYGE_MIN_FRAME_LENGTH, OPENYGE_SYNC_BYTE};

/// Offset of the frame length byte
const LENGTH_OFFSET: usize = 3;

/// Result of feeding one byte to the reassembler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reassembly {
    /// Byte consumed, frame not complete yet
    Pending,

    /// Stray byte while idle, dropped
    ResyncDiscard,

    /// Declared frame length was outside the accepted range; state reset.
    /// Never attributed to a device.
    InvalidDeclaredLength(u8),

    /// Complete frame, `frame.len()` equals the declared length
    Frame(Bytes),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// `expected` is 0 until the length byte has been seen
    Collecting { expected: usize },
}

/// Per-channel frame reassembly state machine
#[derive(Debug)]
pub struct FrameReassembler {
    state: State,
    buffer: BytesMut,
}

impl FrameReassembler {
    /// Create an idle reassembler
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            buffer: BytesMut::with_capacity(OPENYGE_MAX_FRAME_LENGTH),
        }
    }

    /// True while no frame is in progress
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Feed one byte
    pub fn push(&mut self, byte: u8) -> Reassembly {
        match self.state {
            State::Idle => {
                if byte != OPENYGE_SYNC_BYTE {
                    return Reassembly::ResyncDiscard;
                }
                self.buffer.clear();
                self.buffer.put_u8(byte);
                self.state = State::Collecting { expected: 0 };
                Reassembly::Pending
            }
            State::Collecting { mut expected } => {
                if self.buffer.len() >= OPENYGE_MAX_FRAME_LENGTH {
                    // Unreachable with the length cap below, but never overrun
                    self.reset();
                    return Reassembly::Pending;
                }

                self.buffer.put_u8(byte);

                if self.buffer.len() == LENGTH_OFFSET + 1 {
                    let declared = self.buffer[LENGTH_OFFSET];
                    expected = declared as usize;
                    if !(OPENYGE_MIN_FRAME_LENGTH..=OPENYGE_MAX_FRAME_LENGTH).contains(&expected) {
                        self.reset();
                        return Reassembly::InvalidDeclaredLength(declared);
                    }
                    self.state = State::Collecting { expected };
                }

                if expected != 0 && self.buffer.len() >= expected {
                    let frame = self.buffer.split().freeze();
                    self.reset();
                    return Reassembly::Frame(frame);
                }

                Reassembly::Pending
            }
        }
    }

    /// Drop any partial frame and return to idle
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = State::Idle;
    }
}

impl Default for FrameReassembler {
    fn default() -> Self {
        Self::new()
    }
}
