//! # Channel Reader
//!
//! Pumps one channel's byte stream through the frame reassembler and decoder
//! into the shared telemetry store.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use crate::error::Result;
use crate::openyge::decoder::decode_frame;
use crate::openyge::reassembler::{FrameReassembler, Reassembly};
use crate::telemetry::store::TelemetryStore;

/// Per-channel reader statistics
///
/// Unlike the per-device counters in the store, these also cover bytes and
/// frames that never reached a device.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReaderStats {
    /// Raw bytes read from the stream
    pub bytes_read: u64,

    /// Frames emitted by the reassembler
    pub frames_emitted: u64,

    /// Emitted frames that decoded
    pub frames_accepted: u64,

    /// Emitted frames that were rejected
    pub frames_rejected: u64,

    /// Stray bytes dropped while waiting for sync
    pub resync_discards: u64,

    /// Frame starts abandoned because of an out-of-range length byte
    pub invalid_lengths: u64,
}

/// Reader for one telemetry channel
#[derive(Debug)]
pub struct ChannelReader {
    name: String,
    reassembler: FrameReassembler,
    store: Arc<TelemetryStore>,
    stats: ReaderStats,
}

impl ChannelReader {
    /// Create a reader that writes into `store`
    pub fn new(name: impl Into<String>, store: Arc<TelemetryStore>) -> Self {
        Self {
            name: name.into(),
            reassembler: FrameReassembler::new(),
            store,
            stats: ReaderStats::default(),
        }
    }

    /// Channel name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Statistics since creation
    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    /// Drop any partially received frame, e.g. after a reconnect
    pub fn reset(&mut self) {
        self.reassembler.reset();
    }

    /// Process a chunk of received bytes
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            match self.reassembler.push(byte) {
                Reassembly::Pending => {}
                Reassembly::ResyncDiscard => self.stats.resync_discards += 1,
                Reassembly::InvalidDeclaredLength(declared) => {
                    self.stats.invalid_lengths += 1;
                    trace!(channel = %self.name, declared, "Invalid frame length, resyncing");
                }
                Reassembly::Frame(frame) => self.handle_frame(&frame),
            }
        }
    }

    fn handle_frame(&mut self, frame: &[u8]) {
        self.stats.frames_emitted += 1;

        // Decode outside the store lock; only the copy-in is guarded
        match decode_frame(frame) {
            Ok(decoded) => {
                self.store
                    .commit(decoded.address, decoded.sample, decoded.frame_length);
                self.stats.frames_accepted += 1;
                trace!(
                    channel = %self.name,
                    device = %decoded.address,
                    rpm = decoded.sample.rpm,
                    "Telemetry frame accepted"
                );
            }
            Err(rejection) => {
                self.store.record_rejected(rejection.address);
                self.stats.frames_rejected += 1;
                trace!(channel = %self.name, "{}", rejection);
            }
        }
    }

    /// Read until end of stream or an I/O error
    ///
    /// # Arguments
    ///
    /// * `stream` - Byte source, usually a serial port
    /// * `buffer_size` - Maximum bytes per read
    ///
    /// # Errors
    ///
    /// Returns error if reading from the stream fails
    pub async fn run<R: AsyncRead + Unpin + ?Sized>(&mut self, stream: &mut R, buffer_size: usize) -> Result<()> {
        let mut buf = vec![0u8; buffer_size.max(1)];

        loop {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                debug!(channel = %self.name, stats = ?self.stats, "Channel stream ended");
                return Ok(());
            }

            self.stats.bytes_read += n as u64;
            self.feed(&buf[..n]);

            // Let the other channel readers and loops run between chunks
            tokio::task::yield_now().await;
        }
    }
}
