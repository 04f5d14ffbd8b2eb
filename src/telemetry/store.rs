//! # Telemetry Store
//!
//! Fixed table of 128 device slots holding the latest [`TelemetrySample`] and
//! traffic counters per address. Shared between channel readers (writers) and
//! the reporter and status loops (readers) behind an `Arc`.
//!
//! Each slot sits behind its own mutex. Writers hold it only for the field
//! copy, so a reader always sees every field of a sample from the same frame.
//! Writes to the same address from different channels are serialized by that
//! mutex; the last write wins.

use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use crate::openyge::protocol::{DeviceAddress, TelemetrySample, MAX_DEVICES};

/// Per-device traffic counters. Only ever increase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelCounters {
    /// Bytes of accepted frames
    pub bytes_received: u64,

    /// Frames that decoded successfully
    pub frames_accepted: u64,

    /// Frames that failed validation
    pub frames_rejected: u64,
}

impl ChannelCounters {
    /// True if any counter has moved off zero
    pub fn has_activity(&self) -> bool {
        self.bytes_received != 0 || self.frames_accepted != 0 || self.frames_rejected != 0
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    /// `None` until the first accepted frame
    last_update_ms: Option<u64>,
    sample: TelemetrySample,
    counters: ChannelCounters,
}

/// Consistent copy of one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSnapshot {
    /// Device address of the slot
    pub address: DeviceAddress,

    /// Milliseconds since store creation of the last update, `None` if never updated
    pub last_update_ms: Option<u64>,

    /// Latest sample (all zero if never updated)
    pub sample: TelemetrySample,

    /// Traffic counters
    pub counters: ChannelCounters,
}

impl SlotSnapshot {
    /// Age of the sample at `now_ms`, `None` if never updated
    pub fn age_ms(&self, now_ms: u64) -> Option<u64> {
        self.last_update_ms.map(|seen| now_ms.saturating_sub(seen))
    }

    /// True if updated within `window_ms` of `now_ms`
    pub fn is_recent(&self, now_ms: u64, window_ms: u64) -> bool {
        self.age_ms(now_ms).is_some_and(|age| age <= window_ms)
    }
}

/// Shared telemetry table
#[derive(Debug)]
pub struct TelemetryStore {
    epoch: Instant,
    slots: [Mutex<Slot>; MAX_DEVICES],
}

impl TelemetryStore {
    /// Create a store with every slot empty and all counters zero
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            slots: std::array::from_fn(|_| Mutex::new(Slot::default())),
        }
    }

    /// Monotonic milliseconds since the store was created
    pub fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn slot(&self, address: DeviceAddress) -> MutexGuard<'_, Slot> {
        // Slots hold plain values that are always whole, so a poisoned lock is still usable
        self.slots[address.index()]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Overwrite the device's sample and stamp it with the current time
    pub fn apply(&self, address: DeviceAddress, sample: TelemetrySample) {
        self.apply_at(address, sample, self.now_ms());
    }

    /// Overwrite the device's sample with an explicit timestamp
    pub fn apply_at(&self, address: DeviceAddress, sample: TelemetrySample, now_ms: u64) {
        let mut slot = self.slot(address);
        slot.sample = sample;
        slot.last_update_ms = Some(now_ms);
    }

    /// Count an accepted frame of `frame_length` bytes
    pub fn record_accepted(&self, address: DeviceAddress, frame_length: usize) {
        let mut slot = self.slot(address);
        slot.counters.frames_accepted += 1;
        slot.counters.bytes_received += frame_length as u64;
    }

    /// Count a rejected frame
    pub fn record_rejected(&self, address: DeviceAddress) {
        self.slot(address).counters.frames_rejected += 1;
    }

    /// Store a decoded sample and count its frame under a single lock
    pub fn commit(&self, address: DeviceAddress, sample: TelemetrySample, frame_length: usize) {
        let now_ms = self.now_ms();
        let mut slot = self.slot(address);
        slot.sample = sample;
        slot.last_update_ms = Some(now_ms);
        slot.counters.frames_accepted += 1;
        slot.counters.bytes_received += frame_length as u64;
    }

    /// Copy one slot
    pub fn snapshot(&self, address: DeviceAddress) -> SlotSnapshot {
        let slot = *self.slot(address);
        SlotSnapshot {
            address,
            last_update_ms: slot.last_update_ms,
            sample: slot.sample,
            counters: slot.counters,
        }
    }

    /// Copy every slot, in address order
    ///
    /// Each slot is copied atomically; slots are not frozen relative to each other.
    pub fn snapshot_all(&self) -> Vec<SlotSnapshot> {
        (0..MAX_DEVICES)
            .filter_map(DeviceAddress::new)
            .map(|address| self.snapshot(address))
            .collect()
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}
