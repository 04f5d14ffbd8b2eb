//! # Status Indication Module
//!
//! Maps the current store contents to a blink pattern and drives a status
//! indicator with it. The pattern is re-evaluated from scratch every cycle;
//! nothing is remembered between cycles except for logging changes.

pub mod indicator;

use std::sync::Arc;

use tokio::time::{sleep, Duration};
use tracing::info;

use crate::telemetry::store::{SlotSnapshot, TelemetryStore};
use indicator::StatusIndicator;

/// Data younger than this counts as a connected ESC
pub const RECENT_WINDOW_MS: u64 = 2_000;

/// ESCs above this RPM count as running
pub const RPM_RUNNING_THRESHOLD: u32 = 100;

/// Delay of the fallback cycle, indicator untouched
const QUIESCENT_DELAY_MS: u64 = 100;

/// Blink pattern shown by the status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPattern {
    /// No recent data: short flash once per second
    Searching,
    /// At least one ESC spinning: 2 Hz, 50 % duty
    Running,
    /// ESCs connected, none spinning: 0.5 Hz, 50 % duty
    Idle,
    /// Fallback: short sleep, no toggle
    Quiescent,
}

impl StatusPattern {
    /// `(on, off)` durations, `None` if the indicator is not toggled
    pub fn timing(self) -> Option<(Duration, Duration)> {
        match self {
            StatusPattern::Searching => Some((Duration::from_millis(50), Duration::from_millis(950))),
            StatusPattern::Running => Some((Duration::from_millis(250), Duration::from_millis(250))),
            StatusPattern::Idle => Some((Duration::from_millis(1000), Duration::from_millis(1000))),
            StatusPattern::Quiescent => None,
        }
    }
}

impl std::fmt::Display for StatusPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StatusPattern::Searching => "searching",
            StatusPattern::Running => "running",
            StatusPattern::Idle => "idle",
            StatusPattern::Quiescent => "quiescent",
        };
        f.write_str(name)
    }
}

/// Choose the pattern for a full store scan
///
/// Priority: nothing recent → `Searching`; any recent ESC above
/// [`RPM_RUNNING_THRESHOLD`] → `Running`; any recent ESC → `Idle`.
pub fn evaluate_status(slots: &[SlotSnapshot], now_ms: u64) -> StatusPattern {
    let mut any_recent = false;
    let mut any_running = false;
    let mut any_idle = false;

    for slot in slots.iter().filter(|s| s.is_recent(now_ms, RECENT_WINDOW_MS)) {
        any_recent = true;
        if slot.sample.rpm > RPM_RUNNING_THRESHOLD {
            any_running = true;
        } else {
            any_idle = true;
        }
    }

    if !any_recent {
        StatusPattern::Searching
    } else if any_running {
        StatusPattern::Running
    } else if any_idle {
        StatusPattern::Idle
    } else {
        StatusPattern::Quiescent
    }
}

/// Show one cycle of `pattern` on the indicator
pub async fn blink_once<I: StatusIndicator + ?Sized>(indicator: &mut I, pattern: StatusPattern) {
    match pattern.timing() {
        Some((on, off)) => {
            indicator.set(true);
            sleep(on).await;
            indicator.set(false);
            sleep(off).await;
        }
        None => sleep(Duration::from_millis(QUIESCENT_DELAY_MS)).await,
    }
}

/// Drive the indicator from the store forever
pub async fn run_status_loop<I: StatusIndicator + ?Sized>(store: Arc<TelemetryStore>, indicator: &mut I) {
    let mut last: Option<StatusPattern> = None;

    loop {
        let pattern = evaluate_status(&store.snapshot_all(), store.now_ms());
        if last != Some(pattern) {
            info!("Status: {}", pattern);
            last = Some(pattern);
        }
        blink_once(indicator, pattern).await;
    }
}
