//! # Telemetry Reporting
//!
//! Turns a store scan into report rows. A device is reported while its data is
//! fresh or once it has any traffic at all; when nothing qualifies a single
//! heartbeat row keeps the output stream alive.

use serde::Serialize;

use super::store::SlotSnapshot;

/// Samples younger than this are reported even without traffic counters
pub const REPORT_WINDOW_MS: u64 = 60_000;

/// Device column value of the heartbeat row
pub const HEARTBEAT_DEVICE: i16 = -1;

/// CSV column names, in row order
pub const CSV_COLUMNS: [&str; 16] = [
    "ts_ms",
    "device",
    "rpm",
    "voltage_mV",
    "current_mA",
    "consumption_mAh",
    "pwm_x10",
    "throttle_x10",
    "tempC_x10",
    "bec_voltage_mV",
    "bec_current_mA",
    "bec_tempC_x10",
    "status",
    "rx_bytes",
    "rx_frames_received",
    "rx_frames_dropped",
];

/// CSV header line
pub fn csv_header() -> String {
    CSV_COLUMNS.join(",")
}

/// One report row. Field order matches [`CSV_COLUMNS`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub timestamp_ms: u64,
    pub device: i16,
    pub rpm: u32,
    pub voltage_mv: i32,
    pub current_ma: i32,
    pub consumption_mah: u32,
    pub pwm_x10: i16,
    pub throttle_x10: i16,
    pub temp_c_x10: i16,
    pub bec_voltage_mv: i32,
    pub bec_current_ma: i32,
    pub bec_temp_c_x10: i16,
    pub status: u8,
    pub rx_bytes: u64,
    pub rx_frames_accepted: u64,
    pub rx_frames_rejected: u64,
}

impl ReportRow {
    /// Placeholder row: device -1, every other column except the timestamp zero
    pub fn heartbeat(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            device: HEARTBEAT_DEVICE,
            ..Default::default()
        }
    }

    /// Row for one slot
    pub fn from_slot(slot: &SlotSnapshot, timestamp_ms: u64) -> Self {
        let sample = &slot.sample;
        Self {
            timestamp_ms,
            device: slot.address.value() as i16,
            rpm: sample.rpm,
            voltage_mv: sample.voltage_mv,
            current_ma: sample.current_ma,
            consumption_mah: sample.consumption_mah,
            pwm_x10: sample.pwm_x10,
            throttle_x10: sample.throttle_x10,
            temp_c_x10: sample.temp_c_x10,
            bec_voltage_mv: sample.bec_voltage_mv,
            bec_current_ma: sample.bec_current_ma,
            bec_temp_c_x10: sample.bec_temp_c_x10,
            status: sample.status,
            rx_bytes: slot.counters.bytes_received,
            rx_frames_accepted: slot.counters.frames_accepted,
            rx_frames_rejected: slot.counters.frames_rejected,
        }
    }

    /// True for the heartbeat placeholder
    pub fn is_heartbeat(&self) -> bool {
        self.device == HEARTBEAT_DEVICE
    }

    /// Render as one CSV line (no trailing newline)
    pub fn to_csv(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.timestamp_ms,
            self.device,
            self.rpm,
            self.voltage_mv,
            self.current_ma,
            self.consumption_mah,
            self.pwm_x10,
            self.throttle_x10,
            self.temp_c_x10,
            self.bec_voltage_mv,
            self.bec_current_ma,
            self.bec_temp_c_x10,
            self.status,
            self.rx_bytes,
            self.rx_frames_accepted,
            self.rx_frames_rejected,
        )
    }
}

/// Whether a slot belongs in the report at `now_ms`
pub fn should_report(slot: &SlotSnapshot, now_ms: u64) -> bool {
    slot.is_recent(now_ms, REPORT_WINDOW_MS) || slot.counters.has_activity()
}

/// Build the report for a full store scan
///
/// # Arguments
///
/// * `slots` - Store snapshot, as returned by `TelemetryStore::snapshot_all`
/// * `now_ms` - Current store time; also the timestamp column of every row
///
/// # Returns
///
/// * `Vec<ReportRow>` - One row per qualifying slot in address order, or a
///   single heartbeat row if none qualifies
pub fn report_rows(slots: &[SlotSnapshot], now_ms: u64) -> Vec<ReportRow> {
    let rows: Vec<ReportRow> = slots
        .iter()
        .filter(|slot| should_report(slot, now_ms))
        .map(|slot| ReportRow::from_slot(slot, now_ms))
        .collect();

    if rows.is_empty() {
        vec![ReportRow::heartbeat(now_ms)]
    } else {
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openyge::protocol::{DeviceAddress, TelemetrySample};
    use crate::telemetry::store::TelemetryStore;

    fn addr(raw: u8) -> DeviceAddress {
        DeviceAddress::from_wire(raw)
    }

    #[test]
    fn test_empty_store_yields_heartbeat() {
        let store = TelemetryStore::new();
        let rows = report_rows(&store.snapshot_all(), 5_000);

        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_heartbeat());
        assert_eq!(rows[0].to_csv(), "5000,-1,0,0,0,0,0,0,0,0,0,0,0,0,0,0");

        let line = rows[0].to_csv();
        let columns: Vec<&str> = line.split(',').skip(2).collect();
        assert_eq!(columns.len(), 14);
        assert!(columns.iter().all(|c| *c == "0"));
    }

    #[test]
    fn test_recent_device_reported() {
        let store = TelemetryStore::new();
        let sample = TelemetrySample {
            rpm: 12_340,
            voltage_mv: 25_120,
            temp_c_x10: 200,
            status: 3,
            ..Default::default()
        };
        store.apply_at(addr(7), sample, 1_000);

        let rows = report_rows(&store.snapshot_all(), 2_000);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].device, 7);
        assert_eq!(rows[0].rpm, 12_340);
        assert_eq!(rows[0].to_csv(), "2000,7,12340,25120,0,0,0,0,200,0,0,0,3,0,0,0");
    }

    #[test]
    fn test_stale_device_without_traffic_dropped() {
        let store = TelemetryStore::new();
        store.apply_at(addr(7), TelemetrySample::default(), 0);

        assert_eq!(report_rows(&store.snapshot_all(), 60_000)[0].device, 7);
        assert!(report_rows(&store.snapshot_all(), 60_001)[0].is_heartbeat());
    }

    #[test]
    fn test_traffic_keeps_device_reported() {
        let store = TelemetryStore::new();
        store.record_rejected(addr(0));
        store.record_accepted(addr(12), 30);

        let rows = report_rows(&store.snapshot_all(), 1_000_000);
        let devices: Vec<i16> = rows.iter().map(|r| r.device).collect();
        assert_eq!(devices, vec![0, 12]);
        assert_eq!(rows[0].rx_frames_rejected, 1);
        assert_eq!(rows[1].rx_bytes, 30);
    }

    #[test]
    fn test_csv_header_matches_columns() {
        let header = csv_header();
        assert!(header.starts_with("ts_ms,device,rpm"));
        assert_eq!(header.split(',').count(), 16);
        assert_eq!(
            ReportRow::heartbeat(0).to_csv().split(',').count(),
            CSV_COLUMNS.len()
        );
    }

    #[test]
    fn test_row_serializes_to_json() {
        let row = ReportRow::heartbeat(42);
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"timestamp_ms\":42"));
        assert!(json.contains("\"device\":-1"));
    }
}
