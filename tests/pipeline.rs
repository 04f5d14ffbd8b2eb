//! End-to-end tests: raw bytes → reassembler → decoder → store → report / status

use std::sync::Arc;
use std::thread;

use esc_telemetry::openyge::encoder::{encode_frame, encode_telemetry_frame};
use esc_telemetry::openyge::protocol::{DeviceAddress, FrameType, TelemetryPayload, TelemetrySample};
use esc_telemetry::serial::reader::ChannelReader;
use esc_telemetry::status::{evaluate_status, StatusPattern};
use esc_telemetry::telemetry::report::report_rows;
use esc_telemetry::telemetry::store::TelemetryStore;

fn telemetry_frame(device: u8, payload: &TelemetryPayload) -> Vec<u8> {
    encode_telemetry_frame(3, FrameType::TelemetryAuto, DeviceAddress::from_wire(device), payload).unwrap()
}

fn uniform_payload(value: u8) -> TelemetryPayload {
    let wide = u16::from(value) * 3;
    TelemetryPayload {
        temperature: value,
        voltage: wide,
        current: wide,
        consumption: wide,
        rpm: wide,
        pwm: value as i8,
        throttle: value as i8,
        bec_voltage: wide,
        bec_current: wide,
        bec_temp: value,
        status: value,
    }
}

#[test]
fn test_noisy_stream_yields_one_frame() {
    let store = Arc::new(TelemetryStore::new());
    let mut reader = ChannelReader::new("esc1", Arc::clone(&store));

    let frame = telemetry_frame(7, &uniform_payload(60));
    let mut stream = vec![0x00, 0x11, 0x7F, 0xFF, 0x42];
    stream.extend_from_slice(&frame);
    reader.feed(&stream);

    let stats = reader.stats();
    assert_eq!(stats.frames_emitted, 1);
    assert_eq!(stats.frames_accepted, 1);
    assert_eq!(stats.resync_discards, 5);

    let slot = store.snapshot(DeviceAddress::from_wire(7));
    assert_eq!(slot.counters.bytes_received, frame.len() as u64);
    assert_eq!(slot.sample.temp_c_x10, 200);
}

#[test]
fn test_decoded_values_reach_report() {
    let store = Arc::new(TelemetryStore::new());
    let mut reader = ChannelReader::new("esc1", Arc::clone(&store));

    let payload = TelemetryPayload {
        temperature: 60,
        voltage: 2512,
        current: 1000,
        consumption: 42,
        rpm: 3000,
        pwm: 50,
        throttle: 48,
        bec_voltage: 5100,
        bec_current: 300,
        bec_temp: 55,
        status: 0x01,
    };
    reader.feed(&telemetry_frame(3, &payload));

    let now = store.now_ms();
    let rows = report_rows(&store.snapshot_all(), now);
    assert_eq!(rows.len(), 1);

    let row = rows[0];
    assert_eq!(row.device, 3);
    assert_eq!(
        row.to_csv(),
        format!("{},3,30000,25120,10000,42,500,480,200,5100,300,150,1,30,1,0", now)
    );

    assert_eq!(evaluate_status(&store.snapshot_all(), now), StatusPattern::Running);
}

#[test]
fn test_rejected_frames_reported_via_counters() {
    let store = Arc::new(TelemetryStore::new());
    let mut reader = ChannelReader::new("esc1", Arc::clone(&store));

    reader.feed(&encode_frame(3, 0x05, 11, &uniform_payload(1).to_bytes()).unwrap());

    let rows = report_rows(&store.snapshot_all(), store.now_ms());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].device, 11);
    assert_eq!(rows[0].rx_frames_rejected, 1);
    assert_eq!(rows[0].rx_frames_accepted, 0);

    // Rejections alone never make a device look connected
    assert_eq!(
        evaluate_status(&store.snapshot_all(), store.now_ms()),
        StatusPattern::Searching
    );
}

#[test]
fn test_empty_store_heartbeat() {
    let store = TelemetryStore::new();
    let rows = report_rows(&store.snapshot_all(), 1234);

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].device, -1);
    assert_eq!(rows[0].to_csv(), "1234,-1,0,0,0,0,0,0,0,0,0,0,0,0,0,0");
    assert_eq!(evaluate_status(&store.snapshot_all(), 1234), StatusPattern::Searching);
}

#[test]
fn test_two_channels_same_device_last_write_wins() {
    const FRAMES_PER_CHANNEL: usize = 2_000;

    let store = Arc::new(TelemetryStore::new());
    let device = DeviceAddress::from_wire(42);
    let payload_a = uniform_payload(70);
    let payload_b = uniform_payload(90);
    let expected_a = TelemetrySample::from(payload_a);
    let expected_b = TelemetrySample::from(payload_b);

    let channels: Vec<_> = [("esc1", payload_a), ("esc2", payload_b)]
        .into_iter()
        .map(|(name, payload)| {
            let store = Arc::clone(&store);
            let frame = telemetry_frame(42, &payload);
            thread::spawn(move || {
                let mut reader = ChannelReader::new(name, store);
                for _ in 0..FRAMES_PER_CHANNEL {
                    reader.feed(&frame);
                }
                reader.stats()
            })
        })
        .collect();

    let observer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..FRAMES_PER_CHANNEL {
                let sample = store.snapshot(device).sample;
                assert!(
                    sample == expected_a || sample == expected_b || sample == TelemetrySample::default(),
                    "sample mixes fields from different frames: {:?}",
                    sample
                );
            }
        })
    };

    for channel in channels {
        let stats = channel.join().unwrap();
        assert_eq!(stats.frames_accepted, FRAMES_PER_CHANNEL as u64);
    }
    observer.join().unwrap();

    let slot = store.snapshot(device);
    assert!(slot.sample == expected_a || slot.sample == expected_b);
    assert_eq!(slot.counters.frames_accepted, 2 * FRAMES_PER_CHANNEL as u64);
    assert_eq!(slot.counters.frames_rejected, 0);
}
