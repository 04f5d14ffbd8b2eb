//! # OpenYGE Frame Decoder
//!
//! Validates a complete frame and converts its payload into a
//! [`TelemetrySample`]. Decoding is pure: no I/O, no state between calls.

use thiserror::Error;

use super::crc::crc16_ccitt;
use super::protocol::*;

/// Why a frame was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Shorter than legacy header + checksum
    #[error("frame too short ({0} bytes)")]
    FrameTooShort(usize),

    /// First byte is not the sync byte
    #[error("invalid sync byte 0x{0:02X}")]
    BadSync(u8),

    /// Length field disagrees with the frame size
    #[error("declared length {declared} but frame is {actual} bytes")]
    LengthMismatch { declared: u8, actual: usize },

    /// Versioned header does not fit in the frame
    #[error("frame of {0} bytes cannot hold the versioned header")]
    HeaderTooShort(usize),

    /// Trailing CRC does not match the frame contents
    #[error("CRC mismatch: expected 0x{expected:04X}, got 0x{received:04X}")]
    ChecksumMismatch { expected: u16, received: u16 },

    /// Not a telemetry frame
    #[error("unsupported frame type 0x{0:02X}")]
    UnsupportedFrameType(u8),

    /// Payload shorter than the telemetry layout
    #[error("payload too short ({0} bytes)")]
    PayloadTooShort(usize),
}

/// A rejected frame, attributed to a device where the frame allowed it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("frame from device {address} rejected: {reason}")]
pub struct Rejection {
    /// Attributed device, `DeviceAddress::UNKNOWN` before the address is known
    pub address: DeviceAddress,

    /// Rejection reason
    pub reason: RejectReason,
}

impl Rejection {
    fn unattributed(reason: RejectReason) -> Self {
        Self {
            address: DeviceAddress::UNKNOWN,
            reason,
        }
    }
}

/// A successfully decoded telemetry frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Protocol version from the header
    pub version: u8,

    /// Auto-report or polled response
    pub frame_type: FrameType,

    /// Source device
    pub address: DeviceAddress,

    /// Converted telemetry
    pub sample: TelemetrySample,

    /// Total frame length in bytes
    pub frame_length: usize,
}

/// Decode a complete OpenYGE frame
///
/// # Arguments
///
/// * `frame` - Complete frame bytes (sync, header, payload, crc)
///
/// # Returns
///
/// * `Result<DecodedFrame, Rejection>` - Decoded telemetry, or the rejection
///   with the device it should be counted against
///
/// # Examples
///
/// ```
/// use esc_telemetry::openyge::decoder::decode_frame;
/// use esc_telemetry::openyge::encoder::encode_telemetry_frame;
/// use esc_telemetry::openyge::protocol::{DeviceAddress, FrameType, TelemetryPayload};
///
/// let payload = TelemetryPayload { temperature: 60, ..Default::default() };
/// let frame = encode_telemetry_frame(3, FrameType::TelemetryAuto, DeviceAddress::from_wire(7), &payload)?;
///
/// let decoded = decode_frame(&frame).unwrap();
/// assert_eq!(decoded.address.value(), 7);
/// assert_eq!(decoded.sample.temp_c_x10, 200);
/// # Ok::<(), esc_telemetry::error::EscTelemetryError>(())
/// ```
pub fn decode_frame(frame: &[u8]) -> Result<DecodedFrame, Rejection> {
    let len = frame.len();

    if len < OPENYGE_MIN_FRAME_LENGTH {
        return Err(Rejection::unattributed(RejectReason::FrameTooShort(len)));
    }

    if frame[0] != OPENYGE_SYNC_BYTE {
        return Err(Rejection::unattributed(RejectReason::BadSync(frame[0])));
    }

    let version = frame[1];
    let frame_type = frame[2];
    let declared = frame[3];
    let header_len = header_length(version);

    if declared as usize != len {
        return Err(Rejection::unattributed(RejectReason::LengthMismatch {
            declared,
            actual: len,
        }));
    }

    if len < header_len + OPENYGE_CRC_LENGTH {
        return Err(Rejection::unattributed(RejectReason::HeaderTooShort(len)));
    }

    // From here on every rejection is counted against this device
    let address = if version >= OPENYGE_VERSIONED_HEADER_MIN_VERSION {
        DeviceAddress::from_wire(frame[5])
    } else {
        DeviceAddress::UNKNOWN
    };
    let reject = |reason| Rejection { address, reason };

    let body_len = len - OPENYGE_CRC_LENGTH;
    let received = u16::from_le_bytes([frame[body_len], frame[body_len + 1]]);
    let expected = crc16_ccitt(&frame[..body_len]);
    if expected != received {
        return Err(reject(RejectReason::ChecksumMismatch { expected, received }));
    }

    let frame_type = FrameType::from_byte(frame_type)
        .ok_or_else(|| reject(RejectReason::UnsupportedFrameType(frame_type)))?;

    let payload = &frame[header_len..body_len];
    let raw = TelemetryPayload::parse(payload)
        .ok_or_else(|| reject(RejectReason::PayloadTooShort(payload.len())))?;

    Ok(DecodedFrame {
        version,
        frame_type,
        address,
        sample: TelemetrySample::from(raw),
        frame_length: len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openyge::encoder::{encode_frame, encode_telemetry_frame};

    fn sample_payload() -> TelemetryPayload {
        TelemetryPayload {
            temperature: 60,
            voltage: 2512,
            current: 340,
            consumption: 150,
            rpm: 1234,
            pwm: 42,
            throttle: 40,
            bec_voltage: 7400,
            bec_current: 2100,
            bec_temp: 75,
            status: 0x10,
        }
    }

    fn valid_frame(version: u8, device: u8) -> Vec<u8> {
        encode_telemetry_frame(
            version,
            FrameType::TelemetryAuto,
            DeviceAddress::from_wire(device),
            &sample_payload(),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_versioned_frame() {
        let frame = valid_frame(3, 7);
        let decoded = decode_frame(&frame).unwrap();

        assert_eq!(decoded.version, 3);
        assert_eq!(decoded.frame_type, FrameType::TelemetryAuto);
        assert_eq!(decoded.address.value(), 7);
        assert_eq!(decoded.frame_length, frame.len());

        let sample = decoded.sample;
        assert_eq!(sample.temp_c_x10, 200);
        assert_eq!(sample.voltage_mv, 25_120);
        assert_eq!(sample.current_ma, 3_400);
        assert_eq!(sample.consumption_mah, 150);
        assert_eq!(sample.rpm, 12_340);
        assert_eq!(sample.pwm_x10, 420);
        assert_eq!(sample.throttle_x10, 400);
        assert_eq!(sample.bec_voltage_mv, 7400);
        assert_eq!(sample.bec_current_ma, 2100);
        assert_eq!(sample.bec_temp_c_x10, 350);
        assert_eq!(sample.status, 0x10);
    }

    #[test]
    fn test_decode_legacy_frame_uses_unknown_device() {
        let frame = valid_frame(2, 7);
        assert_eq!(frame.len(), 4 + 22 + 2);

        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded.address, DeviceAddress::UNKNOWN);
        assert_eq!(decoded.sample.temp_c_x10, 200);
    }

    #[test]
    fn test_decode_polled_response() {
        let frame = encode_telemetry_frame(
            3,
            FrameType::TelemetryResponse,
            DeviceAddress::from_wire(2),
            &sample_payload(),
        )
        .unwrap();

        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded.frame_type, FrameType::TelemetryResponse);
    }

    #[test]
    fn test_decode_out_of_range_device_clamped() {
        let frame = encode_frame(3, OPENYGE_FRAMETYPE_TELE_AUTO, 200, &sample_payload().to_bytes()).unwrap();
        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded.address, DeviceAddress::UNKNOWN);
    }

    #[test]
    fn test_decode_frame_too_short() {
        let err = decode_frame(&[0xA5, 0x03, 0x00]).unwrap_err();
        assert_eq!(err.reason, RejectReason::FrameTooShort(3));
        assert_eq!(err.address, DeviceAddress::UNKNOWN);
    }

    #[test]
    fn test_decode_invalid_sync() {
        let mut frame = valid_frame(3, 7);
        frame[0] = 0xFF;
        let err = decode_frame(&frame).unwrap_err();
        assert_eq!(err.reason, RejectReason::BadSync(0xFF));
        assert_eq!(err.address, DeviceAddress::UNKNOWN);
    }

    #[test]
    fn test_decode_length_mismatch() {
        let mut frame = valid_frame(3, 7);
        frame.push(0x00);
        let err = decode_frame(&frame).unwrap_err();
        assert!(matches!(err.reason, RejectReason::LengthMismatch { .. }));
        assert_eq!(err.address, DeviceAddress::UNKNOWN);
    }

    #[test]
    fn test_decode_versioned_header_too_short() {
        // Version 3 needs 6 header bytes + 2 CRC bytes
        let frame = [0xA5, 0x03, 0x00, 0x06, 0x00, 0x00];
        let err = decode_frame(&frame).unwrap_err();
        assert_eq!(err.reason, RejectReason::HeaderTooShort(6));
    }

    #[test]
    fn test_decode_crc_error_attributed_to_device() {
        let mut frame = valid_frame(3, 9);
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;

        let err = decode_frame(&frame).unwrap_err();
        assert!(matches!(err.reason, RejectReason::ChecksumMismatch { .. }));
        assert_eq!(err.address.value(), 9);
    }

    #[test]
    fn test_decode_unsupported_frame_type() {
        let frame = encode_frame(3, 0x01, 5, &sample_payload().to_bytes()).unwrap();
        let err = decode_frame(&frame).unwrap_err();
        assert_eq!(err.reason, RejectReason::UnsupportedFrameType(0x01));
        assert_eq!(err.address.value(), 5);
    }

    #[test]
    fn test_decode_payload_too_short() {
        let frame = encode_frame(3, OPENYGE_FRAMETYPE_TELE_AUTO, 4, &[0u8; 21]).unwrap();
        let err = decode_frame(&frame).unwrap_err();
        assert_eq!(err.reason, RejectReason::PayloadTooShort(21));
        assert_eq!(err.address.value(), 4);
    }

    #[test]
    fn test_decode_accepts_longer_payload() {
        let mut payload = sample_payload().to_bytes().to_vec();
        payload.extend_from_slice(&[0xEE; 4]);
        let frame = encode_frame(3, OPENYGE_FRAMETYPE_TELE_RESP, 1, &payload).unwrap();

        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded.frame_length, 6 + 26 + 2);
        assert_eq!(decoded.sample.rpm, 12_340);
    }

    #[test]
    fn test_rejection_message() {
        let rejection = Rejection {
            address: DeviceAddress::from_wire(3),
            reason: RejectReason::UnsupportedFrameType(0x07),
        };
        assert_eq!(
            rejection.to_string(),
            "frame from device 3 rejected: unsupported frame type 0x07"
        );
    }
}
