//! # OpenYGE Frame Encoder
//!
//! Builds wire-exact OpenYGE frames. The collector only receives telemetry,
//! so this is used to replay captured values and to exercise the decoder.

use super::crc::crc16_ccitt;
use super::protocol::*;
use crate::error::{EscTelemetryError, Result};

/// Encode an arbitrary OpenYGE frame
///
/// # Arguments
///
/// * `version` - Protocol version; selects the 4- or 6-byte header
/// * `frame_type` - Frame type byte (not validated, so tests can build bad frames)
/// * `device` - Device address byte (dropped for legacy versions)
/// * `payload` - Payload bytes
///
/// # Returns
///
/// * `Result<Vec<u8>>` - Complete frame: header + payload + CRC16 (little-endian)
///
/// # Errors
///
/// Returns error if the frame would exceed [`OPENYGE_MAX_FRAME_LENGTH`]
pub fn encode_frame(version: u8, frame_type: u8, device: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let header_len = header_length(version);
    let total = header_len + payload.len() + OPENYGE_CRC_LENGTH;

    if total > OPENYGE_MAX_FRAME_LENGTH {
        return Err(EscTelemetryError::Protocol(format!(
            "Frame size {} exceeds maximum {}",
            total, OPENYGE_MAX_FRAME_LENGTH
        )));
    }

    let mut frame = Vec::with_capacity(total);
    frame.push(OPENYGE_SYNC_BYTE);
    frame.push(version);
    frame.push(frame_type);
    frame.push(total as u8);
    if header_len == OPENYGE_HEADER_LENGTH {
        frame.push(0x00); // reserved
        frame.push(device);
    }
    frame.extend_from_slice(payload);

    // CRC covers sync byte through payload
    let crc = crc16_ccitt(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());

    Ok(frame)
}

/// Encode a telemetry frame
///
/// # Examples
///
/// ```
/// use esc_telemetry::openyge::encoder::encode_telemetry_frame;
/// use esc_telemetry::openyge::protocol::{DeviceAddress, FrameType, TelemetryPayload};
///
/// let frame = encode_telemetry_frame(
///     3,
///     FrameType::TelemetryAuto,
///     DeviceAddress::from_wire(1),
///     &TelemetryPayload::default(),
/// )?;
/// assert_eq!(frame.len(), 30);
/// # Ok::<(), esc_telemetry::error::EscTelemetryError>(())
/// ```
pub fn encode_telemetry_frame(
    version: u8,
    frame_type: FrameType,
    device: DeviceAddress,
    payload: &TelemetryPayload,
) -> Result<Vec<u8>> {
    encode_frame(version, frame_type.as_byte(), device.value(), &payload.to_bytes())
}
