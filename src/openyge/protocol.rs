//! # OpenYGE Protocol Constants and Types
//!
//! Core protocol definitions for OpenYGE ESC telemetry.
//!
//! ## Frame Layout
//!
//! ```text
//! +------+---------+------+--------+----------+--------+---------+-------+
//! | SYNC | VERSION | TYPE | LENGTH | RESERVED | DEVICE | PAYLOAD | CRC16 |
//! +------+---------+------+--------+----------+--------+---------+-------+
//!  0xA5     1B       1B      1B        1B         1B     >= 22B    2B LE
//! ```
//!
//! `RESERVED` and `DEVICE` are only present for protocol version 3 and later;
//! older versions use the 4-byte legacy header. `LENGTH` is the total frame
//! length, sync byte through checksum.

/// OpenYGE frame sync byte (always 0xA5)
pub const OPENYGE_SYNC_BYTE: u8 = 0xA5;

/// Unsolicited telemetry report frame type
pub const OPENYGE_FRAMETYPE_TELE_AUTO: u8 = 0x00;

/// Polled telemetry response frame type
pub const OPENYGE_FRAMETYPE_TELE_RESP: u8 = 0x02;

/// Header length for protocol version 3 and later
pub const OPENYGE_HEADER_LENGTH: usize = 6;

/// Header length for protocol versions before 3
pub const OPENYGE_HEADER_LENGTH_LEGACY: usize = 4;

/// First protocol version carrying the extended header
pub const OPENYGE_VERSIONED_HEADER_MIN_VERSION: u8 = 3;

/// Trailing checksum length
pub const OPENYGE_CRC_LENGTH: usize = 2;

/// Smallest frame the length field may declare
pub const OPENYGE_MIN_FRAME_LENGTH: usize = OPENYGE_HEADER_LENGTH_LEGACY + OPENYGE_CRC_LENGTH;

/// Largest frame accepted (reassembly buffer capacity)
pub const OPENYGE_MAX_FRAME_LENGTH: usize = 128;

/// Minimum telemetry payload size
pub const OPENYGE_MIN_PAYLOAD_SIZE: usize = 22;

/// Number of addressable devices (addresses 0-127)
pub const MAX_DEVICES: usize = 128;

/// Raw temperature offset (raw 40 == 0 °C)
pub const OPENYGE_TEMP_OFFSET: i16 = 40;

/// Header length used by a given protocol version
pub fn header_length(version: u8) -> usize {
    if version >= OPENYGE_VERSIONED_HEADER_MIN_VERSION {
        OPENYGE_HEADER_LENGTH
    } else {
        OPENYGE_HEADER_LENGTH_LEGACY
    }
}

/// Device address in the range 0-127
///
/// Frames that carry no address, or an address outside the table, are mapped
/// to [`DeviceAddress::UNKNOWN`]. This conflates distinct unaddressed sources;
/// the policy lives here alone so it can be replaced without touching the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceAddress(u8);

impl DeviceAddress {
    /// Fallback address for unaddressed or out-of-range devices
    pub const UNKNOWN: DeviceAddress = DeviceAddress(0);

    /// Map an address byte from the wire, clamping out-of-range values to `UNKNOWN`
    pub fn from_wire(raw: u8) -> Self {
        if (raw as usize) < MAX_DEVICES {
            DeviceAddress(raw)
        } else {
            Self::UNKNOWN
        }
    }

    /// Address for a table index, if in range
    pub fn new(index: usize) -> Option<Self> {
        if index < MAX_DEVICES {
            Some(DeviceAddress(index as u8))
        } else {
            None
        }
    }

    /// Slot index of this address
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw address value
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for DeviceAddress {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl std::fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Recognized telemetry frame types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// Unsolicited auto-report
    TelemetryAuto,
    /// Response to a poll
    TelemetryResponse,
}

impl FrameType {
    /// Classify a frame type byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            OPENYGE_FRAMETYPE_TELE_AUTO => Some(FrameType::TelemetryAuto),
            OPENYGE_FRAMETYPE_TELE_RESP => Some(FrameType::TelemetryResponse),
            _ => None,
        }
    }

    /// Wire value
    pub fn as_byte(self) -> u8 {
        match self {
            FrameType::TelemetryAuto => OPENYGE_FRAMETYPE_TELE_AUTO,
            FrameType::TelemetryResponse => OPENYGE_FRAMETYPE_TELE_RESP,
        }
    }
}

/// Telemetry payload fields in wire units
///
/// | Offset | Field | Wire unit |
/// |--------|-------|-----------|
/// | 0 | reserved | - |
/// | 1 | temperature | °C + 40 |
/// | 2-3 | voltage | 0.01 V |
/// | 4-5 | current | 0.01 A |
/// | 6-7 | consumption | mAh |
/// | 8-9 | rpm | 0.1 eRPM |
/// | 10 | pwm | % (signed) |
/// | 11 | throttle | % (signed) |
/// | 12-13 | bec_voltage | mV |
/// | 14-15 | bec_current | mA |
/// | 16 | bec_temp | °C + 40 |
/// | 17 | status | bitfield |
///
/// Multi-byte fields are little-endian. Bytes 18-21 are present on the wire
/// but not used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetryPayload {
    pub temperature: u8,
    pub voltage: u16,
    pub current: u16,
    pub consumption: u16,
    pub rpm: u16,
    pub pwm: i8,
    pub throttle: i8,
    pub bec_voltage: u16,
    pub bec_current: u16,
    pub bec_temp: u8,
    pub status: u8,
}

impl TelemetryPayload {
    /// Parse the wire payload; `None` if shorter than [`OPENYGE_MIN_PAYLOAD_SIZE`]
    pub fn parse(payload: &[u8]) -> Option<Self> {
        if payload.len() < OPENYGE_MIN_PAYLOAD_SIZE {
            return None;
        }

        let le16 = |at: usize| u16::from_le_bytes([payload[at], payload[at + 1]]);

        Some(Self {
            temperature: payload[1],
            voltage: le16(2),
            current: le16(4),
            consumption: le16(6),
            rpm: le16(8),
            pwm: payload[10] as i8,
            throttle: payload[11] as i8,
            bec_voltage: le16(12),
            bec_current: le16(14),
            bec_temp: payload[16],
            status: payload[17],
        })
    }

    /// Serialize into a minimum-size wire payload
    pub fn to_bytes(&self) -> [u8; OPENYGE_MIN_PAYLOAD_SIZE] {
        let mut out = [0u8; OPENYGE_MIN_PAYLOAD_SIZE];
        out[1] = self.temperature;
        out[2..4].copy_from_slice(&self.voltage.to_le_bytes());
        out[4..6].copy_from_slice(&self.current.to_le_bytes());
        out[6..8].copy_from_slice(&self.consumption.to_le_bytes());
        out[8..10].copy_from_slice(&self.rpm.to_le_bytes());
        out[10] = self.pwm as u8;
        out[11] = self.throttle as u8;
        out[12..14].copy_from_slice(&self.bec_voltage.to_le_bytes());
        out[14..16].copy_from_slice(&self.bec_current.to_le_bytes());
        out[16] = self.bec_temp;
        out[17] = self.status;
        out
    }
}

/// Latest telemetry for one ESC, in reporting units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetrySample {
    /// Raw 0.1 eRPM value × 10
    pub rpm: u32,

    /// Bus voltage in millivolts
    pub voltage_mv: i32,

    /// Bus current in milliamps
    pub current_ma: i32,

    /// Consumed charge in mAh
    pub consumption_mah: u32,

    /// Commanded PWM duty in tenths of a percent
    pub pwm_x10: i16,

    /// Throttle command in tenths of a percent
    pub throttle_x10: i16,

    /// ESC temperature in tenths of a degree Celsius
    pub temp_c_x10: i16,

    /// BEC voltage in millivolts
    pub bec_voltage_mv: i32,

    /// BEC current in milliamps
    pub bec_current_ma: i32,

    /// BEC temperature in tenths of a degree Celsius
    pub bec_temp_c_x10: i16,

    /// Status bitfield, uninterpreted
    pub status: u8,
}

/// Convert an offset temperature byte to tenths of a degree
fn temp_x10(raw: u8) -> i16 {
    (raw as i16 - OPENYGE_TEMP_OFFSET) * 10
}

impl From<TelemetryPayload> for TelemetrySample {
    fn from(raw: TelemetryPayload) -> Self {
        Self {
            rpm: raw.rpm as u32 * 10,
            voltage_mv: raw.voltage as i32 * 10,
            current_ma: raw.current as i32 * 10,
            consumption_mah: raw.consumption as u32,
            pwm_x10: raw.pwm as i16 * 10,
            throttle_x10: raw.throttle as i16 * 10,
            temp_c_x10: temp_x10(raw.temperature),
            // BEC values are already mV / mA on the wire, unlike the main bus
            bec_voltage_mv: raw.bec_voltage as i32,
            bec_current_ma: raw.bec_current as i32,
            bec_temp_c_x10: temp_x10(raw.bec_temp),
            status: raw.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_constants() {
        assert_eq!(OPENYGE_SYNC_BYTE, 0xA5);
        assert_eq!(OPENYGE_FRAMETYPE_TELE_AUTO, 0x00);
        assert_eq!(OPENYGE_FRAMETYPE_TELE_RESP, 0x02);
        assert_eq!(OPENYGE_MIN_FRAME_LENGTH, 6);
        assert_eq!(OPENYGE_MAX_FRAME_LENGTH, 128);
    }

    #[test]
    fn test_header_length_by_version() {
        assert_eq!(header_length(0), 4);
        assert_eq!(header_length(2), 4);
        assert_eq!(header_length(3), 6);
        assert_eq!(header_length(255), 6);
    }

    #[test]
    fn test_device_address_clamps_out_of_range() {
        assert_eq!(DeviceAddress::from_wire(7).index(), 7);
        assert_eq!(DeviceAddress::from_wire(127).index(), 127);
        assert_eq!(DeviceAddress::from_wire(128), DeviceAddress::UNKNOWN);
        assert_eq!(DeviceAddress::from_wire(255), DeviceAddress::UNKNOWN);
        assert!(DeviceAddress::new(128).is_none());
    }

    #[test]
    fn test_frame_type_classification() {
        assert_eq!(FrameType::from_byte(0x00), Some(FrameType::TelemetryAuto));
        assert_eq!(FrameType::from_byte(0x02), Some(FrameType::TelemetryResponse));
        assert_eq!(FrameType::from_byte(0x01), None);
        assert_eq!(FrameType::TelemetryResponse.as_byte(), 0x02);
    }

    #[test]
    fn test_payload_too_short() {
        assert!(TelemetryPayload::parse(&[0u8; 21]).is_none());
        assert!(TelemetryPayload::parse(&[0u8; 22]).is_some());
    }

    #[test]
    fn test_payload_field_offsets() {
        let mut bytes = [0u8; 26];
        bytes[1] = 60;
        bytes[2..4].copy_from_slice(&1234u16.to_le_bytes());
        bytes[10] = 0xF6; // -10 %
        bytes[17] = 0x81;

        let payload = TelemetryPayload::parse(&bytes).unwrap();
        assert_eq!(payload.temperature, 60);
        assert_eq!(payload.voltage, 1234);
        assert_eq!(payload.pwm, -10);
        assert_eq!(payload.status, 0x81);
    }

    #[test]
    fn test_sample_unit_conversion() {
        let sample = TelemetrySample::from(TelemetryPayload {
            temperature: 60,
            voltage: 2220,
            current: 1550,
            consumption: 321,
            rpm: 4500,
            pwm: 55,
            throttle: -12,
            bec_voltage: 8400,
            bec_current: 1200,
            bec_temp: 30,
            status: 0x04,
        });

        assert_eq!(sample.temp_c_x10, 200);
        assert_eq!(sample.voltage_mv, 22_200);
        assert_eq!(sample.current_ma, 15_500);
        assert_eq!(sample.consumption_mah, 321);
        assert_eq!(sample.rpm, 45_000);
        assert_eq!(sample.pwm_x10, 550);
        assert_eq!(sample.throttle_x10, -120);
        assert_eq!(sample.bec_voltage_mv, 8400);
        assert_eq!(sample.bec_current_ma, 1200);
        assert_eq!(sample.bec_temp_c_x10, -100);
        assert_eq!(sample.status, 0x04);
    }
}
