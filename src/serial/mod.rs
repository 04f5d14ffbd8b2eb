//! # Serial Communication Module
//!
//! Handles the serial links to the ESCs.
//!
//! This module handles:
//! - Opening a channel's UART (8N1, no flow control)
//! - Auto-detecting USB serial adapters
//! - Feeding received bytes to the frame reassembler and decoder
//! - Reopening a channel after errors or disconnects

pub mod reader;

use std::sync::Arc;

use tokio::time::{sleep, Duration};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::config::{ChannelConfig, SerialConfig, AUTO_PORT};
use crate::error::{EscTelemetryError, Result};
use crate::telemetry::store::TelemetryStore;
use reader::ChannelReader;

/// Device paths probed for `port = "auto"` (in order of preference)
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters
    "/dev/ttyACM0", // USB CDC devices
];

/// ESC telemetry serial port
pub struct EscSerial {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
}

impl std::fmt::Debug for EscSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl EscSerial {
    /// Open the port configured for a channel
    ///
    /// # Errors
    ///
    /// Returns error if the port (or, for `"auto"`, every candidate) fails to open
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use esc_telemetry::config::ChannelConfig;
    /// use esc_telemetry::serial::EscSerial;
    ///
    /// let channel = ChannelConfig {
    ///     name: "esc1".to_string(),
    ///     port: "auto".to_string(),
    ///     baud_rate: 115200,
    /// };
    /// let serial = EscSerial::open(&channel)?;
    /// println!("Connected to: {}", serial.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(channel: &ChannelConfig) -> Result<Self> {
        if channel.port == AUTO_PORT {
            Self::open_with_paths(DEFAULT_DEVICE_PATHS, channel.baud_rate)
        } else {
            Self::open_with_paths(&[channel.port.as_str()], channel.baud_rate)
        }
    }

    /// Open the first device path that works
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyUSB0"])
    /// * `baud_rate` - Line speed
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Opened ESC telemetry port {} at {} baud", path, baud_rate);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(EscTelemetryError::SerialPortNotFound(paths.join(", ")))
    }

    /// Open a specific serial port with telemetry line settings
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| EscTelemetryError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Mutable access to the underlying byte stream
    pub fn stream_mut(&mut self) -> &mut tokio_serial::SerialStream {
        &mut self.port
    }
}

/// Read one channel for the lifetime of the process
///
/// The port is reopened after open failures, read errors and end of stream,
/// waiting `reconnect_interval_ms` between attempts. A partially received
/// frame is dropped on reconnect.
pub async fn run_channel(channel: ChannelConfig, serial: SerialConfig, store: Arc<TelemetryStore>) {
    let mut reader = ChannelReader::new(channel.name.clone(), store);
    let retry = Duration::from_millis(serial.reconnect_interval_ms);

    loop {
        match EscSerial::open(&channel) {
            Ok(mut port) => {
                info!(channel = %channel.name, "Reading telemetry from {}", port.device_path());
                reader.reset();

                match reader.run(port.stream_mut(), serial.read_buffer_size).await {
                    Ok(()) => warn!(channel = %channel.name, "Serial port closed"),
                    Err(e) => warn!(channel = %channel.name, "Serial read failed: {}", e),
                }
                debug!(channel = %channel.name, stats = ?reader.stats(), "Channel statistics");
            }
            Err(e) => {
                warn!(channel = %channel.name, "{}", e);
            }
        }

        sleep(retry).await;
    }
}
