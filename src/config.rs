//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Only platform concerns are configurable (ports, cadences, recording).
//! Protocol and policy thresholds are constants in their modules.

use serde::de::Error;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{EscTelemetryError, Result};

/// Port value that selects auto-detection
pub const AUTO_PORT: &str = "auto";

/// Supported UART baud rates
const SUPPORTED_BAUD_RATES: &[u32] = &[9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600];

/// Supported log levels
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelConfig>,

    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for a daily rolling log file; stderr only if unset
    #[serde(default)]
    pub dir: Option<String>,
}

/// One telemetry input channel
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChannelConfig {
    pub name: String,

    /// Device path, or `"auto"` to probe common USB serial paths
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Serial reader behaviour shared by all channels
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SerialConfig {
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
}

/// Report output configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ReportConfig {
    #[serde(default = "default_report_interval_ms")]
    pub interval_ms: u64,

    /// Print CSV rows on stdout
    #[serde(default = "default_report_stdout")]
    pub stdout: bool,
}

/// Session file format
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionFormat {
    Csv,
    Jsonl,
}

/// Session recording configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SessionConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_session_dir")]
    pub dir: String,

    #[serde(default = "default_session_format")]
    pub format: SessionFormat,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

// Default value functions
fn default_log_level() -> String { "info".to_string() }

fn default_channels() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig { name: "esc1".to_string(), port: "/dev/ttyUSB0".to_string(), baud_rate: default_baud_rate() },
        ChannelConfig { name: "esc2".to_string(), port: "/dev/ttyUSB1".to_string(), baud_rate: default_baud_rate() },
    ]
}
fn default_baud_rate() -> u32 { 115200 }

fn default_reconnect_interval_ms() -> u64 { 1000 }
fn default_read_buffer_size() -> usize { 256 }

fn default_report_interval_ms() -> u64 { 500 }
fn default_report_stdout() -> bool { true }

fn default_session_dir() -> String { "./sessions".to_string() }
fn default_session_format() -> SessionFormat { SessionFormat::Csv }
fn default_max_records_per_file() -> usize { 100_000 }
fn default_max_files_to_keep() -> usize { 10 }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), dir: None }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            reconnect_interval_ms: default_reconnect_interval_ms(),
            read_buffer_size: default_read_buffer_size(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_report_interval_ms(),
            stdout: default_report_stdout(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_session_dir(),
            format: default_session_format(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            channels: default_channels(),
            serial: SerialConfig::default(),
            report: ReportConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> EscTelemetryError {
    EscTelemetryError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use esc_telemetry::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid("logging level must be one of: trace, debug, info, warn, error"));
        }

        if matches!(&self.logging.dir, Some(dir) if dir.is_empty()) {
            return Err(invalid("logging dir cannot be empty when set"));
        }

        if self.channels.is_empty() {
            return Err(invalid("at least one channel must be configured"));
        }

        let mut names = HashSet::new();
        for channel in &self.channels {
            if channel.name.is_empty() {
                return Err(invalid("channel name cannot be empty"));
            }
            if !names.insert(channel.name.as_str()) {
                return Err(invalid(format!("duplicate channel name '{}'", channel.name)));
            }
            if channel.port.is_empty() {
                return Err(invalid(format!("channel '{}' port cannot be empty", channel.name)));
            }
            if !SUPPORTED_BAUD_RATES.contains(&channel.baud_rate) {
                return Err(invalid(format!(
                    "channel '{}' baud_rate must be one of: {:?}",
                    channel.name, SUPPORTED_BAUD_RATES
                )));
            }
        }

        if self.serial.reconnect_interval_ms == 0 || self.serial.reconnect_interval_ms > 60000 {
            return Err(invalid("reconnect_interval_ms must be between 1 and 60000"));
        }

        if self.serial.read_buffer_size == 0 || self.serial.read_buffer_size > 4096 {
            return Err(invalid("read_buffer_size must be between 1 and 4096"));
        }

        if self.report.interval_ms < 10 || self.report.interval_ms > 60000 {
            return Err(invalid("report interval_ms must be between 10 and 60000"));
        }

        if self.session.enabled && self.session.dir.is_empty() {
            return Err(invalid("session dir cannot be empty when enabled"));
        }

        if self.session.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.session.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        Ok(())
    }
}
