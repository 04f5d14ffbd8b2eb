//! # Telemetry Module
//!
//! Holds the latest telemetry per ESC and turns it into report rows.
//!
//! This module handles:
//! - The shared per-device telemetry table
//! - Selecting which devices to report (with a heartbeat fallback)
//! - Rendering rows as CSV / JSON Lines
//! - Recording rows to rotating session files

pub mod store;
pub mod report;
pub mod logger;
