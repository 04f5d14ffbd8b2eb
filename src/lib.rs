//! # ESC Telemetry Library
//!
//! Collect OpenYGE telemetry from electronic speed controllers over several
//! serial channels.
//!
//! This library provides frame reassembly and decoding for the OpenYGE
//! protocol, a shared per-device telemetry table, and the reporting and
//! status policies that read from it.

pub mod config;
pub mod error;
pub mod openyge;
pub mod serial;
pub mod status;
pub mod telemetry;
