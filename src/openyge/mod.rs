//! # OpenYGE Protocol Module
//!
//! Implementation of the OpenYGE ESC telemetry protocol.
//!
//! This module handles:
//! - Frame reassembly from a raw serial byte stream
//! - CRC16-CCITT checksum calculation
//! - Frame validation and telemetry decoding
//! - Frame encoding for replay and tests

pub mod protocol;
pub mod crc;
pub mod reassembler;
pub mod decoder;
pub mod encoder;
