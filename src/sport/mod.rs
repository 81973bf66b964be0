//! # S.Port Protocol Module
//!
//! Implementation of the FrSky Smart Port (S.Port) downlink framing used to
//! push sensor values to a Taranis receiver.
//!
//! This module handles:
//! - Sensor value ids and frame constants
//! - Additive checksum calculation
//! - Data frame encoding with byte stuffing

pub mod protocol;
pub mod encoder;
pub mod crc;
