//! # S.Port Protocol Constants
//!
//! Core protocol definitions for FrSky S.Port communication.

/// Poll request byte sent by the receiver before each sensor slot
pub const SPORT_POLL_REQUEST: u8 = 0x7E;

/// Physical sensor id announced in the poll prelude
pub const SPORT_SENSOR_ID: u8 = 0x98;

/// Data frame header byte
pub const SPORT_DATA_FRAME: u8 = 0x10;

/// Byte stuffing escape marker
pub const SPORT_BYTE_STUFF: u8 = 0x7D;

/// Value XORed into a stuffed byte
pub const SPORT_STUFF_MASK: u8 = 0x20;

/// Unstuffed data frame size: header(1) + id(2) + value(4) + checksum(1)
pub const SPORT_DATA_FRAME_SIZE: usize = 8;

/// S.Port link baud rate
pub const SPORT_BAUD_RATE: u32 = 57_600;

/// Minimum interval between receiver polls in microseconds.
///
/// Declared for the polled sibling protocol. Nothing in the push scheduler
/// reads it; selection and sending are driven by the tick interval only.
pub const SPORT_MINIMUM_POLL_INTERVAL_US: u32 = 10_000;

/// Altitude in centimetres
pub const SPORT_ALT_ID: u16 = 0x0100;

/// Vertical speed in cm/s
pub const SPORT_VARIO_ID: u16 = 0x0110;

/// Battery current in 0.1 A
pub const SPORT_CURR_ID: u16 = 0x0200;

/// Per-cell battery voltages
pub const SPORT_CELLS_ID: u16 = 0x0300;

/// RPM slot, reused to carry flight status
pub const SPORT_RPM_ID: u16 = 0x0500;

/// Remaining battery capacity in percent
pub const SPORT_FUEL_ID: u16 = 0x0600;

/// Link signal strength
pub const SPORT_RSSI_ID: u16 = 0xF101;
