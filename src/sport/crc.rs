//! # S.Port Checksum
//!
//! Additive checksum used by S.Port data frames.
//!
//! Each byte is added to a 16-bit accumulator, the carry is folded back into
//! the low byte, and the final byte is subtracted from 0xFF.

/// Calculate the S.Port checksum
///
/// # Arguments
///
/// * `data` - Unstuffed frame bytes (header + id + value)
///
/// # Returns
///
/// * `u8` - Checksum byte to append to the frame
///
/// # Examples
///
/// ```
/// use sport_telemetry::sport::crc::sport_checksum;
///
/// let frame = [0x10, 0x00, 0x02, 0x0A, 0x00, 0x00, 0x00];
/// assert_eq!(sport_checksum(&frame), 0xE3);
/// ```
pub fn sport_checksum(data: &[u8]) -> u8 {
    let mut crc: u16 = 0;

    for &byte in data {
        crc += byte as u16;
        crc += crc >> 8;
        crc &= 0x00FF;
    }

    0xFF - crc as u8
}
