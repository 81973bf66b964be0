//! # S.Port Frame Encoder
//!
//! Encodes sensor values into S.Port data frames.

use bytes::{BufMut, Bytes, BytesMut};

use super::crc::sport_checksum;
use super::protocol::*;

/// Encode a sensor value into a complete S.Port data frame
///
/// # Arguments
///
/// * `id` - Sensor value id (e.g. `SPORT_CURR_ID`)
/// * `value` - Encoded 32-bit value
/// * `more` - Prefix the frame with the poll prelude so the receiver takes it
///   as the next reply of the running polling cycle
///
/// # Returns
///
/// * `Bytes` - Wire bytes: optional prelude, then the stuffed frame
///
/// # Examples
///
/// ```
/// use sport_telemetry::sport::encoder::encode_data_frame;
/// use sport_telemetry::sport::protocol::SPORT_CURR_ID;
///
/// let frame = encode_data_frame(SPORT_CURR_ID, 10, false);
/// assert_eq!(&frame[..], &[0x10, 0x00, 0x02, 0x0A, 0x00, 0x00, 0x00, 0xE3]);
/// ```
pub fn encode_data_frame(id: u16, value: u32, more: bool) -> Bytes {
    let mut raw = [0u8; SPORT_DATA_FRAME_SIZE];
    raw[0] = SPORT_DATA_FRAME;
    raw[1..3].copy_from_slice(&id.to_le_bytes());
    raw[3..7].copy_from_slice(&value.to_le_bytes());
    raw[7] = sport_checksum(&raw[..7]);

    // Worst case every byte is stuffed
    let mut out = BytesMut::with_capacity(2 + SPORT_DATA_FRAME_SIZE * 2);
    if more {
        out.put_u8(SPORT_POLL_REQUEST);
        out.put_u8(SPORT_SENSOR_ID);
    }
    for &byte in raw.iter() {
        put_stuffed(&mut out, byte);
    }

    out.freeze()
}

/// Append one byte, escaping frame markers
fn put_stuffed(out: &mut BytesMut, byte: u8) {
    if byte == SPORT_POLL_REQUEST || byte == SPORT_BYTE_STUFF {
        out.put_u8(SPORT_BYTE_STUFF);
        out.put_u8(byte ^ SPORT_STUFF_MASK);
    } else {
        out.put_u8(byte);
    }
}
