//! CRC16 checksum used by every frame on the host link.
//!
//! The algorithm is CRC-16/MODBUS: initial value `0xFFFF`, reflected
//! polynomial `0xA001`, no final XOR.  The checksum is transmitted
//! big-endian (high byte first) right after the bytes it covers.

const POLYNOMIAL: u16 = 0xA001;

/// Computes the CRC16 of `data`.
///
/// # Examples
///
/// ```rust
/// use hid_bridge_core::protocol::crc16;
///
/// // Standard check value for the ASCII string "123456789".
/// assert_eq!(crc16(b"123456789"), 0x4B37);
/// ```
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 0x0001 == 0 {
                crc >>= 1;
            } else {
                crc = (crc >> 1) ^ POLYNOMIAL;
            }
        }
    }
    crc
}

/// Joins a big-endian byte pair into a `u16`.
#[inline]
pub fn merge16(high: u8, low: u8) -> u16 {
    u16::from_be_bytes([high, low])
}

/// Splits a `u16` into its big-endian byte pair.
#[inline]
pub fn split16(value: u16) -> (u8, u8) {
    let [high, low] = value.to_be_bytes();
    (high, low)
}
