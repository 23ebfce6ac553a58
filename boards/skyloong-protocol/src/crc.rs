//! CRC-16/CCITT-FALSE checksum implementation.
//!
//! Polynomial: 0x1021, Initial: 0xFFFF, No reflection, No final XOR

/// Calculate CRC-16/CCITT-FALSE checksum
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for byte in data {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}
