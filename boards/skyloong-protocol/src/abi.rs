//! HID packet protocol implementation for Skyloong keyboards.
//!
//! Packet structure (65 bytes):
//! - Byte 0: Report id placeholder (always 0)
//! - Byte 1: Command byte
//! - Byte 2: Sub-command byte
//! - Bytes 3-6: Chunk header, u32 little-endian (address bits 0-23, length bits 24-31)
//! - Bytes 7-8: CRC16 of bytes 1..65 (little-endian), computed with this field zeroed
//! - Bytes 9+: Payload data

use std::fmt::Debug;

use skyloong_sync_core::{BoardError, Result};

use crate::crc::crc16;

/// Full transport size of a packet, including the report id
pub const PACKET_SIZE: usize = 65;
/// Offset of the chunk header
pub const HEADER_OFFSET: usize = 3;
/// Offset of the little-endian CRC field
pub const CRC_OFFSET: usize = 7;
/// Offset of the payload
pub const PAYLOAD_OFFSET: usize = 9;
/// Maximum payload bytes that fit into one packet
pub const PAYLOAD_CAPACITY: usize = PACKET_SIZE - PAYLOAD_OFFSET;

/// Largest address a chunk header can carry
pub const MAX_CHUNK_ADDRESS: u32 = 0x00FF_FFFF;

/// Command identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Device information queries
    Info = 0x01,
    /// Online/offline mode switch
    ModeSet = 0x0B,
    /// Keep-alive
    Ping = 0x0C,
    /// Led memory writes
    LedDefine = 0x1A,
}

impl Command {
    /// Decode a command byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Info),
            0x0B => Some(Self::ModeSet),
            0x0C => Some(Self::Ping),
            0x1A => Some(Self::LedDefine),
            _ => None,
        }
    }
}

/// Sub-command identifiers, grouped by command
pub mod sub {
    /// Sub-command for commands that take none
    pub const NONE: u8 = 0x00;

    pub mod info {
        /// Query the 32-bit model id
        pub const MODEL_ID: u8 = 0x08;
    }

    pub mod mode {
        /// Hand lighting back to the firmware
        pub const OFFLINE: u8 = 0x04;
        /// Host driven lighting
        pub const ONLINE: u8 = 0x05;
    }

    pub mod led_define {
        /// Write a chunk of the led memory image
        pub const SET: u8 = 0x01;
        /// Commit the written image
        pub const SAVE: u8 = 0x02;
    }
}

/// Address and length of a chunked led memory write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub address: u32,
    pub length: u8,
}

impl ChunkHeader {
    /// Create a header, rejecting values that cannot be packed without loss
    pub fn new(address: u32, length: usize) -> Result<Self> {
        if address > MAX_CHUNK_ADDRESS {
            return Err(BoardError::AddressOutOfRange(address));
        }
        if length > PAYLOAD_CAPACITY {
            return Err(BoardError::PayloadTooLarge {
                len: length,
                capacity: PAYLOAD_CAPACITY,
            });
        }
        Ok(Self {
            address,
            length: length as u8,
        })
    }

    /// Pack into the on-wire u32: address in the low 24 bits, length in the high byte
    pub fn pack(self) -> u32 {
        (self.address & MAX_CHUNK_ADDRESS) | ((self.length as u32) << 24)
    }

    /// Inverse of [`ChunkHeader::pack`]
    pub fn unpack(raw: u32) -> Self {
        Self {
            address: raw & MAX_CHUNK_ADDRESS,
            length: (raw >> 24) as u8,
        }
    }
}

/// A single framed packet, ready to be written to the device
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Packet([u8; PACKET_SIZE]);

impl Packet {
    pub fn as_bytes(&self) -> &[u8; PACKET_SIZE] {
        &self.0
    }

    pub fn command(&self) -> u8 {
        self.0[1]
    }

    pub fn sub_command(&self) -> u8 {
        self.0[2]
    }

    pub fn header(&self) -> ChunkHeader {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.0[HEADER_OFFSET..CRC_OFFSET]);
        ChunkHeader::unpack(u32::from_le_bytes(raw))
    }

    pub fn crc(&self) -> u16 {
        u16::from_le_bytes([self.0[CRC_OFFSET], self.0[CRC_OFFSET + 1]])
    }

    pub fn payload(&self) -> &[u8] {
        &self.0[PAYLOAD_OFFSET..]
    }

    /// Recompute the checksum with the CRC field zeroed and compare
    pub fn verify(&self) -> bool {
        let mut copy = self.0;
        copy[CRC_OFFSET] = 0;
        copy[CRC_OFFSET + 1] = 0;
        crc16(&copy[1..]) == self.crc()
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match Command::from_byte(self.command()) {
            Some(command) => write!(f, "Packet({command:?}/{:#04x}", self.sub_command())?,
            None => write!(f, "Packet({:#04x}/{:#04x}", self.command(), self.sub_command())?,
        }
        write!(f, " {:02X?})", &self.0[HEADER_OFFSET..PAYLOAD_OFFSET])
    }
}

/// Build a 65-byte HID packet with proper framing and CRC.
///
/// # Arguments
/// * `command` - Command byte
/// * `sub_command` - Sub-command byte
/// * `header` - Chunk header for led memory writes
/// * `payload` - Payload data, at most [`PAYLOAD_CAPACITY`] bytes
pub fn build_packet(
    command: Command,
    sub_command: u8,
    header: Option<ChunkHeader>,
    payload: &[u8],
) -> Result<Packet> {
    if payload.len() > PAYLOAD_CAPACITY {
        return Err(BoardError::PayloadTooLarge {
            len: payload.len(),
            capacity: PAYLOAD_CAPACITY,
        });
    }

    let mut buf = [0u8; PACKET_SIZE];
    buf[1] = command as u8;
    buf[2] = sub_command;

    if let Some(header) = header {
        buf[HEADER_OFFSET..CRC_OFFSET].copy_from_slice(&header.pack().to_le_bytes());
    }

    buf[PAYLOAD_OFFSET..PAYLOAD_OFFSET + payload.len()].copy_from_slice(payload);

    // CRC covers everything after the report id while its own field is still zero
    let crc = crc16(&buf[1..]);
    buf[CRC_OFFSET..CRC_OFFSET + 2].copy_from_slice(&crc.to_le_bytes());

    Ok(Packet(buf))
}

/// Build a packet that carries only a command and sub-command
pub fn command(command: Command, sub_command: u8) -> Packet {
    let mut buf = [0u8; PACKET_SIZE];
    buf[1] = command as u8;
    buf[2] = sub_command;
    let crc = crc16(&buf[1..]);
    buf[CRC_OFFSET..CRC_OFFSET + 2].copy_from_slice(&crc.to_le_bytes());
    Packet(buf)
}

/// Construct a packet querying the model id
pub fn info_model_id() -> Packet {
    command(Command::Info, sub::info::MODEL_ID)
}

/// Construct a keep-alive packet
pub fn ping() -> Packet {
    command(Command::Ping, sub::NONE)
}

/// Construct a packet switching between host driven and firmware lighting
pub fn mode(online: bool) -> Packet {
    let sub_command = if online {
        sub::mode::ONLINE
    } else {
        sub::mode::OFFLINE
    };
    command(Command::ModeSet, sub_command)
}

/// Construct a packet writing `data` at `address` of the led memory image
pub fn led_define_set(address: u32, data: &[u8]) -> Result<Packet> {
    let header = ChunkHeader::new(address, data.len())?;
    build_packet(
        Command::LedDefine,
        sub::led_define::SET,
        Some(header),
        data,
    )
}

/// Construct a packet committing the led memory image
pub fn led_define_save() -> Packet {
    command(Command::LedDefine, sub::led_define::SAVE)
}
