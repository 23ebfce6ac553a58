//! HID protocol implementation for Skyloong keyboards.
//!
//! This crate provides the pure protocol primitives used by the Skyloong GK
//! driver, including:
//! - CRC-16/CCITT-FALSE packet checksums
//! - 65-byte command packet framing
//! - Led memory image encoding and chunked transfer
//! - The static model and key layout tables
//!
//! ## Protocol Overview
//!
//! Every exchange is a fixed 65-byte HID report. Lighting is host driven only
//! while the keyboard is in online mode, which the firmware leaves again if it
//! does not see a ping every few seconds.

pub mod abi;
pub mod crc;
pub mod image;
pub mod models;

pub use abi::{build_packet, ChunkHeader, Command, Packet, PACKET_SIZE, PAYLOAD_CAPACITY};
pub use crc::*;
pub use image::{chunks, transfer_packets, Chunk, LedImage, CHUNK_SIZE, IMAGE_SIZE, LED_COUNT};
pub use models::{find_model, matrix_map, parse_model_id, Key, Model, MODELS};

/// Lowest brightness accepted by the device
pub const BRIGHTNESS_MIN: u8 = 0;
/// Highest brightness accepted by the device
pub const BRIGHTNESS_MAX: u8 = 134;
