//! Led memory image encoding and chunked transfer.
//!
//! The device keeps 4 bytes per led (R, G, B, brightness) in a flat memory
//! image addressed by the led's device offset. The host rewrites the whole
//! image with 56-byte `LedDefine/Set` writes and commits it with one
//! `LedDefine/Save`.

use std::ops::Deref;

use skyloong_sync_core::{BoardError, Result, Rgb};

use crate::abi::{self, Packet};
use crate::models::Key;

/// Bytes per led in the memory image
pub const BYTES_PER_LED: usize = 4;
/// Number of led slots in the memory image
pub const LED_COUNT: usize = 132;
/// Total size of the led memory image
pub const IMAGE_SIZE: usize = LED_COUNT * BYTES_PER_LED;
/// Nominal chunk size for led memory writes
pub const CHUNK_SIZE: usize = 56;

/// Canonical led memory image
#[derive(Clone, PartialEq, Eq)]
pub struct LedImage([u8; IMAGE_SIZE]);

impl Default for LedImage {
    fn default() -> Self {
        Self([0u8; IMAGE_SIZE])
    }
}

impl std::fmt::Debug for LedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = (0..LED_COUNT)
            .filter_map(|i| self.led(i))
            .filter(|c| c.iter().any(|&b| b != 0))
            .count();
        write!(f, "LedImage({lit} lit)")
    }
}

impl Deref for LedImage {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl LedImage {
    /// Encode a color list aligned 1:1 with `keys` into a memory image.
    ///
    /// Every led gets the same `brightness`. Slots not named by `keys` stay zero.
    pub fn encode(colors: &[Rgb], keys: &[Key], brightness: u8) -> Result<Self> {
        if colors.len() != keys.len() {
            return Err(BoardError::ColorCountMismatch {
                colors: colors.len(),
                leds: keys.len(),
            });
        }

        // validate before touching the buffer, no partial images
        if let Some(key) = keys.iter().find(|k| k.led as usize >= LED_COUNT) {
            return Err(BoardError::LedOutOfRange {
                index: key.led as usize,
                max: LED_COUNT - 1,
            });
        }

        let mut image = Self::default();
        for (color, key) in colors.iter().zip(keys) {
            let offset = key.led as usize * BYTES_PER_LED;
            image.0[offset..offset + BYTES_PER_LED]
                .copy_from_slice(&[color.r, color.g, color.b, brightness]);
        }
        Ok(image)
    }

    /// The 4 bytes of the given led slot
    pub fn led(&self, index: usize) -> Option<&[u8]> {
        let offset = index.checked_mul(BYTES_PER_LED)?;
        self.0.get(offset..offset + BYTES_PER_LED)
    }
}

/// A contiguous slice of the memory image and where it lives on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub address: u32,
    pub data: &'a [u8],
}

/// Walk an image in increasing address order, [`CHUNK_SIZE`] bytes at a time.
/// The last chunk carries the remainder.
pub fn chunks(image: &[u8]) -> impl Iterator<Item = Chunk<'_>> {
    image
        .chunks(CHUNK_SIZE)
        .enumerate()
        .map(|(i, data)| Chunk {
            address: (i * CHUNK_SIZE) as u32,
            data,
        })
}

/// Every packet needed to replace the device image: one Set per chunk, then Save.
pub fn transfer_packets(image: &[u8]) -> Result<Vec<Packet>> {
    let mut packets = chunks(image)
        .map(|chunk| abi::led_define_set(chunk.address, chunk.data))
        .collect::<Result<Vec<_>>>()?;
    packets.push(abi::led_define_save());
    Ok(packets)
}
