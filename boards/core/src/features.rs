//! Feature traits for board capabilities.
//!
//! Boards opt-in to features by implementing these traits and returning
//! `Some(self)` from the corresponding `as_*()` method in the Board trait.

use std::ops::RangeInclusive;

use crate::{MatrixMap, Rgb};

/// Errors that can occur during board operations
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Device was not found
    #[error("device not found")]
    DeviceNotFound,

    /// Device answered identification with a model id we have no table for
    #[error("unsupported device: model id {model_id}")]
    UnsupportedDevice { model_id: u32 },

    /// Transport accepted fewer bytes than the packet holds
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// Transport returned fewer bytes than the response needs
    #[error("short read: {read} of {expected} bytes")]
    ShortRead { read: usize, expected: usize },

    /// Color list and led list are not aligned 1:1
    #[error("got {colors} colors for {leds} leds")]
    ColorCountMismatch { colors: usize, leds: usize },

    /// Payload does not fit in a single packet
    #[error("payload of {len} bytes exceeds packet capacity of {capacity}")]
    PayloadTooLarge { len: usize, capacity: usize },

    /// Led index lies outside of the device memory image
    #[error("led index {index} out of range (max {max})")]
    LedOutOfRange { index: usize, max: usize },

    /// Chunk address does not fit into the 24 address bits of a chunk header
    #[error("chunk address {0:#x} exceeds 24 bits")]
    AddressOutOfRange(u32),

    /// Brightness above what the device accepts
    #[error("brightness {value} out of range (max {max})")]
    BrightnessOutOfRange { value: u8, max: u8 },

    /// Device stopped answering while connected
    #[error("device stopped responding")]
    Disconnected,

    /// Key name not present in the model layout
    #[error("unknown key: {0}")]
    UnknownKey(String),

    /// HID communication error
    #[error("hid error: {0}")]
    Hid(#[from] hidapi::HidError),

    /// Generic IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BoardError>;

/// A single addressable led as seen by the lighting layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedInfo {
    /// Human readable key name, e.g. `Key: Escape`
    pub name: &'static str,
    /// Device assigned led offset
    pub index: u8,
}

/// Direct per-key color capability
pub trait HasPerKeyRgb {
    /// Leds in the fixed order `update` expects colors in
    fn leds(&self) -> &[LedInfo];

    /// Row/column topology of the leds
    fn matrix(&self) -> MatrixMap;

    /// Accepted brightness values
    fn brightness_range(&self) -> RangeInclusive<u8>;

    /// Push one frame of colors, aligned 1:1 with `leds()`
    fn update(&mut self, colors: &[Rgb], brightness: u8) -> Result<()>;
}
