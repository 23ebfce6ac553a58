//! Core Board trait and related types.

use crate::features::{HasPerKeyRgb, Result};

/// Static information about a board type for detection and CLI
#[derive(Debug, Clone, Copy)]
pub struct BoardInfo {
    pub name: &'static str,
    pub cli_name: &'static str,
    pub vendor_id: u16,
    pub product_id: u16,
    pub usage_page: Option<u16>,
    pub usage: Option<u16>,
}

impl BoardInfo {
    /// Check if a HID device matches this board info
    pub fn matches(&self, device: &hidapi::DeviceInfo) -> bool {
        device.vendor_id() == self.vendor_id
            && device.product_id() == self.product_id
            && self.usage_page.is_none_or(|up| device.usage_page() == up)
            && self.usage.is_none_or(|u| device.usage() == u)
    }
}

/// Core board trait - object-safe for `dyn Board`
///
/// One implementation exists per device family. The detection layer picks the
/// implementation, the rest of the application only talks to this trait.
pub trait Board: Send {
    /// Get board info (instance method for object safety)
    fn info(&self) -> &'static BoardInfo;

    /// Display name of the identified model
    fn name(&self) -> &'static str;

    /// Human readable device location
    fn location(&self) -> String;

    /// Model identifier reported by the firmware, if the family has one
    fn model_id(&self) -> Option<u32> {
        None
    }

    /// Fails once the device is known to be gone
    fn check(&self) -> Result<()> {
        Ok(())
    }

    /// Feature opt-in - override to return `Some(self)` if per-key lighting is supported
    fn as_per_key_rgb(&mut self) -> Option<&mut dyn HasPerKeyRgb> {
        None
    }

    /// Put the device back into its autonomous mode and release the handle
    fn close(self: Box<Self>) -> Result<()>;
}
