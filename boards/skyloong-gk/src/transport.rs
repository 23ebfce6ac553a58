//! Device transport and the single serialization point for packet writes.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use hidapi::HidDevice;
use skyloong_protocol::{Packet, PACKET_SIZE};
use skyloong_sync_core::{BoardError, Result};
use tracing::{debug, trace};

/// How long a response read may block before it counts as empty
pub const READ_TIMEOUT_MS: i32 = 1000;

/// Raw byte transport to a keyboard
pub trait Transport: Send + 'static {
    /// Write one report, returning the number of bytes accepted
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read one report into `buf`, returning the number of bytes read
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

impl Transport for HidDevice {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        Ok(HidDevice::write(self, data)?)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.read_timeout(buf, READ_TIMEOUT_MS)?)
    }
}

/// Write pacing and retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkOptions {
    /// Pause after every packet
    pub command_delay: Duration,
    /// Extra attempts after a failed write
    pub write_retries: u8,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            command_delay: Duration::from_millis(1),
            write_retries: 2,
        }
    }
}

/// Shared handle to a transport. Every write goes through the one mutex.
pub struct Link<T> {
    device: Mutex<T>,
    options: LinkOptions,
}

impl<T: Transport> Link<T> {
    pub fn new(device: T, options: LinkOptions) -> Self {
        Self {
            device: Mutex::new(device),
            options,
        }
    }

    /// Take exclusive access for a sequence of packets
    pub fn lock(&self) -> LinkGuard<'_, T> {
        LinkGuard {
            device: self.device.lock().unwrap_or_else(PoisonError::into_inner),
            options: &self.options,
        }
    }

    /// Send a single packet
    pub fn send(&self, packet: &Packet) -> Result<()> {
        self.lock().send(packet)
    }
}

/// Exclusive access to the transport, released on drop
pub struct LinkGuard<'a, T> {
    device: MutexGuard<'a, T>,
    options: &'a LinkOptions,
}

impl<T: Transport> LinkGuard<'_, T> {
    /// Write a packet, retrying failed or short writes a bounded number of times
    pub fn send(&mut self, packet: &Packet) -> Result<()> {
        trace!("sending {packet:?}");
        let attempts = self.options.write_retries as usize + 1;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.write_once(packet) {
                Ok(()) => {
                    std::thread::sleep(self.options.command_delay);
                    return Ok(());
                },
                Err(e) if attempt < attempts => {
                    debug!("write attempt {attempt} failed: {e}");
                    std::thread::sleep(self.options.command_delay);
                },
                Err(e) => return Err(e),
            }
        }
    }

    fn write_once(&mut self, packet: &Packet) -> Result<()> {
        let written = self.device.write(packet.as_bytes())?;
        if written < PACKET_SIZE {
            return Err(BoardError::ShortWrite {
                written,
                expected: PACKET_SIZE,
            });
        }
        Ok(())
    }

    /// Read one response report
    pub fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut buf = [0u8; PACKET_SIZE];
        let read = self.device.read(&mut buf)?;
        if read == 0 {
            return Err(BoardError::ShortRead {
                read,
                expected: PACKET_SIZE,
            });
        }
        trace!("received {:02X?}", &buf[..read.min(16)]);
        Ok(buf[..read].to_vec())
    }
}
