//! High level hidapi abstraction for driving Skyloong GK keyboard lighting.
//!
//! Connecting identifies the model, switches the keyboard into host driven
//! (online) mode and starts the keep-alive thread. Dropping or closing the
//! driver stops the thread and hands lighting back to the firmware.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use hidapi::{DeviceInfo, HidApi, HidDevice};
use skyloong_protocol::{
    abi, find_model, parse_model_id, transfer_packets, LedImage, Model, BRIGHTNESS_MAX,
    BRIGHTNESS_MIN,
};
use skyloong_sync_core::{
    Board, BoardError, BoardInfo, HasPerKeyRgb, LedInfo, MatrixMap, Result, Rgb,
};
use tracing::{debug, info, warn};

pub use skyloong_protocol as protocol;

pub mod keepalive;
pub mod transport;

#[cfg(test)]
mod mock;

use keepalive::{KeepAlive, KEEPALIVE_PERIOD};
use transport::{Link, LinkOptions, Transport};

pub mod consts {
    pub const VENDOR_ID: u16 = 0x1EA7;
    pub const PRODUCT_ID: u16 = 0x0907;
    /// Vendor defined usage page of the lighting interface
    pub const USAGE_PAGE: u16 = 0xFF00;
    pub const USAGE: u16 = 0x0050;
}

/// Static board info for detection
pub static INFO: BoardInfo = BoardInfo {
    name: "Skyloong Keyboard",
    cli_name: "skyloong",
    vendor_id: consts::VENDOR_ID,
    product_id: consts::PRODUCT_ID,
    usage_page: Some(consts::USAGE_PAGE),
    usage: Some(consts::USAGE),
};

/// Driver tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Ping period of the keep-alive thread
    pub keepalive: Duration,
    /// Write pacing and retries
    pub link: LinkOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            keepalive: KEEPALIVE_PERIOD,
            link: LinkOptions::default(),
        }
    }
}

/// Outcome of the model id query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identification {
    Identified(&'static Model),
    /// The device answered, but with an id missing from the model table
    Unsupported(u32),
}

/// Query the model id and look it up in the model table
pub fn identify<T: Transport>(link: &Link<T>) -> Result<Identification> {
    let mut guard = link.lock();
    guard.send(&abi::info_model_id())?;
    let response = guard.read_response()?;
    let model_id = parse_model_id(&response)?;
    debug!("device reported model id {model_id}");

    Ok(match find_model(model_id) {
        Some(model) => Identification::Identified(model),
        None => Identification::Unsupported(model_id),
    })
}

/// High level abstraction for managing a Skyloong keyboard
pub struct SkyloongKeyboard<T: Transport = HidDevice> {
    link: Arc<Link<T>>,
    location: String,
    model: &'static Model,
    leds: Vec<LedInfo>,
    keepalive: Option<KeepAlive>,
    online: bool,
}

impl SkyloongKeyboard<HidDevice> {
    /// Open a detected HID interface and connect to it
    pub fn open(api: &HidApi, device: &DeviceInfo, options: Options) -> Result<Self> {
        let handle = device.open_device(api)?;
        Self::connect(handle, &device.path().to_string_lossy(), options)
    }
}

impl<T: Transport> SkyloongKeyboard<T> {
    /// Identify the keyboard behind `transport` and bring it online.
    ///
    /// Returns [`BoardError::UnsupportedDevice`] without sending anything
    /// beyond the info query if the model is unknown.
    pub fn connect(transport: T, path: &str, options: Options) -> Result<Self> {
        let link = Link::new(transport, options.link);

        let model = match identify(&link)? {
            Identification::Identified(model) => model,
            Identification::Unsupported(model_id) => {
                warn!("unsupported skyloong model {model_id} at {path}");
                return Err(BoardError::UnsupportedDevice { model_id });
            },
        };
        info!("identified {} at {path}", model.name);

        // from here on drop sends the offline command
        let mut this = Self {
            link: Arc::new(link),
            location: path.to_string(),
            model,
            leds: model.keys.iter().map(|k| k.info()).collect(),
            keepalive: None,
            online: true,
        };

        {
            let mut guard = this.link.lock();
            guard.send(&abi::ping())?;
            guard.send(&abi::mode(true))?;
            guard.send(&abi::ping())?;
        }

        this.keepalive = Some(KeepAlive::spawn(this.link.clone(), options.keepalive)?);
        Ok(this)
    }

    /// The identified model
    pub fn model(&self) -> &'static Model {
        self.model
    }

    /// Location string for display
    pub fn location(&self) -> String {
        format!("HID: {}", self.location)
    }

    /// Encode `colors` (aligned with the model's key table) and replace the
    /// device led image with it.
    pub fn send_colors(&mut self, colors: &[Rgb], brightness: u8) -> Result<()> {
        if brightness > BRIGHTNESS_MAX {
            return Err(BoardError::BrightnessOutOfRange {
                value: brightness,
                max: BRIGHTNESS_MAX,
            });
        }
        let image = LedImage::encode(colors, self.model.keys, brightness)?;
        let packets = transfer_packets(&image)?;

        // hold the lock for the whole transfer so pings cannot interleave
        let mut guard = self.link.lock();
        for packet in &packets {
            guard.send(packet)?;
        }
        debug!("sent {image:?} in {} packets", packets.len());
        Ok(())
    }

    /// Stop the keep-alive thread and put the keyboard back into offline mode
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if let Some(mut keepalive) = self.keepalive.take() {
            keepalive.stop();
        }
        if std::mem::take(&mut self.online) {
            self.link.send(&abi::mode(false))?;
            info!("released {} at {}", self.model.name, self.location);
        }
        Ok(())
    }
}

impl<T: Transport> Drop for SkyloongKeyboard<T> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("failed to switch keyboard offline: {e}");
        }
    }
}

// === Trait Implementations ===

impl<T: Transport> Board for SkyloongKeyboard<T> {
    fn info(&self) -> &'static BoardInfo {
        &INFO
    }

    fn name(&self) -> &'static str {
        self.model.name
    }

    fn location(&self) -> String {
        SkyloongKeyboard::location(self)
    }

    fn model_id(&self) -> Option<u32> {
        Some(self.model.id)
    }

    fn check(&self) -> Result<()> {
        match &self.keepalive {
            Some(keepalive) if !keepalive.is_healthy() => Err(BoardError::Disconnected),
            _ => Ok(()),
        }
    }

    fn as_per_key_rgb(&mut self) -> Option<&mut dyn HasPerKeyRgb> {
        Some(self)
    }

    fn close(self: Box<Self>) -> Result<()> {
        SkyloongKeyboard::close(*self)
    }
}

impl<T: Transport> HasPerKeyRgb for SkyloongKeyboard<T> {
    fn leds(&self) -> &[LedInfo] {
        &self.leds
    }

    fn matrix(&self) -> MatrixMap {
        self.model.matrix()
    }

    fn brightness_range(&self) -> RangeInclusive<u8> {
        BRIGHTNESS_MIN..=BRIGHTNESS_MAX
    }

    fn update(&mut self, colors: &[Rgb], brightness: u8) -> Result<()> {
        self.send_colors(colors, brightness)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::mock::MockTransport;
    use crate::protocol::abi::sub;
    use crate::protocol::{Command, CHUNK_SIZE};

    const GK104: u32 = 656802051;

    fn options() -> Options {
        Options {
            keepalive: Duration::from_secs(60),
            link: LinkOptions {
                command_delay: Duration::ZERO,
                write_retries: 0,
            },
        }
    }

    const INFO_QUERY: (u8, u8) = (Command::Info as u8, sub::info::MODEL_ID);
    const PING: (u8, u8) = (Command::Ping as u8, sub::NONE);
    const ONLINE: (u8, u8) = (Command::ModeSet as u8, sub::mode::ONLINE);
    const OFFLINE: (u8, u8) = (Command::ModeSet as u8, sub::mode::OFFLINE);

    #[test]
    fn connect_runs_online_handshake() {
        let mock = MockTransport::with_model(GK104);
        let keyboard = SkyloongKeyboard::connect(mock.clone(), "/dev/hidraw3", options()).unwrap();

        assert_eq!(keyboard.model().name, "Skyloong GK104 Pro");
        assert_eq!(keyboard.location(), "HID: /dev/hidraw3");
        assert_eq!(mock.commands(), vec![INFO_QUERY, PING, ONLINE, PING]);
        assert!(mock.writes().iter().all(|w| w.len() == 65));
    }

    #[test]
    fn unsupported_model_is_refused() {
        let mock = MockTransport::with_model(1234);
        let err = SkyloongKeyboard::connect(mock.clone(), "path", options())
            .err()
            .unwrap();

        assert!(matches!(err, BoardError::UnsupportedDevice { model_id: 1234 }));
        assert_eq!(mock.commands(), vec![INFO_QUERY]);
    }

    #[test]
    fn empty_response_is_not_unsupported() {
        let mock = MockTransport::default();
        let err = SkyloongKeyboard::connect(mock.clone(), "path", options())
            .err()
            .unwrap();
        assert!(matches!(err, BoardError::ShortRead { read: 0, .. }));

        mock.respond(vec![0u8; 6]);
        let link = Link::new(mock, options().link);
        assert!(matches!(
            identify(&link),
            Err(BoardError::ShortRead { read: 6, .. })
        ));
    }

    #[test]
    fn identify_resolves_table_entry() {
        let link = Link::new(MockTransport::with_model(656802032), options().link);
        let Identification::Identified(model) = identify(&link).unwrap() else {
            panic!("expected a model");
        };
        assert_eq!(model.name, "Skyloong GK61");
        assert_eq!(model.keys.len(), 63);

        let link = Link::new(MockTransport::with_model(7), options().link);
        assert_eq!(identify(&link).unwrap(), Identification::Unsupported(7));
    }

    #[test]
    fn drop_switches_offline_last() {
        let mock = MockTransport::with_model(GK104);
        let keyboard = SkyloongKeyboard::connect(mock.clone(), "path", options()).unwrap();
        drop(keyboard);

        assert_eq!(mock.commands().last(), Some(&OFFLINE));
        assert_eq!(
            mock.commands().iter().filter(|&&c| c == OFFLINE).count(),
            1
        );
    }

    #[test]
    fn close_switches_offline_once() {
        let mock = MockTransport::with_model(GK104);
        let keyboard = SkyloongKeyboard::connect(mock.clone(), "path", options()).unwrap();
        keyboard.close().unwrap();

        assert_eq!(mock.commands(), vec![INFO_QUERY, PING, ONLINE, PING, OFFLINE]);
    }

    #[test]
    fn send_colors_transfers_full_image() {
        let mock = MockTransport::with_model(GK104);
        let mut keyboard = SkyloongKeyboard::connect(mock.clone(), "path", options()).unwrap();
        let colors = vec![Rgb::new(10, 20, 30); keyboard.leds().len()];
        keyboard.send_colors(&colors, 100).unwrap();

        let writes = mock.writes();
        let transfer = &writes[4..];
        assert_eq!(transfer.len(), 11);
        for (i, packet) in transfer[..10].iter().enumerate() {
            assert_eq!((packet[1], packet[2]), (0x1A, sub::led_define::SET));
            let header = u32::from_le_bytes([packet[3], packet[4], packet[5], packet[6]]);
            assert_eq!(header & 0x00FF_FFFF, (i * CHUNK_SIZE) as u32);
        }
        assert_eq!(
            (transfer[10][1], transfer[10][2]),
            (0x1A, sub::led_define::SAVE)
        );

        // escape is led 0, first payload byte of the first chunk
        assert_eq!(&transfer[0][9..13], &[10, 20, 30, 100]);
    }

    #[test]
    fn send_colors_rejects_contract_violations() {
        let mock = MockTransport::with_model(GK104);
        let mut keyboard = SkyloongKeyboard::connect(mock.clone(), "path", options()).unwrap();
        let before = mock.writes().len();

        assert!(matches!(
            keyboard.send_colors(&[Rgb::WHITE; 3], 10),
            Err(BoardError::ColorCountMismatch { colors: 3, leds: 107 })
        ));
        let colors = vec![Rgb::WHITE; 107];
        assert!(matches!(
            keyboard.send_colors(&colors, 135),
            Err(BoardError::BrightnessOutOfRange { value: 135, .. })
        ));
        assert_eq!(mock.writes().len(), before);
    }

    #[test]
    fn keepalive_never_splits_a_transfer() {
        let mock = MockTransport::with_model(GK104);
        let mut keyboard = SkyloongKeyboard::connect(
            mock.clone(),
            "path",
            Options {
                keepalive: Duration::from_millis(1),
                ..options()
            },
        )
        .unwrap();
        let colors = vec![Rgb::WHITE; 107];
        for _ in 0..5 {
            keyboard.send_colors(&colors, 50).unwrap();
        }
        thread::sleep(Duration::from_millis(20));
        keyboard.close().unwrap();

        // every run of led define packets is 10 sets followed by a save
        let commands = mock.commands();
        let mut run = 0;
        for &(command, sub_command) in &commands[4..] {
            if command == Command::LedDefine as u8 {
                if sub_command == sub::led_define::SAVE {
                    assert_eq!(run, 10);
                    run = 0;
                } else {
                    run += 1;
                }
            } else {
                assert_eq!(run, 0, "ping inside a transfer");
            }
        }
        assert!(commands.contains(&PING));
    }

    #[test]
    fn exposes_board_capabilities() {
        let mock = MockTransport::with_model(656802008);
        let keyboard = SkyloongKeyboard::connect(mock, "path", options()).unwrap();
        let mut board: Box<dyn Board> = Box::new(keyboard);

        assert_eq!(board.name(), "Skyloong GK980");
        assert_eq!(board.model_id(), Some(656802008));
        assert!(board.check().is_ok());
        assert_eq!(board.info().vendor_id, 0x1EA7);
        let rgb = board.as_per_key_rgb().unwrap();
        assert_eq!(rgb.leds().len(), 102);
        assert_eq!(rgb.brightness_range(), 0..=134);
        assert_eq!(rgb.matrix().height, 6);
        board.close().unwrap();
    }

    #[test]
    fn lost_keepalive_fails_check() {
        let mock = MockTransport::with_model(GK104);
        let keyboard = SkyloongKeyboard::connect(
            mock.clone(),
            "path",
            Options {
                keepalive: Duration::from_millis(5),
                ..options()
            },
        )
        .unwrap();
        assert!(Board::check(&keyboard).is_ok());

        // unplugged
        mock.fail_next_writes(usize::MAX);
        thread::sleep(Duration::from_millis(100));
        assert!(matches!(
            Board::check(&keyboard),
            Err(BoardError::Disconnected)
        ));
    }
}
