//! Board detection and selection logic.

use hidapi::HidApi;
use skyloong_gk::{Options, SkyloongKeyboard, INFO as SKYLOONG_INFO};
use skyloong_sync_core::{Board, BoardError};
use tracing::{debug, warn};

/// A HID interface that looks like a supported keyboard
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: String,
    pub product: Option<String>,
    pub board: &'static str,
}

/// List lighting interfaces without opening them
pub fn candidates() -> Result<Vec<Candidate>, BoardError> {
    let api = HidApi::new()?;
    Ok(api
        .device_list()
        .filter(|d| SKYLOONG_INFO.matches(d))
        .map(|d| Candidate {
            path: d.path().to_string_lossy().into_owned(),
            product: d.product_string().map(str::to_owned),
            board: SKYLOONG_INFO.name,
        })
        .collect())
}

/// Open the first keyboard that identifies as a supported model.
///
/// With `path` set only that interface is tried and its error is returned as is.
/// Otherwise unsupported or failing candidates are skipped.
pub fn open_board(path: Option<&str>, options: Options) -> Result<Box<dyn Board>, BoardError> {
    let api = HidApi::new()?;
    for device in api.device_list() {
        if !SKYLOONG_INFO.matches(device) {
            continue;
        }
        let device_path = device.path().to_string_lossy();
        match path {
            Some(wanted) if wanted != device_path => continue,
            Some(_) => {
                return Ok(Box::new(SkyloongKeyboard::open(&api, device, options)?));
            },
            None => {},
        }

        debug!("probing {device_path}");
        match SkyloongKeyboard::open(&api, device, options) {
            Ok(keyboard) => return Ok(Box::new(keyboard)),
            Err(e) => warn!("skipping {device_path}: {e}"),
        }
    }
    Err(BoardError::DeviceNotFound)
}
