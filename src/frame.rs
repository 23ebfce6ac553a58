//! Turning configured colors into one frame for a board.

use std::error::Error;
use std::str::FromStr;

use skyloong_sync_core::{Board, BoardError, HasPerKeyRgb, LedInfo, Rgb};

/// A `NAME=HEX` key color override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColor {
    pub name: String,
    pub color: Rgb,
}

impl FromStr for KeyColor {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // split on the last '=' so "Key: ==#fff" names the equals key
        let (name, color) = s
            .rsplit_once('=')
            .ok_or_else(|| format!("expected NAME=HEX, got {s}"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing key name in {s}"));
        }
        Ok(Self {
            name: name.to_string(),
            color: color.parse()?,
        })
    }
}

/// Colors and brightness to show on a keyboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub base: Rgb,
    pub keys: Vec<KeyColor>,
    pub brightness: u8,
}

impl Frame {
    /// Build a frame from the config file
    pub fn from_config(config: &crate::config::Config) -> Result<Self, String> {
        let keys = config
            .keys
            .iter()
            .map(|(name, color)| -> Result<KeyColor, String> {
                Ok(KeyColor {
                    name: name.clone(),
                    color: color.parse()?,
                })
            })
            .collect::<Result<_, String>>()?;
        Ok(Self {
            base: config.general.color.parse()?,
            keys,
            brightness: config.general.brightness,
        })
    }

    /// Colors aligned with `leds`. Later overrides win; names match case-insensitively.
    ///
    /// An override colors the device led of the named key, so every key wired
    /// to that same led gets it too.
    pub fn colors(&self, leds: &[LedInfo]) -> Result<Vec<Rgb>, BoardError> {
        let mut colors = vec![self.base; leds.len()];
        for key in &self.keys {
            let index = leds
                .iter()
                .find(|led| led.name.eq_ignore_ascii_case(&key.name))
                .map(|led| led.index)
                .ok_or_else(|| BoardError::UnknownKey(key.name.clone()))?;
            for (led, color) in leds.iter().zip(colors.iter_mut()) {
                if led.index == index {
                    *color = key.color;
                }
            }
        }
        Ok(colors)
    }

    /// Fail on overrides naming keys `leds` does not have
    pub fn check(&self, leds: &[LedInfo]) -> Result<(), BoardError> {
        self.colors(leds).map(drop)
    }
}

/// Per-key lighting of a board, or an error for boards without it
pub fn per_key(board: &mut dyn Board) -> Result<&mut dyn HasPerKeyRgb, Box<dyn Error>> {
    Ok(board
        .as_per_key_rgb()
        .ok_or("board does not support per-key lighting")?)
}

/// Make sure `frame` can be shown on `board` at all
pub fn validate_frame(board: &mut dyn Board, frame: &Frame) -> Result<(), Box<dyn Error>> {
    let rgb = per_key(board)?;
    let range = rgb.brightness_range();
    if !range.contains(&frame.brightness) {
        return Err(BoardError::BrightnessOutOfRange {
            value: frame.brightness,
            max: *range.end(),
        }
        .into());
    }
    frame.check(rgb.leds())?;
    Ok(())
}

/// Push a frame to a board
pub fn apply_frame(board: &mut dyn Board, frame: &Frame) -> Result<(), Box<dyn Error>> {
    let rgb = per_key(board)?;
    let colors = frame.colors(rgb.leds())?;
    rgb.update(&colors, frame.brightness)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use skyloong_gk::protocol::{find_model, LedImage};

    use super::*;
    use crate::config::Config;

    const LEDS: &[LedInfo] = &[
        LedInfo {
            name: "Key: Escape",
            index: 0,
        },
        LedInfo {
            name: "Key: =",
            index: 13,
        },
        LedInfo {
            name: "Key: Space",
            index: 116,
        },
    ];

    #[test]
    fn parses_key_colors() {
        let key: KeyColor = "Key: Escape=#ff0000".parse().unwrap();
        assert_eq!(key.name, "Key: Escape");
        assert_eq!(key.color, Rgb::new(255, 0, 0));

        let equals: KeyColor = "Key: ==0f0".parse().unwrap();
        assert_eq!(equals.name, "Key: =");
        assert_eq!(equals.color, Rgb::new(0, 255, 0));

        assert!("Key: Escape".parse::<KeyColor>().is_err());
        assert!("=#fff".parse::<KeyColor>().is_err());
        assert!("Key: Escape=#ff".parse::<KeyColor>().is_err());
    }

    #[test]
    fn overrides_apply_on_top_of_base() {
        let frame = Frame {
            base: Rgb::new(1, 2, 3),
            keys: vec![
                "key: escape=#ff0000".parse().unwrap(),
                "Key: Escape=#0000ff".parse().unwrap(),
            ],
            brightness: 80,
        };
        let colors = frame.colors(LEDS).unwrap();
        assert_eq!(
            colors,
            vec![Rgb::new(0, 0, 255), Rgb::new(1, 2, 3), Rgb::new(1, 2, 3)]
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        let frame = Frame {
            base: Rgb::BLACK,
            keys: vec!["Key: F13=#ffffff".parse().unwrap()],
            brightness: 0,
        };
        assert!(matches!(
            frame.colors(LEDS),
            Err(BoardError::UnknownKey(name)) if name == "Key: F13"
        ));
    }

    #[test]
    fn override_reaches_keys_sharing_a_led() {
        let gk980 = find_model(656802008).unwrap();
        let leds: Vec<LedInfo> = gk980.keys.iter().map(|k| k.info()).collect();
        let frame = Frame {
            base: Rgb::BLACK,
            keys: vec!["Key: Space=#ff0000".parse().unwrap()],
            brightness: 100,
        };

        let colors = frame.colors(&leds).unwrap();
        let image = LedImage::encode(&colors, gk980.keys, frame.brightness).unwrap();
        assert_eq!(image.led(116).unwrap(), &[255, 0, 0, 100]);
        // neighbours keep the base color
        assert_eq!(image.led(118).unwrap(), &[0, 0, 0, 100]);
    }

    #[test]
    fn frame_from_config() {
        let mut config = Config::default();
        config.general.color = "#102030".into();
        config.general.brightness = 42;
        config.keys.insert("Key: Space".into(), "#fff".into());

        let frame = Frame::from_config(&config).unwrap();
        assert_eq!(frame.base, Rgb::new(16, 32, 48));
        assert_eq!(frame.brightness, 42);
        assert_eq!(frame.colors(LEDS).unwrap()[2], Rgb::WHITE);

        config.general.color = "nope".into();
        assert!(Frame::from_config(&config).is_err());
    }
}
