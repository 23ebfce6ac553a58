//! Configuration file handling

use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use skyloong_gk::transport::LinkOptions;
use skyloong_gk::Options;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub timing: TimingConfig,
    /// Per key color overrides, keyed by key name (e.g. `"Key: Escape" = "#ff0000"`)
    pub keys: BTreeMap<String, String>,
}

impl Config {
    /// Get the config file path for this platform
    pub fn path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "skyloong-sync")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load config from file, or create default if it doesn't exist
    pub fn load_or_create() -> Result<Self, Box<dyn Error>> {
        let path = Self::path().ok_or("could not determine config directory")?;

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            Self::parse(&contents)
        } else {
            let config = Config::default();
            config.save_with_header()?;
            tracing::info!("created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Parse a config from toml text
    pub fn parse(contents: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config with header comments for new files
    pub fn save_with_header(&self) -> Result<(), Box<dyn Error>> {
        let path = Self::path().ok_or("could not determine config directory")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let header = r#"# skyloong-sync configuration file
#
# [keys] maps key names (see `skyloong-sync layout`) to hex colors.

"#;
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, format!("{header}{contents}"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Base color for every key (hex)
    pub color: String,
    /// Brightness applied to every key (0-134)
    pub brightness: u8,
    /// Fixed HID path, auto-detected when unset
    pub device_path: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            color: "#ffffff".into(),
            brightness: skyloong_gk::protocol::BRIGHTNESS_MAX,
            device_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Keep-alive ping interval
    #[serde(with = "humantime_serde")]
    pub keepalive: Duration,
    /// How often the daemon re-sends the colors
    #[serde(with = "humantime_serde")]
    pub refresh: Duration,
    /// Keyboard reconnection retry interval
    #[serde(with = "humantime_serde")]
    pub retry: Duration,
    /// Pause after every packet
    #[serde(with = "humantime_serde")]
    pub command_delay: Duration,
    /// Extra attempts for a failed packet write
    pub write_retries: u8,
}

impl Default for TimingConfig {
    fn default() -> Self {
        let driver = Options::default();
        Self {
            keepalive: driver.keepalive,
            refresh: Duration::from_secs(30),
            retry: Duration::from_secs(5),
            command_delay: driver.link.command_delay,
            write_retries: driver.link.write_retries,
        }
    }
}

impl TimingConfig {
    /// Driver options described by this config
    pub fn driver_options(&self) -> Options {
        Options {
            keepalive: self.keepalive,
            link: LinkOptions {
                command_delay: self.command_delay,
                write_retries: self.write_retries,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::parse(&text).unwrap(), config);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = Config::parse(
            r##"
[general]
color = "#00ff00"

[timing]
keepalive = "500ms"

[keys]
"Key: Escape" = "#ff0000"
"##,
        )
        .unwrap();

        assert_eq!(config.general.color, "#00ff00");
        assert_eq!(config.general.brightness, 134);
        assert_eq!(config.timing.keepalive, Duration::from_millis(500));
        assert_eq!(config.timing.retry, Duration::from_secs(5));
        assert_eq!(config.keys["Key: Escape"], "#ff0000");

        let options = config.timing.driver_options();
        assert_eq!(options.keepalive, Duration::from_millis(500));
        assert_eq!(options.link.write_retries, 2);
    }

    #[test]
    fn defaults_match_driver() {
        let timing = TimingConfig::default();
        assert_eq!(timing.driver_options(), Options::default());
        assert_eq!(timing.keepalive, Duration::from_secs(2));
    }
}
