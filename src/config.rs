//! Run configuration.
//!
//! Defaults mirror the device side: the dashboard console runs at 115200
//! baud and stores its capture as `dashboard.bmp`. A TOML file can override
//! the defaults; CLI flags override the file.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default serial device path for the dashboard's USB-to-serial adapter.
#[cfg(target_os = "macos")]
pub const DEFAULT_PORT: &str = "/dev/cu.usbserial-10";
#[cfg(not(target_os = "macos"))]
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Default baud rate for the device console.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Default output file, matching the name the device stores internally.
pub const DEFAULT_OUTPUT: &str = "dashboard.bmp";

/// Default per-read timeout on the serial port.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Abort a transfer after this long without a recognized line.
pub const DEFAULT_DATA_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for one transfer run.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Serial device path.
    pub port: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Per-read timeout on the serial port.
    pub read_timeout: Duration,
    /// Send `SCREENSHOT` before downloading.
    pub capture_first: bool,
    /// Where the downloaded file is written.
    pub output_path: PathBuf,
    /// Abort when no recognized line arrives for this long.
    pub data_timeout: Duration,
    /// Optional transcript log of device output.
    pub log_file: Option<PathBuf>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD,
            read_timeout: DEFAULT_READ_TIMEOUT,
            capture_first: false,
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            data_timeout: DEFAULT_DATA_TIMEOUT,
            log_file: None,
        }
    }
}

/// On-disk configuration, merged beneath CLI flags.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<String>,
    pub baudrate: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub output: Option<PathBuf>,
    pub screenshot: Option<bool>,
    pub log: Option<PathBuf>,
}

impl FileConfig {
    /// Parse a TOML config file.
    pub fn parse(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw).map_err(|err| match err {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Parse TOML text.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Fold the file's settings into `config` where present.
    pub fn apply(self, config: &mut TransferConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(baud) = self.baudrate {
            config.baud_rate = baud;
        }
        if let Some(secs) = self.timeout_secs {
            config.read_timeout = Duration::from_secs(secs);
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if let Some(screenshot) = self.screenshot {
            config.capture_first = screenshot;
        }
        if let Some(log) = self.log {
            config.log_file = Some(log);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TransferConfig::default();
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.output_path, PathBuf::from("dashboard.bmp"));
        assert_eq!(config.read_timeout, Duration::from_secs(5));
        assert_eq!(config.data_timeout, Duration::from_secs(30));
        assert!(!config.capture_first);
    }

    #[test]
    fn file_config_overrides_defaults() {
        let file = FileConfig::from_toml(
            r#"
            port = "/dev/ttyACM0"
            baudrate = 921600
            timeout_secs = 2
            screenshot = true
            "#,
        )
        .unwrap();

        let mut config = TransferConfig::default();
        file.apply(&mut config);

        assert_eq!(config.port, "/dev/ttyACM0");
        assert_eq!(config.baud_rate, 921_600);
        assert_eq!(config.read_timeout, Duration::from_secs(2));
        assert!(config.capture_first);
        // Untouched fields keep their defaults
        assert_eq!(config.output_path, PathBuf::from(DEFAULT_OUTPUT));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::from_toml("badkey = 1").is_err());
    }
}
