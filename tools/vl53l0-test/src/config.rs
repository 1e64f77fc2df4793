// SPDX-License-Identifier: MPL-2.0

//! Settings of a run, merged from the optional TOML file and the command line.
//!
//! Every key of the file is optional:
//!
//! ```toml
//! device = "/dev/stmvl53l0_ranging"
//! xtalk_file = "/mnt/vendor/vl53l0_xtak_calibration.file"
//! offset_file = "/mnt/vendor/vl53l0_offset_calibration.file"
//! xtalk_target_mm = 600
//! offset_target_mm = 100
//! calibration_samples = 20
//! poll_interval_ms = 30
//! use_case_interval_secs = 20
//! preset_offset_um = 15000
//! preset_xtalk_rate = 8
//! ```

use std::{fmt, fs, io, path::PathBuf, time::Duration};

use serde::Deserialize;
use stmvl53l0_uapi::DEVICE_PATH;

use crate::cli::{Cli, Mode, Thresholds};

const DEFAULT_XTALK_FILE: &str = "/mnt/vendor/vl53l0_xtak_calibration.file";
const DEFAULT_OFFSET_FILE: &str = "/mnt/vendor/vl53l0_offset_calibration.file";

/// The contents of a configuration file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub device: Option<PathBuf>,
    pub xtalk_file: Option<PathBuf>,
    pub offset_file: Option<PathBuf>,
    pub xtalk_target_mm: Option<u32>,
    pub offset_target_mm: Option<u32>,
    pub calibration_samples: Option<u32>,
    pub poll_interval_ms: Option<u64>,
    pub use_case_interval_secs: Option<u64>,
    /// The range offset to program before ranging, in micrometers.
    pub preset_offset_um: Option<i32>,
    /// The crosstalk compensation rate to program before ranging.
    pub preset_xtalk_rate: Option<u32>,
}

#[derive(Debug)]
pub enum ConfigError {
    Read(PathBuf, io::Error),
    Parse(PathBuf, toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(path, err) => write!(f, "cannot read {}: {}", path.display(), err),
            ConfigError::Parse(path, err) => write!(f, "cannot parse {}: {}", path.display(), err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ConfigFile {
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => return Err(ConfigError::Read(path, err)),
        };
        toml::from_str(&text).map_err(|err| ConfigError::Parse(path, err))
    }
}

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub device: PathBuf,
    pub mode: Mode,
    pub use_case_cycle: bool,
    pub thresholds: Thresholds,
    pub xtalk_file: PathBuf,
    pub offset_file: PathBuf,
    pub xtalk_target_mm: u32,
    pub offset_target_mm: u32,
    /// Measurements to read after a crosstalk calibration, beyond the first.
    pub calibration_samples: u32,
    pub poll_interval: Duration,
    pub use_case_interval: Duration,
    pub preset_offset_um: Option<i32>,
    pub preset_xtalk_rate: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::merge(
            &ConfigFile::default(),
            None,
            Mode::Range,
            false,
            Thresholds::Disabled,
        )
    }
}

impl Settings {
    /// Resolves the settings of `cli`, reading its configuration file if any.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => ConfigFile::load(path.clone())?,
            None => ConfigFile::default(),
        };
        Ok(Settings::merge(
            &file,
            cli.device.clone(),
            cli.mode(),
            cli.use_case_cycle,
            cli.thresholds(),
        ))
    }

    fn merge(
        file: &ConfigFile,
        device: Option<PathBuf>,
        mode: Mode,
        use_case_cycle: bool,
        thresholds: Thresholds,
    ) -> Self {
        Settings {
            device: device
                .or_else(|| file.device.clone())
                .unwrap_or_else(|| PathBuf::from(DEVICE_PATH)),
            mode,
            use_case_cycle,
            thresholds,
            xtalk_file: file
                .xtalk_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_XTALK_FILE)),
            offset_file: file
                .offset_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OFFSET_FILE)),
            xtalk_target_mm: file.xtalk_target_mm.unwrap_or(600),
            offset_target_mm: file.offset_target_mm.unwrap_or(100),
            calibration_samples: file.calibration_samples.unwrap_or(20),
            poll_interval: Duration::from_millis(file.poll_interval_ms.unwrap_or(30)),
            use_case_interval: Duration::from_secs(file.use_case_interval_secs.unwrap_or(20)),
            preset_offset_um: file.preset_offset_um,
            preset_xtalk_rate: file.preset_xtalk_rate,
        }
    }
}
