//! Startup configuration.
//!
//! Everything comes from the command line; the values are validated once
//! and stay immutable for the life of the process.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use log::LevelFilter;

use crate::{cli::Cli, error::ConfigError};

/// Default values and accepted ranges.
pub mod defaults {
    pub const RPM_THRESHOLD: i64 = 3500;
    pub const THERMAL_THRESHOLD: i64 = 45;
    pub const POLL_SECONDS: i64 = 5;
    pub const BASE_PATH: &str = "/proc/acpi/ibm";

    pub const MIN_RPM_THRESHOLD: i64 = 1000;
    pub const MAX_THERMAL_THRESHOLD: i64 = 60;
    pub const MAX_POLL_SECONDS: i64 = 600;
}

/// The two switching points of the hysteresis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Below this speed the BIOS is considered to have slowed the fan down.
    pub rpm: i64,
    /// Above this temperature the fan is always on.
    pub thermal: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rpm: defaults::RPM_THRESHOLD,
            thermal: defaults::THERMAL_THRESHOLD,
        }
    }
}

/// Validated daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub thresholds: Thresholds,
    pub poll_interval: Duration,
    pub debug: bool,
    pub foreground: bool,
    pub base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            poll_interval: Duration::from_secs(defaults::POLL_SECONDS.unsigned_abs()),
            debug: false,
            foreground: false,
            base_path: PathBuf::from(defaults::BASE_PATH),
        }
    }
}

impl Config {
    /// Log level handed to the syslog bridge.
    pub fn log_level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    /// Fails unless the base path is an existing, readable directory.
    pub fn check_base_path(&self) -> Result<(), ConfigError> {
        check_dir(&self.base_path)
    }
}

impl TryFrom<Cli> for Config {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        validate(&cli)?;

        Ok(Self {
            thresholds: Thresholds {
                rpm: cli.rpm_threshold,
                thermal: cli.thermal_threshold,
            },
            poll_interval: Duration::from_secs(cli.poll_seconds.unsigned_abs()),
            debug: cli.debug,
            foreground: cli.foreground,
            base_path: cli.base_path,
        })
    }
}

fn validate(cli: &Cli) -> Result<(), ConfigError> {
    use defaults::*;

    if cli.rpm_threshold < MIN_RPM_THRESHOLD {
        return Err(ConfigError::RpmThreshold {
            value: cli.rpm_threshold,
            min: MIN_RPM_THRESHOLD,
        });
    }

    if cli.thermal_threshold > MAX_THERMAL_THRESHOLD {
        return Err(ConfigError::ThermalTooHigh {
            value: cli.thermal_threshold,
            max: MAX_THERMAL_THRESHOLD,
        });
    }

    if cli.thermal_threshold < 0 {
        return Err(ConfigError::ThermalNegative {
            value: cli.thermal_threshold,
        });
    }

    if !(0..=MAX_POLL_SECONDS).contains(&cli.poll_seconds) {
        return Err(ConfigError::PollInterval {
            value: cli.poll_seconds,
            max: MAX_POLL_SECONDS,
        });
    }

    Ok(())
}

fn check_dir(path: &Path) -> Result<(), ConfigError> {
    std::fs::read_dir(path)
        .map(|_| ())
        .map_err(|e| ConfigError::BasePath {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}
