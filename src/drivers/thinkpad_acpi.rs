//! Driver for the `thinkpad_acpi` procfs interface (`/proc/acpi/ibm`).

pub mod procfs;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};

use crate::{error::FanError, fan_controller::FanSwitch, sensors::SensorReader};

use self::procfs::{FanCommand, Thermal};

/// File inside the base directory holding the temperature readings.
pub const THERMAL_FILE: &str = "thermal";
/// File inside the base directory reporting fan status and accepting commands.
pub const FAN_FILE: &str = "fan";

/// Fan and thermal files of a single ThinkPad.
#[derive(Debug, Clone)]
pub struct ThinkpadAcpi {
    thermal: PathBuf,
    fan: PathBuf,
}

impl ThinkpadAcpi {
    /// Uses the `thermal` and `fan` files below `base`.
    pub fn new(base: &Path) -> Self {
        Self {
            thermal: base.join(THERMAL_FILE),
            fan: base.join(FAN_FILE),
        }
    }

    async fn open(path: &Path) -> Result<BufReader<File>, FanError> {
        File::open(path)
            .await
            .map(BufReader::new)
            .map_err(|source| FanError::Open {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Next line of `reader`, bytes that are not UTF-8 replaced.
    async fn next_line(
        reader: &mut BufReader<File>,
        path: &Path,
    ) -> Result<Option<String>, FanError> {
        let mut buf = Vec::new();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|source| FanError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Ok((read > 0).then(|| String::from_utf8_lossy(&buf).into_owned()))
    }
}

#[async_trait]
impl SensorReader for ThinkpadAcpi {
    async fn read_thermal(&self) -> Result<i64, FanError> {
        let mut reader = Self::open(&self.thermal).await?;
        let line = Self::next_line(&mut reader, &self.thermal)
            .await?
            .ok_or_else(|| FanError::PrematureEof {
                path: self.thermal.clone(),
            })?;

        match procfs::parse_thermal(&line) {
            Thermal::Max(t) => Ok(t),
            Thermal::BadLabel(found) => Err(FanError::MissingLabel {
                path: self.thermal.clone(),
                found,
            }),
        }
    }

    async fn read_fan_speed(&self) -> Result<i64, FanError> {
        let mut reader = Self::open(&self.fan).await?;
        let mut content = Vec::new();
        while let Some(line) = Self::next_line(&mut reader, &self.fan).await? {
            content.push(line);
        }

        Ok(procfs::parse_fan_speed(content.iter().map(String::as_str)))
    }
}

#[async_trait]
impl FanSwitch for ThinkpadAcpi {
    async fn set_fan(&self, enable: bool) -> Result<(), FanError> {
        let command = FanCommand::from(enable);

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.fan)
            .await
            .map_err(|source| FanError::Open {
                path: self.fan.clone(),
                source,
            })?;

        let written = match file.write_all(command.to_line().as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };

        written.map_err(|source| FanError::Write {
            path: self.fan.clone(),
            command,
            source,
        })
    }
}
