//! Sensor side of the fan driver.

use async_trait::async_trait;

use crate::error::FanError;

/// One poll cycle worth of readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSample {
    /// Highest temperature reported by the firmware, in °C.
    pub temperature: i64,
    /// Current fan speed in rpm; 0 when the fan is stopped.
    pub rpm: i64,
}

/// Reads the firmware-exposed temperature and fan speed.
///
/// Implementations must not touch any shared state; every failure is a
/// [`FanError`] and is never replaced by a sentinel value.
#[async_trait]
pub trait SensorReader: Send + Sync {
    /// Highest temperature from the thermal source.
    async fn read_thermal(&self) -> Result<i64, FanError>;

    /// Current fan speed; 0 if the source does not report one.
    async fn read_fan_speed(&self) -> Result<i64, FanError>;

    /// Reads the fan speed first, then the temperature.
    async fn sample(&self) -> Result<SensorSample, FanError> {
        let rpm = self.read_fan_speed().await?;
        let temperature = self.read_thermal().await?;
        Ok(SensorSample { temperature, rpm })
    }
}
