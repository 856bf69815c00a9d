//! Actuator side of the fan driver.

use async_trait::async_trait;

use crate::{error::FanError, sensors::SensorReader};

/// Switches the fan between firmware control and off.
///
/// # Example
///
/// ```no_run
/// use fanctrld::{error::FanError, fan_controller::FanSwitch};
///
/// struct AlwaysOn;
///
/// #[async_trait::async_trait]
/// impl FanSwitch for AlwaysOn {
///     async fn set_fan(&self, _enable: bool) -> Result<(), FanError> { Ok(()) }
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FanSwitch: Send + Sync {
    /// Writes `enable` or `disable` to the control resource.
    async fn set_fan(&self, enable: bool) -> Result<(), FanError>;
}

/// Everything the control loop needs from the hardware.
pub trait FanDriver: SensorReader + FanSwitch {}

impl<T: SensorReader + FanSwitch> FanDriver for T {}
