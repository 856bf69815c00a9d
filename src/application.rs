//! Application entry point and builder pattern implementation.

use anyhow::Result;
use log::info;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    control_loop::{ControlLoop, Outcome},
    fan_controller::FanDriver,
};

/// The daemon: one control loop over one fan driver.
///
/// # Example
///
/// ```no_run
/// use fanctrld::{application::Application, config::Config, drivers::thinkpad_acpi::ThinkpadAcpi};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::default();
/// let mut app = Application::builder()
///     .with_driver(ThinkpadAcpi::new(&config.base_path))
///     .with_config(config)
///     .build()?;
///
/// let outcome = app.run().await;
/// # Ok(())
/// # }
/// ```
pub struct Application<D> {
    control: ControlLoop<D>,
}

impl<D: FanDriver> Application<D> {
    /// Creates a new ApplicationBuilder for constructing Application instances.
    pub fn builder() -> ApplicationBuilder<D> {
        ApplicationBuilder::new()
    }

    /// Runs the control loop until shutdown or escalation.
    pub async fn run(&mut self) -> Outcome {
        let outcome = self.control.run().await;
        info!("Control loop finished: {outcome:?}");
        outcome
    }

    #[cfg(test)]
    pub(crate) fn control(&self) -> &ControlLoop<D> {
        &self.control
    }
}

/// Builder pattern for creating Application instances.
pub struct ApplicationBuilder<D> {
    config: Option<Config>,
    driver: Option<D>,
    cancellation: Option<CancellationToken>,
}

impl<D: FanDriver> ApplicationBuilder<D> {
    fn new() -> Self {
        Self {
            config: None,
            driver: None,
            cancellation: None,
        }
    }

    /// Sets the validated configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the hardware driver the loop reads from and writes to.
    pub fn with_driver(mut self, driver: D) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Sets the token that ends the loop; a fresh one is used otherwise.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn build(self) -> Result<Application<D>> {
        let config = self
            .config
            .ok_or_else(|| anyhow::anyhow!("Configuration is required"))?;
        let driver = self
            .driver
            .ok_or_else(|| anyhow::anyhow!("Fan driver is required"))?;

        Ok(Application {
            control: ControlLoop::new(
                driver,
                config.thresholds,
                config.poll_interval,
                self.cancellation.unwrap_or_else(CancellationToken::new),
            ),
        })
    }
}
