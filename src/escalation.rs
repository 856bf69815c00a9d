//! Failure escalation.
//!
//! Every I/O failure on the ACPI files ends the daemon. The first one gets a
//! single attempt at leaving the fan enabled; if that attempt fails as well,
//! or anything fails afterwards, the daemon gives up without touching the
//! hardware again.

use log::error;

use crate::{
    error::FanError,
    fan_controller::FanSwitch,
    logging::{ALERT, EMERG},
};

/// How the daemon ended after an I/O failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// The fan-enable recovery write went through.
    FailSafe,
    /// Too many failures; the fan state is unknown.
    Abandoned { failures: u32 },
}

/// Counts I/O failures for the lifetime of the process.
#[derive(Debug, Default)]
pub struct FailureEscalator {
    failures: u32,
}

impl FailureEscalator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Failures seen so far. Never decreases.
    #[cfg(test)]
    pub(crate) fn failures(&self) -> u32 {
        self.failures
    }

    /// Handles `error` and decides how the process ends.
    ///
    /// On the first failure the fan is switched on once; a failure of that
    /// write is counted as the next failure and ends escalation.
    pub async fn escalate<S>(&mut self, error: FanError, fan: &S) -> Escalation
    where
        S: FanSwitch + ?Sized,
    {
        let mut error = error;
        loop {
            self.failures = self.failures.saturating_add(1);
            error!(target: ALERT, "{error}");

            if self.failures > 1 {
                error!(target: EMERG, "Too many errors, exiting. Risk of overheating.");
                return Escalation::Abandoned {
                    failures: self.failures,
                };
            }

            error!(target: ALERT, "Trying to turn on the fan before exiting.");
            match fan.set_fan(true).await {
                Ok(()) => return Escalation::FailSafe,
                Err(e) => error = e,
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn with_failures(failures: u32) -> Self {
        Self { failures }
    }
}
