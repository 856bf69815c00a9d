//! The sampling / decision / actuation loop.
//!
//! Each iteration reads the fan speed and the temperature, derives the
//! desired fan state and writes it only when it differs from the state the
//! loop last recorded. The cancellation token is looked at once per
//! iteration, before sampling; reads and the poll sleep always run to
//! completion. Leaving the loop, for whatever reason other than an I/O
//! failure, ends with one unconditional fan-enable write.

use std::time::Duration;

use log::{debug, info};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Thresholds,
    error::FanError,
    escalation::{Escalation, FailureEscalator},
    fan_controller::FanDriver,
    sensors::SensorSample,
};

/// Logical state of the fan as last commanded by the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanState {
    Running,
    Stopped,
}

impl FanState {
    pub fn is_running(self) -> bool {
        self == FanState::Running
    }
}

impl From<bool> for FanState {
    fn from(running: bool) -> Self {
        if running {
            FanState::Running
        } else {
            FanState::Stopped
        }
    }
}

/// Hysteresis decision for one sample.
///
/// An observed speed above zero means the fan runs. Overheating forces it
/// on; otherwise a speed below the rpm threshold means the BIOS has slowed
/// the fan down and it is switched off.
pub fn decide(sample: SensorSample, thresholds: &Thresholds) -> FanState {
    if sample.temperature > thresholds.thermal {
        FanState::Running
    } else if sample.rpm < thresholds.rpm {
        FanState::Stopped
    } else {
        FanState::from(sample.rpm > 0)
    }
}

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Cancelled; the fan was left enabled.
    Shutdown,
    /// An I/O failure ended the loop.
    Escalated(Escalation),
}

impl Outcome {
    #[cfg(test)]
    pub(crate) fn is_success(self) -> bool {
        self == Outcome::Shutdown
    }
}

pub struct ControlLoop<D> {
    driver: D,
    thresholds: Thresholds,
    poll_interval: Duration,
    state: FanState,
    escalator: FailureEscalator,
    cancel: CancellationToken,
}

impl<D: FanDriver> ControlLoop<D> {
    /// The fan is assumed to be running at startup.
    pub fn new(
        driver: D,
        thresholds: Thresholds,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            driver,
            thresholds,
            poll_interval,
            state: FanState::Running,
            escalator: FailureEscalator::new(),
            cancel,
        }
    }

    pub fn state(&self) -> FanState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn driver(&self) -> &D {
        &self.driver
    }

    /// Runs until cancelled or until an I/O failure has been escalated.
    pub async fn run(&mut self) -> Outcome {
        match self.run_until_cancelled().await {
            Ok(()) => Outcome::Shutdown,
            Err(e) => Outcome::Escalated(self.escalator.escalate(e, &self.driver).await),
        }
    }

    async fn run_until_cancelled(&mut self) -> Result<(), FanError> {
        while !self.cancel.is_cancelled() {
            self.step().await?;
            tokio::time::sleep(self.poll_interval).await;
        }

        info!("Leaving the fan enabled.");
        self.driver.set_fan(true).await
    }

    /// One sample, decision and, if needed, one write.
    pub async fn step(&mut self) -> Result<FanState, FanError> {
        let sample = self.driver.sample().await?;
        debug!("r = {}, t = {}", sample.rpm, sample.temperature);

        let desired = decide(sample, &self.thresholds);
        if desired != self.state {
            info!(
                "r = {}, t = {}  --  {}",
                sample.rpm,
                sample.temperature,
                if desired.is_running() { "enabling" } else { "disabling" }
            );
            self.driver.set_fan(desired.is_running()).await?;
            self.state = desired;
        }

        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fan_controller::FanSwitch, sensors::SensorReader};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::{
        collections::VecDeque,
        path::PathBuf,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    const THRESHOLDS: Thresholds = Thresholds {
        rpm: 3500,
        thermal: 45,
    };

    fn sample(rpm: i64, temperature: i64) -> SensorSample {
        SensorSample { temperature, rpm }
    }

    /// In-memory ACPI files. Samples are consumed in order; once they run
    /// out the last one repeats.
    #[derive(Default)]
    struct FakeAcpi {
        samples: Mutex<VecDeque<Result<SensorSample, ()>>>,
        last: Mutex<Option<SensorSample>>,
        writes: Mutex<Vec<bool>>,
        failing_writes: AtomicUsize,
        reads: AtomicUsize,
        cancel_on_read: Option<(usize, CancellationToken)>,
    }

    impl FakeAcpi {
        fn with_samples(samples: impl IntoIterator<Item = Result<SensorSample, ()>>) -> Self {
            Self {
                samples: Mutex::new(samples.into_iter().collect()),
                ..Self::default()
            }
        }

        fn failing_writes(self, count: usize) -> Self {
            self.failing_writes.store(count, Ordering::SeqCst);
            self
        }

        fn cancel_on_read(mut self, read: usize, token: CancellationToken) -> Self {
            self.cancel_on_read = Some((read, token));
            self
        }

        fn writes(&self) -> Vec<bool> {
            self.writes.lock().unwrap().clone()
        }

        fn next_sample(&self) -> Result<SensorSample, FanError> {
            let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((at, token)) = &self.cancel_on_read {
                if *at == read {
                    token.cancel();
                }
            }

            let next = self.samples.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            match next {
                Some(Ok(s)) => {
                    *last = Some(s);
                    Ok(s)
                }
                Some(Err(())) => Err(FanError::PrematureEof {
                    path: PathBuf::from("thermal"),
                }),
                None => (*last).ok_or(FanError::PrematureEof {
                    path: PathBuf::from("thermal"),
                }),
            }
        }
    }

    #[async_trait]
    impl SensorReader for FakeAcpi {
        async fn read_thermal(&self) -> Result<i64, FanError> {
            self.next_sample().map(|s| s.temperature)
        }

        async fn read_fan_speed(&self) -> Result<i64, FanError> {
            unreachable!("sample() is overridden")
        }

        async fn sample(&self) -> Result<SensorSample, FanError> {
            self.next_sample()
        }
    }

    #[async_trait]
    impl FanSwitch for FakeAcpi {
        async fn set_fan(&self, enable: bool) -> Result<(), FanError> {
            self.writes.lock().unwrap().push(enable);
            let failing = self.failing_writes.load(Ordering::SeqCst);
            if failing > 0 {
                self.failing_writes.store(failing - 1, Ordering::SeqCst);
                return Err(FanError::Write {
                    path: PathBuf::from("fan"),
                    command: enable.into(),
                    source: std::io::Error::other("EIO"),
                });
            }
            Ok(())
        }
    }

    fn control(driver: FakeAcpi, cancel: CancellationToken) -> ControlLoop<FakeAcpi> {
        ControlLoop::new(driver, THRESHOLDS, Duration::from_secs(5), cancel)
    }

    #[test]
    fn overheating_forces_fan_on() {
        assert_eq!(decide(sample(0, 46), &THRESHOLDS), FanState::Running);
        assert_eq!(decide(sample(1200, 60), &THRESHOLDS), FanState::Running);
    }

    #[test]
    fn slow_fan_is_switched_off() {
        assert_eq!(decide(sample(3000, 45), &THRESHOLDS), FanState::Stopped);
        assert_eq!(decide(sample(0, 30), &THRESHOLDS), FanState::Stopped);
    }

    #[test]
    fn fast_fan_keeps_running() {
        assert_eq!(decide(sample(3500, 45), &THRESHOLDS), FanState::Running);
    }

    proptest! {
        #[test]
        fn hot_always_runs(rpm in -10i64..10_000, temp in 46i64..130) {
            prop_assert_eq!(decide(sample(rpm, temp), &THRESHOLDS), FanState::Running);
        }

        #[test]
        fn cool_and_slow_always_stops(rpm in -10i64..3500, temp in -128i64..=45) {
            prop_assert_eq!(decide(sample(rpm, temp), &THRESHOLDS), FanState::Stopped);
        }

        #[test]
        fn cool_and_fast_follows_observed_speed(rpm in 3500i64..10_000, temp in -128i64..=45) {
            prop_assert_eq!(decide(sample(rpm, temp), &THRESHOLDS), FanState::from(rpm > 0));
        }
    }

    #[tokio::test]
    async fn repeated_decisions_write_once() {
        let driver = FakeAcpi::with_samples([
            Ok(sample(3000, 40)),
            Ok(sample(2800, 40)),
            Ok(sample(0, 41)),
        ]);
        let mut control = control(driver, CancellationToken::new());

        for _ in 0..3 {
            assert_eq!(control.step().await.unwrap(), FanState::Stopped);
        }
        assert_eq!(control.driver().writes(), vec![false]);
    }

    #[tokio::test]
    async fn running_fan_is_not_rewritten() {
        let driver = FakeAcpi::with_samples([Ok(sample(4200, 40)), Ok(sample(4100, 44))]);
        let mut control = control(driver, CancellationToken::new());

        control.step().await.unwrap();
        control.step().await.unwrap();
        assert!(control.driver().writes().is_empty());
        assert_eq!(control.state(), FanState::Running);
    }

    #[tokio::test]
    async fn follows_hysteresis_cycle() {
        let driver = FakeAcpi::with_samples([
            Ok(sample(3000, 40)),
            Ok(sample(0, 44)),
            Ok(sample(0, 50)),
            Ok(sample(4500, 48)),
            Ok(sample(3100, 42)),
        ]);
        let mut control = control(driver, CancellationToken::new());

        for _ in 0..5 {
            control.step().await.unwrap();
        }
        assert_eq!(control.driver().writes(), vec![false, true, false]);
    }

    #[tokio::test]
    async fn failed_write_keeps_recorded_state() {
        let driver = FakeAcpi::with_samples([Ok(sample(3000, 40))]).failing_writes(1);
        let mut control = control(driver, CancellationToken::new());

        assert!(control.step().await.is_err());
        assert_eq!(control.state(), FanState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_loop_enables_fan_once() {
        let token = CancellationToken::new();
        token.cancel();
        let mut control = control(FakeAcpi::default(), token);

        assert_eq!(control.run().await, Outcome::Shutdown);
        assert_eq!(control.driver().writes(), vec![true]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_is_seen_at_next_iteration() {
        let token = CancellationToken::new();
        let driver = FakeAcpi::with_samples([
            Ok(sample(4000, 40)),
            Ok(sample(3000, 40)),
            Ok(sample(3000, 40)),
        ])
        .cancel_on_read(2, token.clone());
        let mut control = control(driver, token);

        let outcome = control.run().await;

        assert!(outcome.is_success());
        assert_eq!(control.driver().reads.load(Ordering::SeqCst), 2);
        // The iteration in flight finishes its write before shutting down.
        assert_eq!(control.driver().writes(), vec![false, true]);
    }

    #[tokio::test(start_paused = true)]
    async fn read_failure_escalates_with_one_recovery_write() {
        let driver = FakeAcpi::with_samples([Ok(sample(4000, 40)), Err(())]);
        let mut control = control(driver, CancellationToken::new());

        let outcome = control.run().await;

        assert_eq!(outcome, Outcome::Escalated(Escalation::FailSafe));
        assert!(!outcome.is_success());
        assert_eq!(control.driver().writes(), vec![true]);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_recovery_gives_up() {
        let driver = FakeAcpi::with_samples([Err(())]).failing_writes(usize::MAX);
        let mut control = control(driver, CancellationToken::new());

        let outcome = control.run().await;

        assert_eq!(
            outcome,
            Outcome::Escalated(Escalation::Abandoned { failures: 2 })
        );
        assert_eq!(control.driver().writes(), vec![true]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_state_change_escalates() {
        let driver = FakeAcpi::with_samples([Ok(sample(3000, 40))]).failing_writes(1);
        let mut control = control(driver, CancellationToken::new());

        let outcome = control.run().await;

        assert_eq!(outcome, Outcome::Escalated(Escalation::FailSafe));
        assert_eq!(control.driver().writes(), vec![false, true]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_shutdown_write_is_escalated() {
        let token = CancellationToken::new();
        token.cancel();
        let driver = FakeAcpi::default().failing_writes(1);
        let mut control = control(driver, token);

        let outcome = control.run().await;

        assert_eq!(outcome, Outcome::Escalated(Escalation::FailSafe));
        assert_eq!(control.driver().writes(), vec![true, true]);
    }

    /// Driver that only implements the two reads and logs every access.
    struct RecordingAcpi {
        rpm: Result<i64, ()>,
        temperature: i64,
        accesses: Mutex<Vec<&'static str>>,
    }

    impl RecordingAcpi {
        fn new(rpm: Result<i64, ()>, temperature: i64) -> Self {
            Self {
                rpm,
                temperature,
                accesses: Mutex::new(Vec::new()),
            }
        }

        fn accesses(&self) -> Vec<&'static str> {
            self.accesses.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SensorReader for RecordingAcpi {
        async fn read_thermal(&self) -> Result<i64, FanError> {
            self.accesses.lock().unwrap().push("thermal");
            Ok(self.temperature)
        }

        async fn read_fan_speed(&self) -> Result<i64, FanError> {
            self.accesses.lock().unwrap().push("fan");
            self.rpm.map_err(|()| FanError::Open {
                path: PathBuf::from("fan"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
    }

    #[async_trait]
    impl FanSwitch for RecordingAcpi {
        async fn set_fan(&self, enable: bool) -> Result<(), FanError> {
            self.accesses
                .lock()
                .unwrap()
                .push(if enable { "enable" } else { "disable" });
            Ok(())
        }
    }

    #[tokio::test]
    async fn step_reads_fan_speed_before_temperature() {
        let driver = RecordingAcpi::new(Ok(3000), 40);
        let mut control = ControlLoop::new(
            driver,
            THRESHOLDS,
            Duration::from_secs(5),
            CancellationToken::new(),
        );

        assert_eq!(control.step().await.unwrap(), FanState::Stopped);
        assert_eq!(control.driver().accesses(), vec!["fan", "thermal", "disable"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fan_read_escalates_before_thermal_is_read() {
        let driver = RecordingAcpi::new(Err(()), 40);
        let mut control = ControlLoop::new(
            driver,
            THRESHOLDS,
            Duration::from_secs(5),
            CancellationToken::new(),
        );

        assert_eq!(control.run().await, Outcome::Escalated(Escalation::FailSafe));
        assert_eq!(control.driver().accesses(), vec!["fan", "enable"]);
    }
}
