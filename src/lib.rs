//! # fanctrld
//!
//! A Linux daemon that keeps a ThinkPad fan quiet via the `thinkpad_acpi`
//! procfs interface.
//!
//! ## Behaviour
//!
//! - **Hysteresis**: the fan is switched off once the BIOS has slowed it
//!   below an rpm threshold, and switched back on above a temperature
//!   threshold
//! - **Fail safe**: any I/O failure ends the daemon, trying once to leave the
//!   fan enabled
//! - **Clean shutdown**: termination signals end the loop with the fan
//!   enabled
//! - **Syslog**: all operational messages go to the system log
//!
//! ## Architecture
//!
//! - [`ControlLoop`](control_loop::ControlLoop) - sampling, decision and actuation
//! - [`ThinkpadAcpi`](drivers::thinkpad_acpi::ThinkpadAcpi) - procfs sensor reader and fan switch
//! - [`FailureEscalator`](escalation::FailureEscalator) - I/O failure policy
//! - [`SignalShutdown`](shutdown::SignalShutdown) - signal to cancellation bridge
//!
//! ## Example
//!
//! ```no_run
//! use fanctrld::{application::Application, config::Config, drivers::thinkpad_acpi::ThinkpadAcpi};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let outcome = Application::builder()
//!         .with_driver(ThinkpadAcpi::new(&config.base_path))
//!         .with_config(config)
//!         .build()?
//!         .run()
//!         .await;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod control_loop;
pub mod drivers;
pub mod error;
pub mod escalation;
pub mod fan_controller;
pub mod logging;
pub mod sensors;
pub mod shutdown;
