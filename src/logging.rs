//! Syslog backend for the `log` facade.
//!
//! `log` only knows five levels, but the daemon also reports at the syslog
//! `notice`, `alert` and `emerg` severities. Those are selected with the
//! [`NOTICE`], [`ALERT`] and [`EMERG`] targets:
//!
//! ```no_run
//! use fanctrld::logging::{ALERT, EMERG};
//!
//! log::error!(target: ALERT, "Trying to turn on the fan before exiting.");
//! log::error!(target: EMERG, "Too many errors, exiting. Risk of overheating.");
//! ```

use std::sync::Mutex;

use anyhow::{Result, anyhow};
use log::{Level, LevelFilter, Metadata, Record};
use syslog::{Facility, Formatter3164, Logger, LoggerBackend};

pub const NOTICE: &str = "notice";
pub const ALERT: &str = "alert";
pub const EMERG: &str = "emerg";

/// Syslog severity a record is delivered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Emergency,
    Alert,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

impl Severity {
    pub fn of(level: Level, target: &str) -> Self {
        match (target, level) {
            (EMERG, _) => Severity::Emergency,
            (ALERT, _) => Severity::Alert,
            (NOTICE, _) => Severity::Notice,
            (_, Level::Error) => Severity::Error,
            (_, Level::Warn) => Severity::Warning,
            (_, Level::Info) => Severity::Info,
            (_, Level::Debug | Level::Trace) => Severity::Debug,
        }
    }
}

struct SyslogBridge {
    logger: Mutex<Logger<LoggerBackend, Formatter3164>>,
    level: LevelFilter,
}

impl log::Log for SyslogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = record.args().to_string();
        let Ok(mut logger) = self.logger.lock() else {
            return;
        };

        let _ = match Severity::of(record.level(), record.target()) {
            Severity::Emergency => logger.emerg(message),
            Severity::Alert => logger.alert(message),
            Severity::Error => logger.err(message),
            Severity::Warning => logger.warning(message),
            Severity::Notice => logger.notice(message),
            Severity::Info => logger.info(message),
            Severity::Debug => logger.debug(message),
        };
    }

    fn flush(&self) {}
}

/// Installs the syslog logger under `process` with the current pid.
///
/// Must run after detaching, otherwise the pid belongs to the parent.
pub fn init(process: &str, level: LevelFilter) -> Result<()> {
    syslog::unix(Formatter3164 {
        facility: Facility::LOG_DAEMON,
        hostname: None,
        process: process.into(),
        pid: std::process::id(),
    })
    .map_err(|e| anyhow!("{e}"))
    .and_then(|logger| {
        log::set_boxed_logger(Box::new(SyslogBridge {
            logger: Mutex::new(logger),
            level,
        }))
        .map(|_| log::set_max_level(level))
        .map_err(|e| anyhow!("{e}"))
    })
}
