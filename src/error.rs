//! Error types for the daemon.
//!
//! [`FanError`] covers every failure while talking to the ACPI files and is
//! always handed to the [`FailureEscalator`](crate::escalation::FailureEscalator).
//! [`ConfigError`] is raised before the daemon detaches and goes to stderr.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::drivers::thinkpad_acpi::procfs::FanCommand;

/// I/O failure on one of the thinkpad_acpi files.
#[derive(Debug, Error)]
pub enum FanError {
    #[error("Can't open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Can't read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Can't parse {}: Premature end of file", path.display())]
    PrematureEof { path: PathBuf },

    #[error("Can't parse temperature in {}: expected `temperatures` label, found {found:?}", path.display())]
    MissingLabel { path: PathBuf, found: String },

    #[error("Can't set fan state to {command} via {}: {source}", path.display())]
    Write {
        path: PathBuf,
        command: FanCommand,
        #[source]
        source: io::Error,
    },
}

/// Invalid command line value, reported before detaching.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("RPM threshold must be at least {min}, got {value}")]
    RpmThreshold { value: i64, min: i64 },

    #[error("You like it hot. Please give a thermal threshold of at most {max}, got {value}")]
    ThermalTooHigh { value: i64, max: i64 },

    #[error("You want hell to freeze? Please give a positive thermal threshold, got {value}")]
    ThermalNegative { value: i64 },

    #[error("Please select a poll interval between 0 and {max}, got {value}")]
    PollInterval { value: i64, max: i64 },

    #[error("Can't use {}: {reason}", path.display())]
    BasePath { path: PathBuf, reason: String },
}
