use std::{ffi::OsStr, path::PathBuf, process::ExitCode};

use clap::{Parser, error::ErrorKind};

use crate::config::defaults;

/// fanctrld - turns the ThinkPad fan off once the BIOS has slowed it down
/// and back on when it gets hot
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, allow_negative_numbers = true)]
pub struct Cli {
    /// Fan speed below which the fan is switched off
    #[arg(short = 'r', value_name = "RPM", default_value_t = defaults::RPM_THRESHOLD)]
    pub rpm_threshold: i64,

    /// Temperature in °C above which the fan is forced on
    #[arg(short = 't', value_name = "CELSIUS", default_value_t = defaults::THERMAL_THRESHOLD)]
    pub thermal_threshold: i64,

    /// Seconds between two samples
    #[arg(short = 'p', value_name = "SECONDS", default_value_t = defaults::POLL_SECONDS)]
    pub poll_seconds: i64,

    /// Log every sample at debug level
    #[arg(short = 'd')]
    pub debug: bool,

    /// Stay in the foreground instead of detaching
    #[arg(short = 'f', long = "foreground")]
    pub foreground: bool,

    /// Directory holding the thinkpad_acpi `thermal` and `fan` files
    #[arg(long = "base-path", value_name = "DIR", default_value = defaults::BASE_PATH)]
    pub base_path: PathBuf,
}

/// Name used for stderr messages and the syslog identity.
pub fn program_name(argv0: Option<&OsStr>) -> String {
    argv0
        .map(std::path::Path::new)
        .and_then(|p| p.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

/// Prints a parse failure and maps it to the exit status: help and version
/// succeed, every usage error exits with 1.
pub fn usage_exit(err: clap::Error) -> ExitCode {
    let _ = err.print();
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
