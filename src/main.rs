use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use daemonize::Daemonize;
use log::{error, info};
use tokio_util::sync::CancellationToken;

use fanctrld::{
    application::Application,
    cli::{self, Cli},
    config::Config,
    control_loop::Outcome,
    drivers::thinkpad_acpi::ThinkpadAcpi,
    logging,
    shutdown::SignalShutdown,
};

fn into_daemon() -> Result<()> {
    Daemonize::new()
        .working_directory("/")
        .start()
        .map_err(|e| anyhow!("{e}"))
}

fn run(config: Config, progname: &str) -> Result<Outcome> {
    if !config.foreground {
        into_daemon().context("Can't detach")?;
    }

    logging::init(progname, config.log_level()).context("Can't connect to syslog")?;

    let shutdown = SignalShutdown::install(CancellationToken::new())
        .context("Can't install signal handlers")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Can't start runtime")?;

    info!(
        "Starting: rpm threshold {}, thermal threshold {}, poll interval {}s, {}",
        config.thresholds.rpm,
        config.thresholds.thermal,
        config.poll_interval.as_secs(),
        config.base_path.display()
    );

    let mut app = Application::builder()
        .with_driver(ThinkpadAcpi::new(&config.base_path))
        .with_config(config)
        .with_cancellation(shutdown.token())
        .build()?;

    Ok(runtime.block_on(app.run()))
}

fn main() -> ExitCode {
    let progname = cli::program_name(std::env::args_os().next().as_deref());

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return cli::usage_exit(e),
    };

    let config = match Config::try_from(cli).and_then(|config| {
        config.check_base_path()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{progname}: {e}.");
            return ExitCode::FAILURE;
        }
    };

    match run(config, &progname) {
        Ok(Outcome::Shutdown) => ExitCode::SUCCESS,
        Ok(Outcome::Escalated(_)) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            eprintln!("{progname}: {e:#}. Exiting.");
            ExitCode::FAILURE
        }
    }
}
