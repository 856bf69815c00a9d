//! Signal driven shutdown.
//!
//! SIGHUP, SIGINT, SIGQUIT and SIGTERM only cancel a [`CancellationToken`].
//! The signals are received by signal-hook and handled on a dedicated
//! thread, so logging the notice never runs inside a signal handler. The
//! control loop notices the token at its next iteration and performs the
//! final fan-enable write itself.

use std::{
    io,
    thread::{self, JoinHandle},
};

use log::info;
use signal_hook::{
    consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM},
    iterator::{Handle, Signals},
};
use tokio_util::sync::CancellationToken;

use crate::logging::NOTICE;

/// Signals that request termination.
pub const TERMINATION_SIGNALS: [i32; 4] = [SIGHUP, SIGINT, SIGQUIT, SIGTERM];

/// Keeps the signal thread alive; dropping it unregisters the handlers.
pub struct SignalShutdown {
    token: CancellationToken,
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalShutdown {
    /// Registers the termination signals. Receiving any of them cancels
    /// `token`.
    pub fn install(token: CancellationToken) -> io::Result<Self> {
        let mut signals = Signals::new(TERMINATION_SIGNALS)?;
        let handle = signals.handle();

        let thread = thread::Builder::new().name("signals".into()).spawn({
            let token = token.clone();
            move || {
                for signal in signals.forever() {
                    on_signal(signal, &token);
                }
            }
        })?;

        Ok(Self {
            token,
            handle,
            thread: Some(thread),
        })
    }

    /// Token cancelled by the first termination signal.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for SignalShutdown {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Reaction to one termination signal. Repeated signals are harmless.
pub fn on_signal(signal: i32, token: &CancellationToken) {
    info!(target: NOTICE, "Caught signal {signal}, exiting.");
    token.cancel();
}
