//! User-triggered interruption of a run.
use anyhow::Result;
use log::warn;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A flag raised when the user asks the run to stop.
///
/// Loops poll the flag between environment steps; nothing is torn down
/// from the signal handler itself.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    /// Creates a signal that is only raised through [`ShutdownSignal::trigger`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a signal raised by Ctrl-C (SIGINT).
    ///
    /// Only one handler can be installed per process.
    pub fn install() -> Result<Self> {
        let signal = Self::new();
        let flag = signal.clone();
        ctrlc::set_handler(move || {
            warn!("Interrupt received, stopping after the current step");
            flag.trigger();
        })?;
        Ok(signal)
    }

    /// Raises the flag.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once the flag was raised.
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
