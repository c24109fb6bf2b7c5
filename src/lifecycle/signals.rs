//! Binding of OS termination signals to a [`ShutdownCoordinator`].
//!
//! SIGINT and SIGTERM are handled on Unix; elsewhere only Ctrl-C is. SIGKILL
//! cannot be intercepted and is not handled.
//!
//! Only one coordinator per process may be bound. Every delivered signal is
//! dispatched to the coordinator on its own task, so a signal arriving while
//! a run is in progress hits the busy check and is dropped instead of waiting
//! behind the active run.

use super::{RunOutcome, ShutdownCoordinator};
use crate::types::{GateError, Result};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

static LISTENING: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => write!(f, "SIGINT"),
            Self::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Binds the process's termination signals to `coordinator`.
///
/// Must be called from within a tokio runtime. Fails with
/// [`GateError::AlreadyListening`] if signals are already bound.
pub fn listen(coordinator: Arc<ShutdownCoordinator>) -> Result<JoinHandle<()>> {
    if LISTENING
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return Err(GateError::AlreadyListening);
    }

    let signals = match SignalStream::bind() {
        Ok(signals) => signals,
        Err(e) => {
            LISTENING.store(false, Ordering::Release);
            return Err(e.into());
        }
    };

    tracing::info!("Listening for termination signals");
    Ok(tokio::spawn(async move {
        let mut signals = signals;
        loop {
            let signal = match signals.recv().await {
                Ok(signal) => signal,
                Err(e) => {
                    tracing::error!(error = %e, "Signal listener failed");
                    return;
                }
            };
            tracing::info!(%signal, "Received termination signal");
            dispatch(coordinator.clone(), signal);
        }
    }))
}

/// Runs the coordinator's entry point for one signal on a separate task.
pub fn dispatch(
    coordinator: Arc<ShutdownCoordinator>,
    signal: TerminationSignal,
) -> JoinHandle<RunOutcome> {
    tokio::spawn(async move {
        let outcome = coordinator.on_termination_signal().await;
        tracing::debug!(%signal, ?outcome, "Termination signal handled");
        outcome
    })
}

#[cfg(unix)]
struct SignalStream {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalStream {
    fn bind() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> std::io::Result<TerminationSignal> {
        tokio::select! {
            Some(()) = self.interrupt.recv() => Ok(TerminationSignal::Interrupt),
            Some(()) = self.terminate.recv() => Ok(TerminationSignal::Terminate),
            else => Err(std::io::Error::other("signal streams closed")),
        }
    }
}

#[cfg(not(unix))]
struct SignalStream;

#[cfg(not(unix))]
impl SignalStream {
    fn bind() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> std::io::Result<TerminationSignal> {
        tokio::signal::ctrl_c().await?;
        Ok(TerminationSignal::Interrupt)
    }
}
