use super::chain::{run_chain, ChainOutcome, RejectReason};
use super::registry::TokenSource;
use super::{ExitProcess, Handler, HandlerRegistry, HandlerToken, Phase, ProcessExit};
use crate::config::GateConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    RunningApproval,
    RunningCleanup,
    Exiting,
}

/// How a single signal was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another run was already active; the signal was dropped.
    Busy,
    ApprovalRejected {
        index: usize,
        name: String,
        reason: RejectReason,
    },
    CleanupRejected {
        index: usize,
        name: String,
        reason: RejectReason,
    },
    /// Both phases succeeded and the exit hook was called.
    Exited,
}

/// Two-phase shutdown gate: every approval handler must agree, then every
/// cleanup handler must succeed, before the process exits.
pub struct ShutdownCoordinator {
    config: GateConfig,
    approval: HandlerRegistry,
    cleanup: HandlerRegistry,
    running: AtomicBool,
    state_tx: watch::Sender<CoordinatorState>,
    state_rx: watch::Receiver<CoordinatorState>,
    exit: Arc<dyn ProcessExit>,
}

impl ShutdownCoordinator {
    pub fn new(config: GateConfig) -> Self {
        Self::with_exit(config, Arc::new(ExitProcess))
    }

    pub fn with_exit(config: GateConfig, exit: Arc<dyn ProcessExit>) -> Self {
        let tokens = Arc::new(TokenSource::default());
        let (state_tx, state_rx) = watch::channel(CoordinatorState::Idle);
        Self {
            config,
            approval: HandlerRegistry::new(Phase::Approval, tokens.clone()),
            cleanup: HandlerRegistry::new(Phase::Cleanup, tokens),
            running: AtomicBool::new(false),
            state_tx,
            state_rx,
            exit,
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn state(&self) -> CoordinatorState {
        *self.state_rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state_rx.clone()
    }

    pub async fn register_approval_handler(&self, handler: Arc<dyn Handler>) -> HandlerToken {
        self.approval.register(handler).await
    }

    pub async fn unregister_approval_handler(&self, token: HandlerToken) -> bool {
        Self::unregister(&self.approval, token).await
    }

    pub async fn register_cleanup_handler(&self, handler: Arc<dyn Handler>) -> HandlerToken {
        self.cleanup.register(handler).await
    }

    pub async fn unregister_cleanup_handler(&self, token: HandlerToken) -> bool {
        Self::unregister(&self.cleanup, token).await
    }

    pub async fn approval_handler_count(&self) -> usize {
        self.approval.count().await
    }

    pub async fn cleanup_handler_count(&self) -> usize {
        self.cleanup.count().await
    }

    async fn unregister(registry: &HandlerRegistry, token: HandlerToken) -> bool {
        let removed = registry.unregister(token).await;
        if !removed {
            tracing::warn!(%token, "Handler was not found, nothing unregistered");
        }
        removed
    }

    /// Entry point for a delivered termination signal.
    ///
    /// Returns only when the run has concluded without exiting, or right away
    /// with [`RunOutcome::Busy`] when a run is already in progress.
    pub async fn on_termination_signal(&self) -> RunOutcome {
        let Some(guard) = RunGuard::claim(self) else {
            tracing::debug!("Shutdown handlers already in progress, ignoring signal");
            return RunOutcome::Busy;
        };

        guard.enter(CoordinatorState::RunningApproval);
        tracing::info!("Termination requested, running approval handlers");
        let handlers = self.approval.snapshot().await;
        if let ChainOutcome::Rejected {
            index,
            name,
            reason,
        } = run_chain(Phase::Approval, &handlers, self.config.handler_timeout).await
        {
            tracing::info!(
                index,
                name = %name,
                ?reason,
                "Shutdown rejected by an approval handler"
            );
            return RunOutcome::ApprovalRejected {
                index,
                name,
                reason,
            };
        }

        guard.enter(CoordinatorState::RunningCleanup);
        tracing::info!("Shutdown approved, running cleanup handlers");
        let handlers = self.cleanup.snapshot().await;
        if let ChainOutcome::Rejected {
            index,
            name,
            reason,
        } = run_chain(Phase::Cleanup, &handlers, self.config.handler_timeout).await
        {
            tracing::warn!(
                index,
                name = %name,
                ?reason,
                "Shutdown cancelled by a cleanup handler after approval"
            );
            return RunOutcome::CleanupRejected {
                index,
                name,
                reason,
            };
        }

        guard.finish();
        self.exit.exit(self.config.exit_code);
        RunOutcome::Exited
    }
}

/// Holds the `running` flag for one run. Dropping it without `finish` puts
/// the coordinator back to `Idle`, whether the run was rejected, its future
/// was cancelled, or a panic unwound through it.
struct RunGuard<'a> {
    coordinator: &'a ShutdownCoordinator,
    finished: bool,
}

impl<'a> RunGuard<'a> {
    fn claim(coordinator: &'a ShutdownCoordinator) -> Option<Self> {
        coordinator
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self {
            coordinator,
            finished: false,
        })
    }

    fn enter(&self, state: CoordinatorState) {
        let _ = self.coordinator.state_tx.send(state);
    }

    /// Moves to the terminal state; the flag stays set so later signals are
    /// dropped while the process exits.
    fn finish(mut self) {
        self.enter(CoordinatorState::Exiting);
        self.finished = true;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.coordinator.state_tx.send(CoordinatorState::Idle);
            self.coordinator.running.store(false, Ordering::Release);
        }
    }
}
