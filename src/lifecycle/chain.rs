use super::{Continuation, Handler, Phase};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The handler resolved its continuation with `false`.
    Declined,
    /// The continuation was dropped without being resolved.
    Abandoned,
    /// The handler panicked while being invoked.
    Panicked,
    /// No decision arrived within the configured handler timeout.
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    Approved,
    Rejected {
        index: usize,
        name: String,
        reason: RejectReason,
    },
}

impl ChainOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Invokes `handlers` one at a time, in order, stopping at the first one that
/// does not approve. An empty chain is approved without invoking anything.
pub async fn run_chain(
    phase: Phase,
    handlers: &[Arc<dyn Handler>],
    timeout: Option<Duration>,
) -> ChainOutcome {
    for (index, handler) in handlers.iter().enumerate() {
        let name = handler.name();
        tracing::debug!(%phase, index, name, "Invoking handler");

        let (done, rx) = Continuation::channel();
        if panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(done))).is_err() {
            tracing::warn!(%phase, index, name, "Handler panicked");
            return rejected(index, name, RejectReason::Panicked);
        }

        let decision = match timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received.ok(),
                Err(_) => {
                    tracing::warn!(
                        %phase,
                        index,
                        name,
                        timeout_ms = limit.as_millis() as u64,
                        "Handler did not respond in time"
                    );
                    return rejected(index, name, RejectReason::TimedOut);
                }
            },
            None => rx.await.ok(),
        };

        match decision {
            Some(true) => continue,
            Some(false) => return rejected(index, name, RejectReason::Declined),
            None => {
                tracing::warn!(%phase, index, name, "Handler dropped its continuation");
                return rejected(index, name, RejectReason::Abandoned);
            }
        }
    }

    ChainOutcome::Approved
}

fn rejected(index: usize, name: &str, reason: RejectReason) -> ChainOutcome {
    ChainOutcome::Rejected {
        index,
        name: name.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::named;
    use crate::test_utils::{deciding, CallLog};

    #[tokio::test]
    async fn test_empty_chain_is_approved() {
        let outcome = run_chain(Phase::Approval, &[], None).await;
        assert_eq!(outcome, ChainOutcome::Approved);
    }

    #[tokio::test]
    async fn test_runs_all_handlers_in_order() {
        let log = CallLog::default();
        let handlers = vec![
            deciding(&log, "a", true),
            deciding(&log, "b", true),
            deciding(&log, "c", true),
        ];

        let outcome = run_chain(Phase::Cleanup, &handlers, None).await;
        assert!(outcome.is_approved());
        assert_eq!(log.calls(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_short_circuits_on_first_rejection() {
        let log = CallLog::default();
        let handlers = vec![
            deciding(&log, "a", true),
            deciding(&log, "b", false),
            deciding(&log, "c", true),
        ];

        let outcome = run_chain(Phase::Approval, &handlers, None).await;
        assert_eq!(
            outcome,
            ChainOutcome::Rejected {
                index: 1,
                name: "b".into(),
                reason: RejectReason::Declined,
            }
        );
        assert_eq!(log.calls(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_waits_for_deferred_continuation() {
        let log = CallLog::default();
        let slow = named("slow", |done: Continuation| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                done.approve();
            });
        });
        let handlers = vec![slow, deciding(&log, "after", true)];

        let outcome = run_chain(Phase::Approval, &handlers, None).await;
        assert!(outcome.is_approved());
        assert_eq!(log.calls(), vec!["after"]);
    }

    #[tokio::test]
    async fn test_dropped_continuation_rejects() {
        let handlers = vec![named("forgetful", |done: Continuation| drop(done))];
        let outcome = run_chain(Phase::Approval, &handlers, None).await;
        assert!(matches!(
            outcome,
            ChainOutcome::Rejected {
                reason: RejectReason::Abandoned,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_panicking_handler_rejects() {
        let handlers = vec![named("boom", |_done: Continuation| panic!("boom"))];
        let outcome = run_chain(Phase::Cleanup, &handlers, None).await;
        assert!(matches!(
            outcome,
            ChainOutcome::Rejected {
                reason: RejectReason::Panicked,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_rejects_stalled_handler() {
        let log = CallLog::default();
        let stalled = named("stalled", |done: Continuation| {
            tokio::spawn(async move {
                std::future::pending::<()>().await;
                done.approve();
            });
        });
        let handlers = vec![stalled, deciding(&log, "never", true)];

        let outcome = run_chain(Phase::Approval, &handlers, Some(Duration::from_secs(5))).await;
        assert!(matches!(
            outcome,
            ChainOutcome::Rejected {
                index: 0,
                reason: RejectReason::TimedOut,
                ..
            }
        ));
        assert!(log.calls().is_empty());
    }
}
