use super::Handler;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Approval,
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approval => write!(f, "approval"),
            Self::Cleanup => write!(f, "cleanup"),
        }
    }
}

/// Opaque handle returned on registration and required for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerToken {
    phase: Phase,
    id: u64,
}

impl HandlerToken {
    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl fmt::Display for HandlerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.phase, self.id)
    }
}

/// Source of tokens shared by both registries of one coordinator, so a token
/// never matches an entry in the other list.
#[derive(Debug, Default)]
pub(crate) struct TokenSource {
    next: AtomicU64,
}

impl TokenSource {
    fn issue(&self, phase: Phase) -> HandlerToken {
        HandlerToken {
            phase,
            id: self.next.fetch_add(1, Ordering::Relaxed),
        }
    }
}

pub struct HandlerRegistry {
    phase: Phase,
    tokens: Arc<TokenSource>,
    handlers: RwLock<Vec<(HandlerToken, Arc<dyn Handler>)>>,
}

impl HandlerRegistry {
    pub(crate) fn new(phase: Phase, tokens: Arc<TokenSource>) -> Self {
        Self {
            phase,
            tokens,
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub async fn register(&self, handler: Arc<dyn Handler>) -> HandlerToken {
        let token = self.tokens.issue(self.phase);
        let mut handlers = self.handlers.write().await;
        tracing::debug!(%token, name = handler.name(), "Registering handler");
        handlers.push((token, handler));
        token
    }

    /// Removes the entry issued under `token`. Returns `false` and leaves the
    /// list untouched when no such entry exists.
    pub async fn unregister(&self, token: HandlerToken) -> bool {
        let mut handlers = self.handlers.write().await;
        match handlers.iter().position(|(t, _)| *t == token) {
            Some(index) => {
                handlers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Handlers in invocation order, as of now.
    pub async fn snapshot(&self) -> Vec<Arc<dyn Handler>> {
        self.handlers
            .read()
            .await
            .iter()
            .map(|(_, h)| h.clone())
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.handlers.read().await.len()
    }
}
