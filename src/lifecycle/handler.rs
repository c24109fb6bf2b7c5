use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;

/// One-shot completion callback handed to every handler invocation.
///
/// Consuming `self` on resolve makes a second invocation impossible. Dropping
/// a continuation without resolving it is reported to the coordinator as a
/// rejection, since the phase could otherwise never make progress.
#[derive(Debug)]
pub struct Continuation {
    tx: oneshot::Sender<bool>,
}

impl Continuation {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<bool>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn resolve(self, approved: bool) {
        // The receiver is gone only if the run was abandoned (timeout).
        let _ = self.tx.send(approved);
    }

    pub fn approve(self) {
        self.resolve(true);
    }

    pub fn reject(self) {
        self.resolve(false);
    }
}

/// A participant in one of the two shutdown phases.
///
/// `invoke` must arrange for `done` to be resolved exactly once, either inline
/// or from a task it spawns.
pub trait Handler: Send + Sync + 'static {
    fn name(&self) -> &str {
        "anonymous"
    }

    fn invoke(&self, done: Continuation);
}

impl<F> Handler for F
where
    F: Fn(Continuation) + Send + Sync + 'static,
{
    fn invoke(&self, done: Continuation) {
        self(done)
    }
}

/// Closure handler carrying a diagnostic name.
pub struct Named<F> {
    name: String,
    f: F,
}

pub fn named<F>(name: impl Into<String>, f: F) -> Arc<dyn Handler>
where
    F: Fn(Continuation) + Send + Sync + 'static,
{
    Arc::new(Named {
        name: name.into(),
        f,
    })
}

impl<F> Handler for Named<F>
where
    F: Fn(Continuation) + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, done: Continuation) {
        (self.f)(done)
    }
}

/// Handler expressed as an async decision instead of a continuation.
#[async_trait]
pub trait AsyncHandler: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn decide(&self) -> bool;
}

/// Runs an [`AsyncHandler`] as its own tokio task and resolves the
/// continuation with the decision.
pub struct Spawned<H> {
    inner: Arc<H>,
}

pub fn spawned<H: AsyncHandler>(handler: H) -> Arc<dyn Handler> {
    Arc::new(Spawned {
        inner: Arc::new(handler),
    })
}

impl<H: AsyncHandler> Handler for Spawned<H> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn invoke(&self, done: Continuation) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let approved = inner.decide().await;
            done.resolve(approved);
        });
    }
}
