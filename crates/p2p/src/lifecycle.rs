//! Cancellable scopes used to propagate shutdown without polling.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};

use futures::{
    channel::oneshot,
    future::{select, BoxFuture, Shared},
    FutureExt,
};

struct RawLifecycle {
    cancelled: AtomicBool,
    trigger: Mutex<Option<oneshot::Sender<()>>>,
    done: Shared<oneshot::Receiver<()>>,
    parent: Option<Lifecycle>,
}

/// A cancellable scope.
///
/// A scope is done when [`cancel`](Self::cancel) is called on it or on any of its ancestors,
/// or when every handle of the scope is dropped.
#[derive(Clone)]
pub struct Lifecycle(Arc<RawLifecycle>);

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Create a root scope.
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<Lifecycle>) -> Self {
        let (sender, receiver) = oneshot::channel();

        Self(Arc::new(RawLifecycle {
            cancelled: AtomicBool::new(false),
            trigger: Mutex::new(Some(sender)),
            done: receiver.shared(),
            parent,
        }))
    }

    /// Derive a child scope, cancelling the child never affects `self`.
    pub fn child(&self) -> Self {
        Self::with_parent(Some(self.clone()))
    }

    /// Cancel this scope and all of its descendants. calling it twice has no effect.
    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::Release);

        // dropping the sender wakes up all `cancelled` futures.
        self.0
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Returns true if this scope or one of its ancestors is cancelled.
    pub fn is_cancelled(&self) -> bool {
        if self.0.cancelled.load(Ordering::Acquire) {
            return true;
        }

        match &self.0.parent {
            Some(parent) => parent.is_cancelled(),
            None => false,
        }
    }

    /// Returns a future that resolves once this scope is done.
    pub fn cancelled(&self) -> BoxFuture<'static, ()> {
        let done = self.0.done.clone();

        match &self.0.parent {
            Some(parent) => {
                let parent = parent.cancelled();

                Box::pin(async move {
                    select(done, parent).await;
                })
            }
            None => Box::pin(async move {
                _ = done.await;
            }),
        }
    }
}
