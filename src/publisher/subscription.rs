//! Subscriptions and the cancellation handles they own.

use super::subscriber::Demand;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace};
use uuid::Uuid;

/// Handle returned by a resource that lets the caller abandon an in-flight operation.
///
/// Cancellation is cooperative: the operation may still report a result
/// afterwards, which the publisher then discards.
pub trait CancelHandle: Send + Sync {
    fn cancel(&self);
}

pub type BoxCancelHandle = Box<dyn CancelHandle>;

impl<H: CancelHandle + ?Sized> CancelHandle for Arc<H> {
    fn cancel(&self) {
        (**self).cancel()
    }
}

impl<H: CancelHandle + ?Sized> CancelHandle for Box<H> {
    fn cancel(&self) {
        (**self).cancel()
    }
}

impl CancelHandle for tokio_util::sync::CancellationToken {
    fn cancel(&self) {
        tokio_util::sync::CancellationToken::cancel(self)
    }
}

impl CancelHandle for tokio::task::AbortHandle {
    fn cancel(&self) {
        self.abort()
    }
}

/// A [`CancelHandle`] backed by a closure, see [`cancel_fn`].
pub struct FnCancelHandle<F> {
    f: F,
}

impl<F> CancelHandle for FnCancelHandle<F>
where
    F: Fn() + Send + Sync,
{
    fn cancel(&self) {
        (self.f)()
    }
}

/// Wrap a closure as a boxed [`CancelHandle`].
pub fn cancel_fn<F>(f: F) -> BoxCancelHandle
where
    F: Fn() + Send + Sync + 'static,
{
    Box::new(FnCancelHandle { f })
}

/// The per-subscribe token handed to both the subscriber and the caller.
///
/// Clones share state. The resource's cancel handle is owned here until
/// either the subscription is cancelled or a terminal signal is latched, at
/// which point it is released and further `cancel` calls are no-ops.
#[derive(Clone)]
pub struct Subscription {
    state: Arc<SubscriptionState>,
}

struct SubscriptionState {
    id: Uuid,
    handle: Mutex<Option<BoxCancelHandle>>,
    cancelled: AtomicBool,
    terminated: AtomicBool,
}

impl Subscription {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(SubscriptionState {
                id: Uuid::new_v4(),
                handle: Mutex::new(None),
                cancelled: AtomicBool::new(false),
                terminated: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.state.id
    }

    /// Stop forwarding signals and ask the resource to stop producing them.
    ///
    /// Idempotent. After a terminal signal this does nothing.
    pub fn cancel(&self) {
        if self.is_terminated() {
            trace!(subscription = %self.state.id, "cancel after terminal signal ignored");
            return;
        }
        if self.state.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        // Take the handle before invoking it so a resource that reports
        // synchronously from `cancel` cannot contend on the slot.
        let handle = self.lock_handle().take();
        match handle {
            Some(h) => {
                debug!(subscription = %self.state.id, "cancelling in-flight operation");
                h.cancel();
            }
            None => {
                debug!(subscription = %self.state.id, "cancelled before a cancel handle was attached");
            }
        }
    }

    /// Accepted for protocol compatibility; publishers here do not model backpressure.
    pub fn request(&self, demand: Demand) {
        trace!(subscription = %self.state.id, ?demand, "demand ignored");
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    pub fn is_terminated(&self) -> bool {
        self.state.terminated.load(Ordering::Acquire)
    }

    /// Store the handle returned by the resource's start call.
    pub(crate) fn attach(&self, handle: Option<BoxCancelHandle>) {
        let Some(handle) = handle else {
            return;
        };
        let mut slot = self.lock_handle();
        if self.is_terminated() {
            // Completed synchronously, nothing left to cancel.
            return;
        }
        if self.is_cancelled() {
            drop(slot);
            debug!(subscription = %self.state.id, "cancelled during start, cancelling in-flight operation");
            handle.cancel();
            return;
        }
        *slot = Some(handle);
    }

    /// Latch the terminal flag and release the cancel handle.
    ///
    /// Returns `false` if a terminal signal was already latched.
    pub(crate) fn terminate(&self) -> bool {
        if self.state.terminated.swap(true, Ordering::AcqRel) {
            return false;
        }
        drop(self.lock_handle().take());
        true
    }

    fn lock_handle(&self) -> std::sync::MutexGuard<'_, Option<BoxCancelHandle>> {
        self.state
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.state.id)
            .field("cancelled", &self.is_cancelled())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}
