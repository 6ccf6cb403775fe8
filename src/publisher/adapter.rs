//! Callback-to-publisher bridge.
//!
//! [`FetchPublisher`] turns a start function of the shape
//! `Fn(Emitter) -> Option<BoxCancelHandle>` into a [`Publisher`]. Every subscribe
//! call runs the start function once; whatever the resource reports through the
//! [`Emitter`] is forwarded to the subscriber on the configured
//! [`CallbackQueue`].

use super::subscriber::{BoxSubscriber, Signal};
use super::subscription::{BoxCancelHandle, Subscription};
use super::Publisher;
use crate::queue::CallbackQueue;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace, warn};

type StartFn<T, E> = dyn Fn(Emitter<T, E>) -> Option<BoxCancelHandle> + Send + Sync;

pub(crate) struct FetchPublisher<T, E> {
    queue: CallbackQueue,
    start: Arc<StartFn<T, E>>,
}

impl<T, E> FetchPublisher<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub(crate) fn new<F>(queue: CallbackQueue, start: F) -> Self
    where
        F: Fn(Emitter<T, E>) -> Option<BoxCancelHandle> + Send + Sync + 'static,
    {
        Self {
            queue,
            start: Arc::new(start),
        }
    }
}

impl<T, E> Publisher<T, E> for FetchPublisher<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<T, E>) -> Subscription {
        let subscription = Subscription::new();
        let slot: SubscriberSlot<T, E> = Arc::new(Mutex::new(Some(subscriber)));
        debug!(
            subscription = %subscription.id(),
            queue = %self.queue.label(),
            "subscribing"
        );

        // The handshake is queued before the operation starts, so it precedes
        // any signal the resource reports, including synchronous ones.
        {
            let slot = slot.clone();
            let handshake = subscription.clone();
            self.queue.dispatch(move || {
                if let Some(s) = lock_slot(&slot).as_mut() {
                    s.on_subscribe(handshake);
                }
            });
        }

        let emitter = Emitter {
            shared: Arc::new(EmitterShared {
                subscription: subscription.clone(),
                subscriber: slot,
                queue: self.queue.clone(),
            }),
        };
        let handle = (self.start)(emitter);
        if handle.is_none() {
            trace!(subscription = %subscription.id(), "start returned no cancel handle");
        }
        subscription.attach(handle);
        subscription
    }
}

type SubscriberSlot<T, E> = Arc<Mutex<Option<BoxSubscriber<T, E>>>>;

fn lock_slot<T, E>(slot: &SubscriberSlot<T, E>) -> MutexGuard<'_, Option<BoxSubscriber<T, E>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The callback side of a subscription, handed to the resource's start function.
///
/// Cheap to clone and safe to call from any thread. Signals reported after
/// cancellation or after a terminal signal are discarded.
pub struct Emitter<T, E> {
    shared: Arc<EmitterShared<T, E>>,
}

struct EmitterShared<T, E> {
    subscription: Subscription,
    subscriber: SubscriberSlot<T, E>,
    queue: CallbackQueue,
}

impl<T, E> Clone for Emitter<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T, E> Emitter<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn next(&self, value: T) {
        self.send(Signal::Next(value));
    }

    pub fn error(&self, error: E) {
        self.send(Signal::Error(error));
    }

    pub fn complete(&self) {
        self.send(Signal::Complete);
    }

    /// Forward `value` and, if `is_final`, complete right after it.
    pub fn emit(&self, value: T, is_final: bool) {
        self.next(value);
        if is_final {
            self.complete();
        }
    }

    /// Whether the subscriber cancelled. Resources may poll this to stop early.
    pub fn is_cancelled(&self) -> bool {
        self.shared.subscription.is_cancelled()
    }

    pub fn send(&self, signal: Signal<T, E>) {
        let subscription = &self.shared.subscription;
        if subscription.is_cancelled() {
            debug!(subscription = %subscription.id(), "discarding signal after cancellation");
            return;
        }
        if signal.is_terminal() {
            if !subscription.terminate() {
                warn!(
                    subscription = %subscription.id(),
                    "discarding terminal signal, subscription already terminated"
                );
                return;
            }
        } else if subscription.is_terminated() {
            debug!(
                subscription = %subscription.id(),
                "discarding value, subscription already terminated"
            );
            return;
        }

        let shared = self.shared.clone();
        self.shared.queue.dispatch(move || shared.deliver(signal));
    }
}

impl<T, E> EmitterShared<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn deliver(&self, signal: Signal<T, E>) {
        let mut slot = lock_slot(&self.subscriber);
        // A terminal only reaches here cancelled if `cancel` raced the latch.
        if self.subscription.is_cancelled() {
            trace!(subscription = %self.subscription.id(), "subscription cancelled before delivery");
            if signal.is_terminal() {
                let _ = slot.take();
            }
            return;
        }
        match signal {
            Signal::Next(value) => {
                if let Some(s) = slot.as_mut() {
                    let demand = s.on_next(value);
                    trace!(subscription = %self.subscription.id(), ?demand, "value delivered");
                }
            }
            Signal::Error(error) => {
                if let Some(mut s) = slot.take() {
                    drop(slot);
                    debug!(subscription = %self.subscription.id(), "delivering error");
                    s.on_error(error);
                }
            }
            Signal::Complete => {
                if let Some(mut s) = slot.take() {
                    drop(slot);
                    debug!(subscription = %self.subscription.id(), "delivering completion");
                    s.on_complete();
                }
            }
        }
    }
}
