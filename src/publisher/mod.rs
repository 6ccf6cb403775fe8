//! 发布者/订阅者协议：把回调式、可取消的异步操作桥接为推送式流。
//!
//! # Publisher Layer
//!
//! This module implements the push-based publisher/subscriber protocol and the
//! adapter that bridges a callback-driven operation into it.
//!
//! ## Signal Contract
//!
//! ```text
//! on_subscribe → on_next* → (on_error | on_complete)?
//! ```
//!
//! - The [`Subscription`] is handed over before any value
//! - At most one terminal signal, always last
//! - After `cancel`, nothing further is forwarded
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Publisher`] | Trait with a single `subscribe` operation |
//! | [`AnyPublisher`] | Type-erased, cloneable publisher with `map` / `sink` / `into_stream` |
//! | [`Subscriber`] | Receiver of `next` / `error` / `complete` signals |
//! | [`Subscription`] | Per-subscribe handle owning the resource's [`CancelHandle`] |
//! | [`Emitter`] | Callback given to the resource to report results |
//! | [`SignalStream`] | `futures::Stream` view of a publisher |
//!
//! ## Example
//!
//! ```rust
//! use fetch_publisher::publisher::{AnyPublisher, Completion};
//! use fetch_publisher::CallbackQueue;
//!
//! let publisher: AnyPublisher<u32, String> =
//!     AnyPublisher::from_callback(CallbackQueue::inline(), |emitter| {
//!         emitter.emit(7, true);
//!         None
//!     });
//!
//! let _subscription = publisher.map(|v| v * 6).sink(
//!     |v| assert_eq!(v, 42),
//!     |c| assert_eq!(c, Completion::Finished),
//! );
//! ```

mod adapter;
mod stream;
mod subscriber;
mod subscription;


pub use adapter::Emitter;
pub use stream::SignalStream;
pub use subscriber::{BoxSubscriber, Completion, Demand, Signal, Sink, Subscriber};
pub use subscription::{cancel_fn, BoxCancelHandle, CancelHandle, FnCancelHandle, Subscription};

use crate::queue::CallbackQueue;
use std::sync::Arc;

/// A source of signals for any number of independent subscriptions.
pub trait Publisher<T, E>: Send + Sync + 'static {
    fn subscribe(&self, subscriber: BoxSubscriber<T, E>) -> Subscription;
}

/// Type-erased publisher. Cloning shares the underlying publisher.
pub struct AnyPublisher<T, E> {
    inner: Arc<dyn Publisher<T, E>>,
}

impl<T, E> Clone for AnyPublisher<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, E> AnyPublisher<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn new<P: Publisher<T, E>>(publisher: P) -> Self {
        Self {
            inner: Arc::new(publisher),
        }
    }

    /// Adapt a callback-driven operation.
    ///
    /// `start` runs once per subscription with an [`Emitter`] wired to that
    /// subscriber and returns the operation's cancel handle, or `None` if
    /// there is nothing left to cancel. Signals are delivered on `queue`.
    pub fn from_callback<F>(queue: CallbackQueue, start: F) -> Self
    where
        F: Fn(Emitter<T, E>) -> Option<BoxCancelHandle> + Send + Sync + 'static,
    {
        Self::new(adapter::FetchPublisher::new(queue, start))
    }

    pub fn subscribe<S: Subscriber<T, E>>(&self, subscriber: S) -> Subscription {
        self.inner.subscribe(Box::new(subscriber))
    }

    /// Subscribe with closures for values and for the terminal signal.
    pub fn sink<V, C>(&self, on_value: V, on_completion: C) -> Subscription
    where
        V: FnMut(T) + Send + 'static,
        C: FnOnce(Completion<E>) + Send + 'static,
    {
        self.subscribe(Sink::new(on_value, on_completion))
    }

    /// Transform every value. Signal count, order and cancellation are unchanged.
    pub fn map<U, F>(self, transform: F) -> AnyPublisher<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        AnyPublisher::new(MapPublisher {
            upstream: self,
            transform: Arc::new(transform),
        })
    }

    /// Subscribe and expose the signals as a `futures::Stream`.
    pub fn into_stream(self) -> SignalStream<T, E> {
        SignalStream::subscribe(&self)
    }
}

type Transform<T, U> = Arc<dyn Fn(T) -> U + Send + Sync>;

struct MapPublisher<T, U, E> {
    upstream: AnyPublisher<T, E>,
    transform: Transform<T, U>,
}

impl<T, U, E> Publisher<U, E> for MapPublisher<T, U, E>
where
    T: Send + 'static,
    U: Send + 'static,
    E: Send + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<U, E>) -> Subscription {
        self.upstream.subscribe(MapSubscriber {
            downstream: subscriber,
            transform: self.transform.clone(),
        })
    }
}

struct MapSubscriber<T, U, E> {
    downstream: BoxSubscriber<U, E>,
    transform: Transform<T, U>,
}

impl<T, U, E> Subscriber<T, E> for MapSubscriber<T, U, E>
where
    T: Send + 'static,
    U: Send + 'static,
    E: Send + 'static,
{
    fn on_subscribe(&mut self, subscription: Subscription) {
        self.downstream.on_subscribe(subscription);
    }

    fn on_next(&mut self, value: T) -> Demand {
        self.downstream.on_next((self.transform)(value))
    }

    fn on_error(&mut self, error: E) {
        self.downstream.on_error(error);
    }

    fn on_complete(&mut self) {
        self.downstream.on_complete();
    }
}
