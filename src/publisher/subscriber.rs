//! Consumer side of the publisher protocol.

use super::subscription::Subscription;

/// Demand a subscriber signals after receiving a value.
///
/// Publishers in this crate never throttle, so demand is acknowledged but has
/// no effect on delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demand {
    Unlimited,
    Max(usize),
    None,
}

/// One signal of the publisher protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal<T, E> {
    Next(T),
    Error(E),
    Complete,
}

impl<T, E> Signal<T, E> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Signal::Next(_))
    }
}

/// How a subscription ended, as seen by a [`Sink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<E> {
    Finished,
    Failure(E),
}

/// Receives signals from a publisher.
///
/// The contract: `on_subscribe` first, then zero or more `on_next`, then at most
/// one of `on_error` / `on_complete`. Nothing follows a terminal signal.
/// All calls for one subscription happen on that publisher's callback queue.
pub trait Subscriber<T, E>: Send + 'static {
    fn on_subscribe(&mut self, subscription: Subscription);

    fn on_next(&mut self, value: T) -> Demand;

    fn on_error(&mut self, error: E);

    fn on_complete(&mut self);
}

pub type BoxSubscriber<T, E> = Box<dyn Subscriber<T, E>>;

impl<T, E, S> Subscriber<T, E> for Box<S>
where
    S: Subscriber<T, E> + ?Sized,
{
    fn on_subscribe(&mut self, subscription: Subscription) {
        (**self).on_subscribe(subscription)
    }

    fn on_next(&mut self, value: T) -> Demand {
        (**self).on_next(value)
    }

    fn on_error(&mut self, error: E) {
        (**self).on_error(error)
    }

    fn on_complete(&mut self) {
        (**self).on_complete()
    }
}

/// Closure-based subscriber, see [`AnyPublisher::sink`](super::AnyPublisher::sink).
pub struct Sink<T, E> {
    on_value: Box<dyn FnMut(T) + Send>,
    on_completion: Option<Box<dyn FnOnce(Completion<E>) + Send>>,
    subscription: Option<Subscription>,
}

impl<T, E> Sink<T, E> {
    pub fn new<V, C>(on_value: V, on_completion: C) -> Self
    where
        V: FnMut(T) + Send + 'static,
        C: FnOnce(Completion<E>) + Send + 'static,
    {
        Self {
            on_value: Box::new(on_value),
            on_completion: Some(Box::new(on_completion)),
            subscription: None,
        }
    }

    fn finish(&mut self, completion: Completion<E>) {
        self.subscription = None;
        if let Some(f) = self.on_completion.take() {
            f(completion);
        }
    }
}

impl<T, E> Subscriber<T, E> for Sink<T, E>
where
    T: 'static,
    E: 'static,
{
    fn on_subscribe(&mut self, subscription: Subscription) {
        subscription.request(Demand::Unlimited);
        self.subscription = Some(subscription);
    }

    fn on_next(&mut self, value: T) -> Demand {
        (self.on_value)(value);
        Demand::Unlimited
    }

    fn on_error(&mut self, error: E) {
        self.finish(Completion::Failure(error));
    }

    fn on_complete(&mut self) {
        self.finish(Completion::Finished);
    }
}
