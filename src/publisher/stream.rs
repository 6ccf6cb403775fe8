//! Pull-based view of a publisher.

use super::subscriber::{Demand, Signal, Subscriber};
use super::subscription::Subscription;
use super::AnyPublisher;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// A `futures::Stream` fed by one subscription.
///
/// Values arrive as `Ok`. An error arrives as a single `Err` after which the
/// stream ends; completion ends the stream. Dropping the stream cancels the
/// subscription.
pub struct SignalStream<T, E> {
    rx: mpsc::UnboundedReceiver<Signal<T, E>>,
    subscription: Subscription,
    done: bool,
}

impl<T, E> SignalStream<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub(crate) fn subscribe(publisher: &AnyPublisher<T, E>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = publisher.subscribe(ChannelSubscriber { tx });
        Self {
            rx,
            subscription,
            done: false,
        }
    }
}

impl<T, E> SignalStream<T, E> {
    /// Cancel the subscription and end the stream without waiting for it to drop.
    pub fn cancel(&mut self) {
        self.subscription.cancel();
        self.done = true;
    }
}

impl<T, E> Stream for SignalStream<T, E> {
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match this.rx.poll_recv(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Signal::Next(value))) => Poll::Ready(Some(Ok(value))),
            Poll::Ready(Some(Signal::Error(error))) => {
                this.done = true;
                Poll::Ready(Some(Err(error)))
            }
            // A closed channel without a terminal signal means the
            // subscription was cancelled.
            Poll::Ready(Some(Signal::Complete)) | Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
        }
    }
}

impl<T, E> Drop for SignalStream<T, E> {
    fn drop(&mut self) {
        self.subscription.cancel();
    }
}

struct ChannelSubscriber<T, E> {
    tx: mpsc::UnboundedSender<Signal<T, E>>,
}

impl<T, E> Subscriber<T, E> for ChannelSubscriber<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn on_subscribe(&mut self, subscription: Subscription) {
        subscription.request(Demand::Unlimited);
    }

    fn on_next(&mut self, value: T) -> Demand {
        let _ = self.tx.send(Signal::Next(value));
        Demand::Unlimited
    }

    fn on_error(&mut self, error: E) {
        let _ = self.tx.send(Signal::Error(error));
    }

    fn on_complete(&mut self) {
        let _ = self.tx.send(Signal::Complete);
    }
}
