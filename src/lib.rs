//! # fetch-publisher
//!
//! 将回调式、可取消的请求抽象桥接为标准的推送式发布者/订阅者流。
//!
//! Bridges a callback-driven, cancellable request abstraction into a push-based
//! publisher/subscriber stream protocol.
//!
//! ## Overview
//!
//! A resource (the request/caching layer, which lives outside this crate) only
//! has to expose one shape: "given a completion callback, start an operation and
//! return a cancel handle". This crate turns that shape into a publisher that
//! emits exactly the right sequence of `next` / `error` / `complete` signals and
//! forwards cancellation back to the resource.
//!
//! ## Key Features
//!
//! - **Exact signal sequences**: at most one terminal signal, always last, latched
//! - **Cooperative cancellation**: [`publisher::Subscription::cancel`] is idempotent
//!   and stops forwarding immediately
//! - **Serial delivery**: every signal is delivered on a [`CallbackQueue`]
//! - **Single-shot and cache-then-network resources** via [`resource`] bindings
//! - **Async interop**: any publisher can be consumed as a `futures::Stream`
//!
//! ## Quick Start
//!
//! ```rust
//! use fetch_publisher::publisher::{cancel_fn, AnyPublisher, Completion};
//! use fetch_publisher::CallbackQueue;
//!
//! let publisher: AnyPublisher<&'static str, String> =
//!     AnyPublisher::from_callback(CallbackQueue::inline(), |emitter| {
//!         emitter.next("cached");
//!         emitter.emit("fresh", true);
//!         Some(cancel_fn(|| {}))
//!     });
//!
//! let subscription = publisher.sink(
//!     |value| println!("{value}"),
//!     |completion| assert_eq!(completion, Completion::Finished),
//! );
//! subscription.cancel(); // already terminated, no-op
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`publisher`] | Publisher/subscriber protocol and the callback adapter |
//! | [`resource`] | Resource traits and the single-shot / multi-emission bindings |
//! | [`queue`] | Serial delivery contexts |

pub mod publisher;
pub mod queue;
pub mod resource;

pub use publisher::{AnyPublisher, CancelHandle, Emitter, Publisher, Subscriber, Subscription};
pub use queue::CallbackQueue;
pub use resource::{
    BindingConfig, CachePolicy, CacheableResource, CacheableResourceExt, FetchResponse,
    MultiResult, NetworkResponse, Resource, ResourceExt,
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
