//! 资源绑定：将单次请求和“缓存后网络”多次回调的资源适配为发布者。
//!
//! # Resource Bindings
//!
//! The request/caching layer is an external collaborator. This module only
//! defines the surface it must expose and binds that surface onto
//! [`AnyPublisher`](crate::publisher::AnyPublisher).
//!
//! ## Collaborator Shapes
//!
//! | Trait | Callback | Publisher |
//! |-------|----------|-----------|
//! | [`Resource`] | invoked exactly once with a `Result` | `next` + `complete`, or `error` |
//! | [`CacheableResource`] | invoked 1..n times with a [`MultiResult`] | `next` per success, `complete` after the final one |
//!
//! ## Example
//!
//! ```rust
//! use fetch_publisher::publisher::BoxCancelHandle;
//! use fetch_publisher::resource::{BindingConfig, NetworkResponse, Resource, ResourceExt, SingleShotCallback};
//! use fetch_publisher::CallbackQueue;
//! use std::sync::Arc;
//!
//! struct Greeting;
//!
//! impl Resource for Greeting {
//!     type Model = String;
//!     type Error = String;
//!
//!     fn request(&self, on_result: SingleShotCallback<String, String>) -> Option<BoxCancelHandle> {
//!         on_result(Ok(NetworkResponse::new("hello".to_string(), 200)));
//!         None
//!     }
//! }
//!
//! let config = BindingConfig::new().with_callback_queue(CallbackQueue::inline());
//! let _subscription = Arc::new(Greeting)
//!     .request_model(config)
//!     .sink(|model| assert_eq!(model, "hello"), |_| {});
//! ```

pub mod bindings;
mod response;

pub use bindings::{
    from_multi_emission, from_single_shot, project_to_value, BindingConfig, CacheableResourceExt,
    ResourceExt,
};
pub use response::{FetchResponse, IntoModel, NetworkResponse};

use crate::publisher::BoxCancelHandle;
use serde::{Deserialize, Serialize};

/// One report from a multi-emission resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultiResult<T, E> {
    Success { value: T, is_final: bool },
    Failure(E),
}

impl<T, E> MultiResult<T, E> {
    /// A success after which more reports may follow.
    pub fn partial(value: T) -> Self {
        MultiResult::Success {
            value,
            is_final: false,
        }
    }

    pub fn last(value: T) -> Self {
        MultiResult::Success {
            value,
            is_final: true,
        }
    }

    pub fn is_final(&self) -> bool {
        match self {
            MultiResult::Success { is_final, .. } => *is_final,
            MultiResult::Failure(_) => true,
        }
    }
}

/// Completion callback of a single-shot resource.
pub type SingleShotCallback<T, E> = Box<dyn FnOnce(Result<NetworkResponse<T>, E>) + Send>;

/// Completion callback of a multi-emission resource.
pub type MultiEmissionCallback<T, E> = Box<dyn FnMut(MultiResult<FetchResponse<T>, E>) + Send>;

/// How a cacheable resource combines its cache with the network.
///
/// Passed through to [`CacheableResource::fetch`] untouched; bindings never
/// interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    NetworkOnlyNoCache,
    NetworkOnlyUpdateCache,
    CacheOnly,
    CacheFirstNetworkIfNotFoundOrExpired,
    CacheFirstNetworkAlways,
    CacheFirstNetworkRefresh,
    NetworkFirstCacheIfFailed,
}

/// A request that reports exactly once.
pub trait Resource: Send + Sync + 'static {
    type Model: Send + 'static;
    type Error: Send + 'static;

    /// Begin the request. `on_result` may be called from any thread, or
    /// synchronously before this returns. Returns `None` if there is nothing
    /// left to cancel.
    fn request(
        &self,
        on_result: SingleShotCallback<Self::Model, Self::Error>,
    ) -> Option<BoxCancelHandle>;
}

/// A resource that can answer from its cache and then from the network.
pub trait CacheableResource: Resource {
    /// Begin the fetch. `on_result` is called until a report with
    /// `is_final == true` or a failure.
    fn fetch(
        &self,
        cache_policy: Option<CachePolicy>,
        on_result: MultiEmissionCallback<Self::Model, Self::Error>,
    ) -> Option<BoxCancelHandle>;
}
