//! Publisher constructors for the two resource shapes.

use super::{
    CachePolicy, CacheableResource, FetchResponse, IntoModel, MultiResult, NetworkResponse,
    Resource,
};
use crate::publisher::{AnyPublisher, Emitter};
use crate::queue::CallbackQueue;
use std::sync::Arc;
use tracing::trace;

/// Options shared by every binding.
#[derive(Debug, Clone, Default)]
pub struct BindingConfig {
    /// Where subscriber signals are delivered. Defaults to [`CallbackQueue::main`].
    pub callback_queue: CallbackQueue,
    /// Forwarded to [`CacheableResource::fetch`] as is. Ignored by single-shot bindings.
    pub cache_policy: Option<CachePolicy>,
}

impl BindingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback_queue(mut self, queue: CallbackQueue) -> Self {
        self.callback_queue = queue;
        self
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = Some(policy);
        self
    }
}

/// Publisher over a single-shot request: `next` + `complete` on success,
/// `error` on failure.
pub fn from_single_shot<R: Resource>(
    resource: Arc<R>,
    config: BindingConfig,
) -> AnyPublisher<NetworkResponse<R::Model>, R::Error> {
    AnyPublisher::from_callback(
        config.callback_queue,
        move |emitter: Emitter<NetworkResponse<R::Model>, R::Error>| {
            trace!("starting request");
            resource.request(Box::new(
                move |result: Result<NetworkResponse<R::Model>, R::Error>| match result {
                    Ok(response) => emitter.emit(response, true),
                    Err(error) => emitter.error(error),
                },
            ))
        },
    )
}

/// Publisher over a cache-then-network fetch: one `next` per success report,
/// `complete` after the report marked final, `error` on failure.
pub fn from_multi_emission<R: CacheableResource>(
    resource: Arc<R>,
    config: BindingConfig,
) -> AnyPublisher<FetchResponse<R::Model>, R::Error> {
    let cache_policy = config.cache_policy;
    AnyPublisher::from_callback(
        config.callback_queue,
        move |emitter: Emitter<FetchResponse<R::Model>, R::Error>| {
            trace!(?cache_policy, "starting fetch");
            resource.fetch(
                cache_policy,
                Box::new(
                    move |result: MultiResult<FetchResponse<R::Model>, R::Error>| match result {
                        MultiResult::Success { value, is_final } => emitter.emit(value, is_final),
                        MultiResult::Failure(error) => emitter.error(error),
                    },
                ),
            )
        },
    )
}

/// Replace each emitted response with the model it carries.
pub fn project_to_value<W, E>(publisher: AnyPublisher<W, E>) -> AnyPublisher<W::Model, E>
where
    W: IntoModel + Send + 'static,
    W::Model: Send + 'static,
    E: Send + 'static,
{
    publisher.map(<W as IntoModel>::into_model)
}

/// Method-style bindings for any shared [`Resource`].
pub trait ResourceExt {
    type Model;
    type Error;

    fn request_publisher(
        &self,
        config: BindingConfig,
    ) -> AnyPublisher<NetworkResponse<Self::Model>, Self::Error>;

    fn request_model(&self, config: BindingConfig) -> AnyPublisher<Self::Model, Self::Error>;
}

impl<R: Resource> ResourceExt for Arc<R> {
    type Model = R::Model;
    type Error = R::Error;

    fn request_publisher(
        &self,
        config: BindingConfig,
    ) -> AnyPublisher<NetworkResponse<R::Model>, R::Error> {
        from_single_shot(self.clone(), config)
    }

    fn request_model(&self, config: BindingConfig) -> AnyPublisher<R::Model, R::Error> {
        project_to_value(self.request_publisher(config))
    }
}

/// Method-style bindings for any shared [`CacheableResource`].
pub trait CacheableResourceExt: ResourceExt {
    fn fetch_publisher(
        &self,
        config: BindingConfig,
    ) -> AnyPublisher<FetchResponse<Self::Model>, Self::Error>;

    fn fetch_model(&self, config: BindingConfig) -> AnyPublisher<Self::Model, Self::Error>;
}

impl<R: CacheableResource> CacheableResourceExt for Arc<R> {
    fn fetch_publisher(
        &self,
        config: BindingConfig,
    ) -> AnyPublisher<FetchResponse<R::Model>, R::Error> {
        from_multi_emission(self.clone(), config)
    }

    fn fetch_model(&self, config: BindingConfig) -> AnyPublisher<R::Model, R::Error> {
        project_to_value(self.fetch_publisher(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_main_queue_without_policy() {
        let config = BindingConfig::new();
        assert_eq!(config.callback_queue.label(), CallbackQueue::main().label());
        assert!(config.cache_policy.is_none());
    }

    #[test]
    fn config_builders() {
        let config = BindingConfig::new()
            .with_callback_queue(CallbackQueue::inline())
            .with_cache_policy(CachePolicy::CacheOnly);
        assert!(config.callback_queue.is_inline());
        assert_eq!(config.cache_policy, Some(CachePolicy::CacheOnly));
    }
}
