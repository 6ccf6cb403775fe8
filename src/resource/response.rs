//! Response wrappers reported by resources.

use bytes::Bytes;
use std::collections::HashMap;

/// Extracts the decoded model from a response wrapper.
pub trait IntoModel {
    type Model;

    fn into_model(self) -> Self::Model;
}

/// A decoded network response.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkResponse<T> {
    pub model: T,
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    /// Raw body the model was decoded from.
    pub data: Bytes,
}

impl<T> NetworkResponse<T> {
    pub fn new(model: T, status_code: u16) -> Self {
        Self {
            model,
            status_code,
            headers: HashMap::new(),
            data: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl<T> IntoModel for NetworkResponse<T> {
    type Model = T;

    fn into_model(self) -> T {
        self.model
    }
}

/// A response from a cacheable resource: either served from cache or fetched.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResponse<T> {
    Cache {
        model: T,
        is_expired: bool,
    },
    Network {
        response: NetworkResponse<T>,
        updated_cache: bool,
    },
}

impl<T> FetchResponse<T> {
    pub fn model(&self) -> &T {
        match self {
            FetchResponse::Cache { model, .. } => model,
            FetchResponse::Network { response, .. } => &response.model,
        }
    }

    pub fn is_from_cache(&self) -> bool {
        matches!(self, FetchResponse::Cache { .. })
    }
}

impl<T> IntoModel for FetchResponse<T> {
    type Model = T;

    fn into_model(self) -> T {
        match self {
            FetchResponse::Cache { model, .. } => model,
            FetchResponse::Network { response, .. } => response.model,
        }
    }
}
