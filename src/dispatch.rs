//! Dispatch of rendered queries to the search backend
//!
//! The engine never talks to the network itself. A [`Dispatcher`] maps a
//! resolved query onto a [`BackendRequest`] (collection, method, path suffix,
//! body) and hands it to a [`BackendExecutor`] supplied by the host. The
//! executor's response is returned to the caller untouched.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::error::Result;
use crate::template::{QueryKind, ResolvedQuery};

/// HTTP method used for a backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method and path suffix a query kind is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub path_suffix: &'static str,
}

impl QueryKind {
    /// Backend endpoint for this kind of query
    pub fn endpoint(self) -> Endpoint {
        match self {
            QueryKind::Search | QueryKind::Aggregation => Endpoint {
                method: Method::Get,
                path_suffix: "/_search",
            },
            QueryKind::MultiSearch => Endpoint {
                method: Method::Post,
                path_suffix: "/_msearch",
            },
        }
    }
}

/// Derive the backend collection from an operation type
///
/// Takes everything before the first `_` and lowercases it, so
/// `TRANSACTION_SUMMARY` targets `transaction`. Nothing checks that the
/// collection exists.
pub fn collection_for(operation_type: &str) -> String {
    operation_type
        .split('_')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// A fully described backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRequest {
    pub collection: String,
    pub method: Method,
    pub path_suffix: String,
    /// Request entity; `None` when the rendered body is empty
    pub body: Option<String>,
}

impl BackendRequest {
    pub fn new(collection: impl Into<String>, endpoint: Endpoint, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            collection: collection.into(),
            method: endpoint.method,
            path_suffix: endpoint.path_suffix.to_string(),
            body: if body.is_empty() { None } else { Some(body) },
        }
    }

    /// Build the request for a resolved grouped template
    pub fn for_query(query: &ResolvedQuery) -> Self {
        Self::new(
            query.collection.clone(),
            query.kind.endpoint(),
            query.body.clone(),
        )
    }

    /// Full request path, e.g. `/user/_search`
    pub fn path(&self) -> String {
        format!("/{}{}", self.collection, self.path_suffix)
    }
}

/// Failure reported by the backend executor
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with a non-2xx status
    #[error("{method} {path} failed with status {status}: {body}")]
    Status {
        method: Method,
        path: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response
    #[error("{method} {path} failed: {message}")]
    Transport {
        method: Method,
        path: String,
        message: String,
    },
}

/// Performs the actual network call against the search backend
pub trait BackendExecutor: Send + Sync {
    fn execute(&self, request: &BackendRequest) -> std::result::Result<Value, BackendError>;
}

impl<T: BackendExecutor + ?Sized> BackendExecutor for Arc<T> {
    fn execute(&self, request: &BackendRequest) -> std::result::Result<Value, BackendError> {
        (**self).execute(request)
    }
}

impl<T: BackendExecutor + ?Sized> BackendExecutor for &T {
    fn execute(&self, request: &BackendRequest) -> std::result::Result<Value, BackendError> {
        (**self).execute(request)
    }
}

/// Forwards requests to an executor without retries or interpretation
#[derive(Debug, Clone)]
pub struct Dispatcher<E> {
    executor: E,
}

impl<E: BackendExecutor> Dispatcher<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Send a resolved grouped template to its collection
    pub fn dispatch(&self, query: &ResolvedQuery) -> Result<Value> {
        self.send(&BackendRequest::for_query(query))
    }

    /// Send an already built request
    pub fn send(&self, request: &BackendRequest) -> Result<Value> {
        tracing::debug!(
            method = %request.method,
            path = %request.path(),
            has_body = request.body.is_some(),
            "Dispatching query to backend"
        );
        Ok(self.executor.execute(request)?)
    }
}
