//! Route bindings declared by extensions.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Json;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use notegraph_core::error::AppError;
use notegraph_core::result::AppResult;

/// Handler for one extension route.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    /// Handles a request.
    async fn call(&self, request: RouteRequest) -> AppResult<RouteResponse>;
}

/// A request as seen by an extension route handler.
#[derive(Debug, Clone, Default)]
pub struct RouteRequest {
    /// HTTP method.
    pub method: Method,
    /// Path parameters captured by the route suffix.
    pub params: HashMap<String, String>,
    /// Decoded query string.
    pub query: HashMap<String, String>,
    /// Raw body.
    pub body: Bytes,
}

impl RouteRequest {
    /// Path parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Query parameter by name, treating empty values as absent.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| AppError::validation(format!("Invalid JSON body: {e}")))
    }
}

/// A JSON response from an extension route.
#[derive(Debug, Clone)]
pub struct RouteResponse {
    /// Status code.
    pub status: StatusCode,
    /// JSON body; `Null` renders an empty body.
    pub body: serde_json::Value,
}

impl RouteResponse {
    /// 200 with a serialized body.
    pub fn ok<T: Serialize>(body: &T) -> AppResult<Self> {
        Self::with_status(StatusCode::OK, body)
    }

    /// Arbitrary status with a serialized body.
    pub fn with_status<T: Serialize>(status: StatusCode, body: &T) -> AppResult<Self> {
        Ok(Self {
            status,
            body: serde_json::to_value(body)?,
        })
    }

    /// 204 without a body.
    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            body: serde_json::Value::Null,
        }
    }
}

impl IntoResponse for RouteResponse {
    fn into_response(self) -> Response {
        if self.body.is_null() {
            self.status.into_response()
        } else {
            (self.status, Json(self.body)).into_response()
        }
    }
}

/// One route declared by an extension, relative to its namespace.
#[derive(Clone)]
pub struct RouteBinding {
    /// HTTP method.
    pub method: Method,
    /// Path suffix below `/api/plugins/{id}/`, using axum `{param}` syntax.
    pub suffix: String,
    /// Handler.
    pub handler: Arc<dyn RouteHandler>,
}

impl std::fmt::Debug for RouteBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteBinding")
            .field("method", &self.method)
            .field("suffix", &self.suffix)
            .field("handler", &"<handler>")
            .finish()
    }
}

impl RouteBinding {
    /// Creates a binding.
    pub fn new(method: Method, suffix: impl Into<String>, handler: Arc<dyn RouteHandler>) -> Self {
        Self {
            method,
            suffix: suffix.into().trim_matches('/').to_string(),
            handler,
        }
    }

    /// A `GET` binding.
    pub fn get(suffix: impl Into<String>, handler: Arc<dyn RouteHandler>) -> Self {
        Self::new(Method::GET, suffix, handler)
    }

    /// A `POST` binding.
    pub fn post(suffix: impl Into<String>, handler: Arc<dyn RouteHandler>) -> Self {
        Self::new(Method::POST, suffix, handler)
    }

    /// A `PUT` binding.
    pub fn put(suffix: impl Into<String>, handler: Arc<dyn RouteHandler>) -> Self {
        Self::new(Method::PUT, suffix, handler)
    }

    /// A `DELETE` binding.
    pub fn delete(suffix: impl Into<String>, handler: Arc<dyn RouteHandler>) -> Self {
        Self::new(Method::DELETE, suffix, handler)
    }

    /// The suffix with parameter names erased, so that `a/{x}` and `a/{y}`
    /// compare equal.
    pub fn shape(&self) -> String {
        self.suffix
            .split('/')
            .map(|segment| {
                if segment.starts_with("{*") {
                    "{*}"
                } else if segment.starts_with('{') {
                    "{}"
                } else {
                    segment
                }
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

type BoxedRouteFuture = Pin<Box<dyn Future<Output = AppResult<RouteResponse>> + Send>>;

/// A closure-based route handler.
pub struct FnHandler {
    handler: Box<dyn Fn(RouteRequest) -> BoxedRouteFuture + Send + Sync>,
}

#[async_trait]
impl RouteHandler for FnHandler {
    async fn call(&self, request: RouteRequest) -> AppResult<RouteResponse> {
        (self.handler)(request).await
    }
}

/// Wraps an async closure as a [`RouteHandler`].
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn RouteHandler>
where
    F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<RouteResponse>> + Send + 'static,
{
    Arc::new(FnHandler {
        handler: Box::new(move |request| Box::pin(f(request))),
    })
}
