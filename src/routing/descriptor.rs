//! Declarative route descriptors.
//!
//! # Responsibilities
//! - Describe one endpoint: name, path, methods, auth flag, handler payload
//! - Carry exactly one of the three handler payload kinds
//!
//! # Design Decisions
//! - Payload setters each fill their own slot; the registry rejects a
//!   descriptor with more (or fewer) than one slot filled before anything
//!   is installed
//! - Plain handlers are tower services so existing middleware-free services
//!   (static files, fixed pages) drop in unchanged
//! - The descriptor `name` exists for diagnostics and reverse lookup only;
//!   it plays no part in matching

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use futures_util::future::BoxFuture;
use tower::util::BoxCloneSyncService;

use crate::http::error::AppError;

/// Object-safe request handler.
pub type BoxedHandler =
    Arc<dyn Fn(Request<Body>) -> BoxFuture<'static, Response> + Send + Sync>;

/// Handler that may report a failure for uniform translation.
pub type FallibleHandler =
    Arc<dyn Fn(Request<Body>) -> BoxFuture<'static, Result<Response, AppError>> + Send + Sync>;

/// Plain handler payload: any cloneable, infallible tower service.
pub type PlainService = BoxCloneSyncService<Request<Body>, Response, Infallible>;

/// Declarative description of one endpoint to install.
pub struct RouteDescriptor {
    /// Unique human-readable route identifier.
    pub name: String,

    /// Path the endpoint is installed at.
    pub path: String,

    /// Whether `path` is matched exactly or as a prefix.
    pub prefix: bool,

    /// Methods allowed for this endpoint; empty allows any.
    pub methods: Vec<Method>,

    /// Gate the handler behind the credential check.
    pub requires_auth: bool,

    /// Install as the singleton not-found handler instead of a route.
    pub fallback: bool,

    pub(crate) handler: Option<PlainService>,
    pub(crate) handler_fn: Option<BoxedHandler>,
    pub(crate) fallible_fn: Option<FallibleHandler>,
}

impl RouteDescriptor {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            prefix: false,
            methods: Vec::new(),
            requires_auth: false,
            fallback: false,
            handler: None,
            handler_fn: None,
            fallible_fn: None,
        }
    }

    /// Match `path` as a prefix instead of exactly.
    pub fn prefix(mut self) -> Self {
        self.prefix = true;
        self
    }

    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    pub fn requires_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub fn not_found_fallback(mut self) -> Self {
        self.fallback = true;
        self
    }

    /// Set a plain tower-service payload.
    pub fn handler(mut self, service: PlainService) -> Self {
        self.handler = Some(service);
        self
    }

    /// Set an async-function payload.
    pub fn handler_fn<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.handler_fn = Some(Arc::new(move |request| -> BoxFuture<'static, Response> {
            Box::pin(handler(request))
        }));
        self
    }

    /// Set a fallible async-function payload.
    pub fn fallible_fn<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, AppError>> + Send + 'static,
    {
        self.fallible_fn = Some(Arc::new(
            move |request| -> BoxFuture<'static, Result<Response, AppError>> {
                Box::pin(handler(request))
            },
        ));
        self
    }

    /// Number of payload kinds set on this descriptor.
    pub(crate) fn payload_count(&self) -> usize {
        usize::from(self.handler.is_some())
            + usize::from(self.handler_fn.is_some())
            + usize::from(self.fallible_fn.is_some())
    }
}

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;
    use tower::service_fn;

    use super::*;

    #[test]
    fn test_defaults() {
        let descriptor = RouteDescriptor::new("home", "/");

        assert!(!descriptor.prefix);
        assert!(!descriptor.requires_auth);
        assert!(!descriptor.fallback);
        assert!(descriptor.methods.is_empty());
        assert_eq!(descriptor.payload_count(), 0);
    }

    #[test]
    fn test_payload_count_tracks_each_kind() {
        let plain = BoxCloneSyncService::new(service_fn(|_request: Request<Body>| async {
            Ok::<_, Infallible>("ok".into_response())
        }));

        let descriptor = RouteDescriptor::new("a", "/a").handler(plain);
        assert_eq!(descriptor.payload_count(), 1);

        let descriptor = descriptor.handler_fn(|_request| async { "ok".into_response() });
        assert_eq!(descriptor.payload_count(), 2);

        let descriptor = descriptor.fallible_fn(|_request| async { Ok("ok".into_response()) });
        assert_eq!(descriptor.payload_count(), 3);
    }
}
