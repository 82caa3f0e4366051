//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store installed routes in registration order
//! - Select and invoke the handler for each request
//! - Serve the fallback handler when nothing matches
//!
//! # Design Decisions
//! - Immutable after construction, so serving needs no locks
//! - First matching route wins; registration order is the tie-breaker
//! - A built-in plain 404 covers the case where no fallback was registered

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::routing::descriptor::BoxedHandler;
use crate::routing::matcher::RouteMatcher;

/// One route installed into the table.
pub(crate) struct InstalledRoute {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) matcher: RouteMatcher,
    pub(crate) handler: BoxedHandler,
}

/// The routable surface consulted on every request. Built once at startup.
pub struct DispatchTable {
    routes: Vec<InstalledRoute>,
    fallback: Option<BoxedHandler>,
}

impl DispatchTable {
    pub(crate) fn new(routes: Vec<InstalledRoute>, fallback: Option<BoxedHandler>) -> Self {
        Self { routes, fallback }
    }

    /// Route a request to its handler, or to the fallback when none matches.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        for route in &self.routes {
            if route.matcher.matches(&request) {
                tracing::debug!(route = %route.name, path = %request.uri().path(), "dispatch");
                return (route.handler)(request).await;
            }
        }

        tracing::debug!(path = %request.uri().path(), "no route matched");
        match &self.fallback {
            Some(handler) => handler(request).await,
            None => (StatusCode::NOT_FOUND, "not found").into_response(),
        }
    }

    /// Reverse lookup: the installed path for a route name.
    pub fn path_of(&self, name: &str) -> Option<&str> {
        self.routes
            .iter()
            .find(|route| route.name == name)
            .map(|route| route.path.as_str())
    }

    /// Number of installed routes, excluding the fallback.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}
