//! System pages: landing page, health probe, not-found fallback.

use std::convert::Infallible;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::{Html, IntoResponse};
use tower::service_fn;
use tower::util::BoxCloneSyncService;

use crate::routing::descriptor::{PlainService, RouteDescriptor};
use crate::routing::registry::RouteSource;

/// Routes that belong to the application shell rather than any resource.
pub struct SystemRoutes;

impl RouteSource for SystemRoutes {
    fn routes(&self) -> Vec<RouteDescriptor> {
        vec![
            RouteDescriptor::new("home", "/")
                .methods([Method::GET])
                .handler(home_service()),
            RouteDescriptor::new("health", "/healthz")
                .methods([Method::GET])
                .handler_fn(|_request| async { "ok".into_response() }),
            RouteDescriptor::new("not-found", "/")
                .not_found_fallback()
                .handler(not_found_service()),
        ]
    }
}

fn home_service() -> PlainService {
    BoxCloneSyncService::new(service_fn(|_request: Request<Body>| async {
        Ok::<_, Infallible>(Html("<h1>recipes</h1><p>See <code>/recipes</code>.</p>").into_response())
    }))
}

fn not_found_service() -> PlainService {
    BoxCloneSyncService::new(service_fn(|_request: Request<Body>| async {
        Ok::<_, Infallible>(
            (StatusCode::NOT_FOUND, Html("<h1>404</h1><p>No such page.</p>")).into_response(),
        )
    }))
}
