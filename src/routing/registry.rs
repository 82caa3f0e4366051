//! Route registration engine.
//!
//! # Responsibilities
//! - Collect descriptors from each component's route source
//! - Validate descriptors before anything is installed
//! - Compose error translation and credential gating around raw handlers
//! - Produce the immutable dispatch table
//!
//! # Design Decisions
//! - Components declare routes through an explicit `RouteSource` trait;
//!   startup enumerates each source exactly once
//! - Any invariant violation aborts startup; the process never serves from
//!   a partially valid table
//! - Wrapper order is fixed: error translation innermost, then the
//!   credential gate, so auth denial short-circuits both

use std::collections::HashSet;
use std::sync::Arc;

use axum::response::Response;
use futures_util::future::BoxFuture;
use thiserror::Error;
use tower::ServiceExt;

use crate::auth::Auth;
use crate::http::error::wrap_fallible;
use crate::routing::descriptor::{BoxedHandler, PlainService, RouteDescriptor};
use crate::routing::matcher::{PathMatcher, RouteMatcher};
use crate::routing::table::{DispatchTable, InstalledRoute};

/// A component that contributes route descriptors.
pub trait RouteSource {
    fn routes(&self) -> Vec<RouteDescriptor>;
}

/// Fatal registration fault. Startup must not proceed past one of these.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("route `{0}`: more than one handler kind set")]
    MultipleHandlerKinds(String),
    #[error("route `{0}`: no handler payload set")]
    MissingHandler(String),
    #[error("route `{0}`: fallback routes must use a plain handler")]
    FallbackNotPlain(String),
    #[error("route `{0}`: a fallback handler is already installed")]
    DuplicateFallback(String),
    #[error("duplicate route name `{0}`")]
    DuplicateName(String),
}

/// Collects and validates route descriptors, then builds the dispatch table.
pub struct RouteRegistry {
    auth: Arc<Auth>,
    routes: Vec<InstalledRoute>,
    names: HashSet<String>,
    fallback: Option<BoxedHandler>,
}

impl RouteRegistry {
    pub fn new(auth: Arc<Auth>) -> Self {
        Self {
            auth,
            routes: Vec::new(),
            names: HashSet::new(),
            fallback: None,
        }
    }

    /// Register every descriptor a component declares.
    pub fn mount(&mut self, source: &dyn RouteSource) -> Result<(), RegistryError> {
        for descriptor in source.routes() {
            self.register(descriptor)?;
        }
        Ok(())
    }

    /// Validate and install one descriptor.
    pub fn register(&mut self, descriptor: RouteDescriptor) -> Result<(), RegistryError> {
        if descriptor.payload_count() > 1 {
            return Err(RegistryError::MultipleHandlerKinds(descriptor.name));
        }

        // Fallback rules before the name claim; a rejected fallback must
        // not reserve its name.
        if descriptor.fallback {
            let Some(service) = descriptor.handler else {
                return Err(RegistryError::FallbackNotPlain(descriptor.name));
            };
            if self.fallback.is_some() {
                return Err(RegistryError::DuplicateFallback(descriptor.name));
            }
            if !self.names.insert(descriptor.name.clone()) {
                return Err(RegistryError::DuplicateName(descriptor.name));
            }
            self.fallback = Some(service_handler(service));
            return Ok(());
        }

        if !self.names.insert(descriptor.name.clone()) {
            return Err(RegistryError::DuplicateName(descriptor.name));
        }

        let handler = if let Some(service) = descriptor.handler {
            service_handler(service)
        } else if let Some(handler) = descriptor.handler_fn {
            handler
        } else if let Some(fallible) = descriptor.fallible_fn {
            wrap_fallible(fallible)
        } else {
            return Err(RegistryError::MissingHandler(descriptor.name));
        };

        let handler = if descriptor.requires_auth {
            self.auth.wrap(handler)
        } else {
            handler
        };

        let path = if descriptor.prefix {
            PathMatcher::Prefix(descriptor.path.clone())
        } else {
            PathMatcher::Exact(descriptor.path.clone())
        };

        tracing::debug!(
            route = %descriptor.name,
            path = %descriptor.path,
            methods = ?descriptor.methods,
            auth = descriptor.requires_auth,
            "route installed"
        );

        self.routes.push(InstalledRoute {
            name: descriptor.name,
            path: descriptor.path,
            matcher: RouteMatcher::new(path, descriptor.methods),
            handler,
        });
        Ok(())
    }

    /// Finish registration and hand over the immutable table.
    pub fn build(self) -> DispatchTable {
        DispatchTable::new(self.routes, self.fallback)
    }
}

fn service_handler(service: PlainService) -> BoxedHandler {
    Arc::new(move |request| -> BoxFuture<'static, Response> {
        let service = service.clone();
        Box::pin(async move {
            match service.oneshot(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            }
        })
    })
}
