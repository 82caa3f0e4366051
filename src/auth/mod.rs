//! Credential gating for protected routes.
//!
//! # Responsibilities
//! - Check the bearer credential on requests to protected routes
//! - Answer 401 without invoking the protected handler on failure
//!
//! # Design Decisions
//! - Single shared API key from configuration; credential *management* is
//!   out of scope for this server
//! - The gate wraps handlers at registration time, not per request

use std::sync::Arc;

use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;

use crate::config::schema::AuthConfig;
use crate::routing::descriptor::BoxedHandler;

/// Bearer-credential check applied to routes that require it.
pub struct Auth {
    api_key: String,
}

impl Auth {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
        }
    }

    fn authorized<B>(&self, request: &Request<B>) -> bool {
        let header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        match header {
            Some(value) => value == format!("Bearer {}", self.api_key),
            None => false,
        }
    }

    /// Wrap a handler so it only runs for authenticated requests.
    pub fn wrap(self: &Arc<Self>, inner: BoxedHandler) -> BoxedHandler {
        let auth = self.clone();
        Arc::new(move |request| -> BoxFuture<'static, Response> {
            if auth.authorized(&request) {
                inner(request)
            } else {
                tracing::debug!(path = %request.uri().path(), "unauthorized request");
                Box::pin(async { (StatusCode::UNAUTHORIZED, "unauthorized").into_response() })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use axum::body::Body;
    use axum::response::IntoResponse;

    use super::*;

    fn auth() -> Arc<Auth> {
        Arc::new(Auth::new(&AuthConfig {
            api_key: "secret".to_string(),
        }))
    }

    fn request(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/protected");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_bearer_token_reaches_the_handler() {
        let handler = auth().wrap(Arc::new(|_request| -> BoxFuture<'static, Response> {
            Box::pin(async { "reached".into_response() })
        }));

        let response = handler(request(Some("Bearer secret"))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_denial_never_invokes_the_handler() {
        let invoked = Arc::new(AtomicBool::new(false));
        let flag = invoked.clone();
        let handler = auth().wrap(Arc::new(move |_request| -> BoxFuture<'static, Response> {
            flag.store(true, Ordering::SeqCst);
            Box::pin(async { "reached".into_response() })
        }));

        for authorization in [None, Some("Bearer wrong"), Some("Basic secret")] {
            let response = handler(request(authorization)).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
        assert!(!invoked.load(Ordering::SeqCst));
    }
}
