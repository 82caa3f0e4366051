//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router delegating every request to the dispatch table
//! - Wire up middleware (tracing, request ID, panic recovery, admission,
//!   request timeout)
//! - Serve plain HTTP or TLS, with an optional HTTP-to-HTTPS redirector
//!
//! # Design Decisions
//! - One catch-all Axum route; path and method selection is the dispatch
//!   table's job, not Axum's
//! - Panic recovery sits outside the admission gate so a panicking handler
//!   can never take the process down or skew the budget
//! - The admission layer is only mounted when a budget is configured

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::any;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::schema::AppConfig;
use crate::limit::{admission_middleware, Limiter};
use crate::routing::DispatchTable;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<DispatchTable>,
}

/// HTTP server for the recipe application.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Assemble the middleware stack around the dispatch table.
    pub fn new(
        config: &AppConfig,
        table: Arc<DispatchTable>,
        limiter: Option<Arc<Limiter>>,
    ) -> Self {
        let state = AppState { table };

        let mut router = Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )));

        if let Some(limiter) = limiter {
            router = router.layer(middleware::from_fn_with_state(limiter, admission_middleware));
        }

        // Added innermost-to-outermost: panic recovery wraps admission,
        // request IDs and tracing wrap everything.
        let router = router
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        Self { router }
    }

    /// Run the server, accepting connections on the given listener until
    /// the process receives a shutdown signal.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }

    /// Run the server over TLS, accepting connections until the process
    /// receives a shutdown signal.
    pub async fn run_tls(self, addr: SocketAddr, tls: RustlsConfig) -> Result<(), std::io::Error> {
        let handle = Handle::new();
        let signal_handle = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            signal_handle.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        self.serve_tls(addr, tls, handle).await
    }

    /// Serve TLS until `handle` signals shutdown.
    async fn serve_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        handle: Handle,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await
    }

    /// Router answering every plain-HTTP request with a redirect to HTTPS.
    pub fn redirect_router() -> Router {
        Router::new().fallback(redirect_to_https)
    }
}

async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.table.dispatch(request).await
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    tracing::error!(panic = %detail, "request handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
}

async fn redirect_to_https(request: Request<Body>) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let host = host.split(':').next().unwrap_or(host);
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    Redirect::permanent(&format!("https://{host}{path_and_query}")).into_response()
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::auth::Auth;
    use crate::config::schema::AuthConfig;
    use crate::routing::RouteRegistry;

    use super::*;

    #[tokio::test]
    async fn test_redirect_router_preserves_path_and_query() {
        let router = HttpServer::redirect_router();
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/recipes?id=7")
                    .header("Host", "example.com:8080")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://example.com/recipes?id=7"
        );
    }

    // The TLS serve loop must return on shutdown so the caller's
    // persist-on-exit code runs.
    #[tokio::test]
    async fn test_tls_server_returns_on_graceful_shutdown() {
        let config = AppConfig::default();
        let registry = RouteRegistry::new(Arc::new(Auth::new(&AuthConfig {
            api_key: "k".to_string(),
        })));
        let server = HttpServer::new(&config, Arc::new(registry.build()), None);

        let tls = RustlsConfig::from_pem_file(
            concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/cert.pem"),
            concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/key.pem"),
        )
        .await
        .unwrap();

        let handle = Handle::new();
        let serving = tokio::spawn(server.serve_tls(
            "127.0.0.1:0".parse().unwrap(),
            tls,
            handle.clone(),
        ));

        handle.listening().await.expect("server bound");
        handle.graceful_shutdown(Some(Duration::from_millis(100)));

        tokio::time::timeout(Duration::from_secs(5), serving)
            .await
            .expect("serve loop did not stop")
            .unwrap()
            .unwrap();
    }
}
