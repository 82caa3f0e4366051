//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use recipe_server::auth::Auth;
use recipe_server::cache::ValidatorCache;
use recipe_server::config::schema::RateLimitConfig;
use recipe_server::http::HttpServer;
use recipe_server::limit::Limiter;
use recipe_server::routing::RouteRegistry;
use recipe_server::site::{RecipeApi, SystemRoutes};
use recipe_server::store::RecipeStore;
use recipe_server::AppConfig;

pub const API_KEY: &str = "test-secret";

/// A fully wired server on an ephemeral loopback port.
pub struct TestApp {
    pub addr: SocketAddr,
    pub store: Arc<RecipeStore>,
    pub etags: Arc<ValidatorCache<i64>>,
}

impl TestApp {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }
}

/// Config with auth set up and no admission gate.
pub fn base_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.api_key = API_KEY.to_string();
    config
}

/// Config with the given admission budget.
pub fn rate_limited_config(per_second: u32, burst: u32, timeout_ms: u64) -> AppConfig {
    let mut config = base_config();
    config.server.rate_limit = Some(RateLimitConfig {
        per_second,
        burst,
        timeout_ms,
    });
    config
}

/// Wire the application exactly as `main` does and serve it in the
/// background.
pub async fn start_app(config: AppConfig) -> TestApp {
    let store = Arc::new(RecipeStore::new());
    let etags = Arc::new(ValidatorCache::new());
    let auth = Arc::new(Auth::new(&config.auth));

    let mut registry = RouteRegistry::new(auth);
    let recipes = RecipeApi::new(store.clone(), etags.clone());
    registry.mount(&recipes).unwrap();
    registry.mount(&SystemRoutes).unwrap();
    let table = Arc::new(registry.build());

    let limiter = config
        .server
        .rate_limit
        .as_ref()
        .map(|budget| Arc::new(Limiter::new(budget.into())));

    let server = HttpServer::new(&config, table, limiter);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.run(listener));

    TestApp { addr, store, etags }
}
