//! Recipe web application server.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌───────────────────────────────────────────────┐
//!                 │                 RECIPE SERVER                 │
//!                 │                                               │
//!  Client ────────┼─▶ http::server ─▶ limit::Limiter ─▶ routing   │
//!                 │   (middleware)    (admission gate)  (dispatch)│
//!                 │                                        │      │
//!                 │                                        ▼      │
//!                 │        cache::ValidatorCache ◀── site handlers│
//!                 │                 ▲                      │      │
//!                 │                 │ eviction             ▼      │
//!                 │        store::HookBus ◀──────── store writes  │
//!                 └───────────────────────────────────────────────┘
//! ```

use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recipe_server::auth::Auth;
use recipe_server::cache::ValidatorCache;
use recipe_server::config;
use recipe_server::http::HttpServer;
use recipe_server::limit::Limiter;
use recipe_server::routing::RouteRegistry;
use recipe_server::site::{RecipeApi, SystemRoutes};
use recipe_server::store::RecipeStore;

#[derive(Parser)]
#[command(name = "recipe-server", about = "Recipe web application server")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recipe_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = config::load_config(&args.config)?;

    tracing::info!(
        address = %config.server.address,
        https = config.server.https,
        rate_limited = config.server.rate_limit.is_some(),
        database = %config.database.path,
        "configuration loaded"
    );

    // Construct each collaborator once; handlers receive explicit references.
    let store = Arc::new(RecipeStore::load_from_file(&config.database.path)?);
    let etags = Arc::new(ValidatorCache::new());
    let auth = Arc::new(Auth::new(&config.auth));

    let mut registry = RouteRegistry::new(auth);
    let recipes = RecipeApi::new(store.clone(), etags.clone());
    registry.mount(&recipes)?;
    registry.mount(&SystemRoutes)?;
    let table = Arc::new(registry.build());

    tracing::info!(routes = table.len(), "dispatch table built");

    let limiter = config
        .server
        .rate_limit
        .as_ref()
        .map(|budget| Arc::new(Limiter::new(budget.into())));

    let server = HttpServer::new(&config, table, limiter);

    if config.server.https {
        let tls = config
            .server
            .tls
            .as_ref()
            .ok_or("server.https requires [server.tls]")?;
        let rustls = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            &tls.cert_path,
            &tls.key_path,
        )
        .await?;

        // Plain-HTTP listener that only redirects to the TLS port.
        let redirect_listener = TcpListener::bind("0.0.0.0:80").await?;
        tokio::spawn(axum::serve(redirect_listener, HttpServer::redirect_router()).into_future());

        server.run_tls(config.server.address.parse()?, rustls).await?;
    } else {
        let listener = TcpListener::bind(&config.server.address).await?;
        server.run(listener).await?;
    }

    store.persist()?;
    tracing::info!("shutdown complete");
    Ok(())
}
