//! Core library for the recipe web application server.

pub mod auth;
pub mod cache;
pub mod config;
pub mod http;
pub mod limit;
pub mod routing;
pub mod site;
pub mod store;

pub use config::schema::AppConfig;
pub use http::HttpServer;
