//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the recipe server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and middleware settings.
    pub server: ServerConfig,

    /// Storage location for the recipe store.
    pub database: DatabaseConfig,

    /// Credential for protected routes.
    pub auth: AuthConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub address: String,

    /// Serve TLS and redirect plain HTTP to it.
    pub https: bool,

    /// Per-request deadline, in seconds.
    pub request_timeout_secs: u64,

    /// TLS certificate paths; required when `https` is set.
    pub tls: Option<TlsConfig>,

    /// Admission budget; absent disables the gate entirely.
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:8080".to_string(),
            https: false,
            request_timeout_secs: 30,
            tls: None,
            rate_limit: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Admission-budget configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Sustained admissions per second.
    pub per_second: u32,

    /// Instantaneous allowance.
    pub burst: u32,

    /// Longest a request may wait for capacity, in milliseconds.
    pub timeout_ms: u64,
}

/// Recipe store location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path of the JSON store file.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "recipes.json".to_string(),
        }
    }
}

/// Credential settings for protected routes.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer token expected on protected routes.
    pub api_key: String,
}
