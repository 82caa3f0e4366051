//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check cross-field requirements (https needs TLS paths)
//! - Validate value ranges (rate-limit values nonzero)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("server.address `{0}` is not a valid socket address")]
    InvalidAddress(String),
    #[error("server.https requires [server.tls] with certificate paths")]
    TlsRequired,
    #[error("server.rate_limit.{0} must be greater than zero")]
    ZeroRateLimit(&'static str),
    #[error("database.path must not be empty")]
    EmptyDatabasePath,
    #[error("auth.api_key must not be empty")]
    EmptyApiKey,
}

/// Validate a parsed configuration, collecting every fault.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress(config.server.address.clone()));
    }

    if config.server.https && config.server.tls.is_none() {
        errors.push(ValidationError::TlsRequired);
    }

    if let Some(rate_limit) = &config.server.rate_limit {
        if rate_limit.per_second == 0 {
            errors.push(ValidationError::ZeroRateLimit("per_second"));
        }
        if rate_limit.burst == 0 {
            errors.push(ValidationError::ZeroRateLimit("burst"));
        }
    }

    if config.database.path.is_empty() {
        errors.push(ValidationError::EmptyDatabasePath);
    }

    if config.auth.api_key.is_empty() {
        errors.push(ValidationError::EmptyApiKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
