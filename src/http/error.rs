//! Uniform translation of handler failures into HTTP responses.
//!
//! # Responsibilities
//! - Define the error type fallible handlers report
//! - Map each failure to a fixed-shape JSON response
//! - Keep internal causes in the server log, out of the response body
//!
//! # Design Decisions
//! - Clients see a stable `{"error": ...}` shape and a status code, nothing else
//! - Store misses become 404s so handlers can use `?` on store calls

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::future::BoxFuture;
use serde_json::json;
use thiserror::Error;

use crate::routing::descriptor::{BoxedHandler, FallibleHandler};
use crate::store::StoreError;

/// Failure reported by a fallible route handler.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("internal error")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AppError {
    pub fn internal(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Internal(error.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::NotFound => "not found".to_string(),
            Self::BadRequest(message) => message.clone(),
            Self::Internal(_) => "internal server error".to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(_) => Self::NotFound,
            other => Self::internal(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Internal(cause) = &self {
            tracing::error!(error = %cause, "handler failed");
        }
        (self.status(), Json(json!({ "error": self.client_message() }))).into_response()
    }
}

/// Adapt a fallible handler into an infallible one by translating its
/// failures through [`AppError`]'s response mapping.
pub fn wrap_fallible(inner: FallibleHandler) -> BoxedHandler {
    std::sync::Arc::new(move |request| -> BoxFuture<'static, Response> {
        let inner = inner.clone();
        Box::pin(async move {
            match inner(request).await {
                Ok(response) => response,
                Err(error) => error.into_response(),
            }
        })
    })
}
