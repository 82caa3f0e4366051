//! Request admission control.
//!
//! # Responsibilities
//! - Enforce one process-wide token-bucket budget over all routes
//! - Queue requests when the bucket is empty, in arrival order
//! - Reject requests that wait longer than the configured timeout
//!
//! # Design Decisions
//! - A single shared budget; no per-client or per-route partitioning
//! - Semaphore permits model bucket tokens: acquisition is FIFO, and a
//!   waiter that goes away (disconnect, deadline) leaves the queue without
//!   consuming a token
//! - Refill is the only permit producer; admitted requests keep theirs,
//!   which is what caps the sustained rate at the configured limit
//! - Rejection surfaces as 429, never as a server error

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::config::schema::RateLimitConfig;

/// Process-wide admission budget, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionBudget {
    /// Sustained admissions per second.
    pub per_second: u32,
    /// Instantaneous allowance on top of the sustained rate.
    pub burst: u32,
    /// Longest a request may wait for capacity before rejection.
    pub timeout: Duration,
}

impl From<&RateLimitConfig> for AdmissionBudget {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            per_second: config.per_second,
            burst: config.burst,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

/// Capacity was exhausted for longer than the budget's timeout.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("admission capacity exhausted")]
pub struct AdmissionRejected;

/// Token-bucket gate shared by every route.
pub struct Limiter {
    permits: Arc<Semaphore>,
    timeout: Duration,
    refill: JoinHandle<()>,
}

impl Limiter {
    /// Build the gate and start its refill task. Must run inside a Tokio
    /// runtime.
    pub fn new(budget: AdmissionBudget) -> Self {
        let permits = Arc::new(Semaphore::new(budget.burst as usize));
        let burst = budget.burst.max(1) as usize;
        let period = Duration::from_secs_f64(1.0 / f64::from(budget.per_second.max(1)));

        let bucket = permits.clone();
        let refill = tokio::spawn(async move {
            // First refill lands one period in; the initial burst is already
            // in the bucket.
            let mut tick = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                tick.tick().await;
                if bucket.available_permits() < burst {
                    bucket.add_permits(1);
                }
            }
        });

        Self {
            permits,
            timeout: budget.timeout,
            refill,
        }
    }

    /// Acquire one unit of capacity, waiting up to the budget's timeout.
    ///
    /// Waiters are admitted in arrival order as refills land.
    pub async fn admit(&self) -> Result<(), AdmissionRejected> {
        match tokio::time::timeout(self.timeout, self.permits.acquire()).await {
            Ok(Ok(permit)) => {
                permit.forget();
                Ok(())
            }
            // Semaphore closure does not happen in practice; treat it the
            // same as exhaustion rather than panicking mid-request.
            Ok(Err(_)) | Err(_) => Err(AdmissionRejected),
        }
    }
}

impl Drop for Limiter {
    fn drop(&mut self) {
        self.refill.abort();
    }
}

/// Axum middleware gating every request behind the shared [`Limiter`].
pub async fn admission_middleware(
    State(limiter): State<Arc<Limiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match limiter.admit().await {
        Ok(()) => next.run(request).await,
        Err(AdmissionRejected) => {
            tracing::debug!(path = %request.uri().path(), "request rejected at admission");
            (StatusCode::TOO_MANY_REQUESTS, "too many requests").into_response()
        }
    }
}
