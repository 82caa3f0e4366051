//! HTTP front door.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → limit (admission gate, when configured)
//!     → routing::DispatchTable (select handler)
//!     → handler (optionally reading the validator cache)
//!     → error.rs (uniform failure translation)
//! ```

pub mod error;
pub mod server;

pub use error::AppError;
pub use server::HttpServer;
