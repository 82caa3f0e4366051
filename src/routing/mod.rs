//! Route declaration, validation and dispatch.
//!
//! # Data Flow
//! ```text
//! components (site::*)
//!     → descriptor.rs (declare name/path/methods/payload)
//!     → registry.rs (validate, compose auth + error wrappers, install)
//!     → table.rs (immutable dispatch table consulted per request)
//! ```

pub mod descriptor;
pub mod matcher;
pub mod registry;
pub mod table;

pub use descriptor::{BoxedHandler, FallibleHandler, PlainService, RouteDescriptor};
pub use registry::{RegistryError, RouteRegistry, RouteSource};
pub use table::DispatchTable;
