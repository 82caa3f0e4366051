//! The application's route sources.
//!
//! Each submodule owns one component that contributes route descriptors to
//! the registration engine. Adding an endpoint means adding a descriptor to
//! a component's `RouteSource` implementation; no central list is edited.

pub mod recipes;
pub mod system;

pub use recipes::RecipeApi;
pub use system::SystemRoutes;
