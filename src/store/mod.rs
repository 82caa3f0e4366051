//! Mutable recipe store and its mutation hook bus.
//!
//! # Data Flow
//! ```text
//! handler write (insert/update/delete)
//!     → recipes.rs (commit into the record map)
//!     → hooks.rs (fire post-commit hooks with the record id)
//!     → subscribers (e.g. validator cache eviction)
//! ```

pub mod hooks;
pub mod recipes;

pub use hooks::{HookBus, Mutation, MutationHook};
pub use recipes::{Recipe, RecipeDraft, RecipeStore, StoreError};
