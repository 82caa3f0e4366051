//! Post-commit mutation hooks.
//!
//! # Responsibilities
//! - Carry observers interested in committed writes
//! - Fire each observer with the record id and the kind of write
//!
//! # Design Decisions
//! - Hooks run after the write is committed, never inside it
//! - A failing hook is logged and skipped; the write stands
//! - Subscription happens during startup wiring only

use std::sync::RwLock;

/// Kind of committed write a hook is notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Insert,
    Update,
    Delete,
}

/// Observer callback fired after a committed write.
pub type MutationHook =
    Box<dyn Fn(i64, Mutation) -> Result<(), Box<dyn std::error::Error + Send + Sync>> + Send + Sync>;

/// Publish point for committed writes.
#[derive(Default)]
pub struct HookBus {
    hooks: RwLock<Vec<MutationHook>>,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Intended for startup wiring.
    pub fn subscribe(&self, hook: MutationHook) {
        self.hooks.write().expect("hook bus lock poisoned").push(hook);
    }

    /// Notify every observer of a committed write.
    ///
    /// Observer failures do not propagate to the caller and do not retry.
    pub fn fire(&self, id: i64, mutation: Mutation) {
        for hook in self.hooks.read().expect("hook bus lock poisoned").iter() {
            if let Err(error) = hook(id, mutation) {
                tracing::warn!(
                    record_id = id,
                    kind = ?mutation,
                    %error,
                    "mutation hook failed"
                );
            }
        }
    }
}
