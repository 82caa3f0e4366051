//! In-memory recipe records with JSON persistence.
//!
//! # Responsibilities
//! - Hold recipe records behind a concurrent map
//! - Allocate record ids and bump revisions on writes
//! - Fire post-commit hooks for every insert/update/delete
//! - Load and save the record set as JSON on disk
//!
//! # Design Decisions
//! - DashMap keeps unrelated records from contending on one lock
//! - Hooks fire strictly after the record guard is released, so an observer
//!   may read the store without deadlocking and always sees the committed state
//! - Revision numbers, not content hashes, feed validator-token derivation

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::hooks::{HookBus, Mutation};

/// A stored recipe record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub image: Option<Vec<u8>>,
    /// Incremented on every committed write to this record.
    pub revision: u64,
}

impl Recipe {
    /// Derive the validator token for the record's current state.
    pub fn etag(&self) -> String {
        format!("\"{}-{}\"", self.id, self.revision)
    }
}

/// Caller-supplied fields for an insert or update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub image: Option<Vec<u8>>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("recipe {0} not found")]
    NotFound(i64),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt store file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Thread-safe recipe store with an attached mutation hook bus.
pub struct RecipeStore {
    records: DashMap<i64, Recipe>,
    next_id: AtomicI64,
    hooks: HookBus,
    persistence_path: Option<PathBuf>,
}

impl RecipeStore {
    /// Create an empty, non-persistent store.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicI64::new(1),
            hooks: HookBus::new(),
            persistence_path: None,
        }
    }

    /// Open a store backed by `path`, loading existing records if the file
    /// is present.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let store = Self {
            records: DashMap::new(),
            next_id: AtomicI64::new(1),
            hooks: HookBus::new(),
            persistence_path: Some(path.to_path_buf()),
        };

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let records: Vec<Recipe> = serde_json::from_reader(reader)?;
            let mut max_id = 0;
            for recipe in records {
                max_id = max_id.max(recipe.id);
                store.records.insert(recipe.id, recipe);
            }
            store.next_id.store(max_id + 1, Ordering::SeqCst);
            tracing::info!(
                path = %path.display(),
                records = store.records.len(),
                "recipe store loaded"
            );
        }

        Ok(store)
    }

    /// Write all records to the backing file, if one is configured.
    pub fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };

        let mut records: Vec<Recipe> =
            self.records.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by_key(|recipe| recipe.id);

        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &records)?;
        tracing::info!(path = %path.display(), records = records.len(), "recipe store persisted");
        Ok(())
    }

    /// Post-commit hook bus for this store.
    pub fn hooks(&self) -> &HookBus {
        &self.hooks
    }

    pub fn get(&self, id: i64) -> Option<Recipe> {
        self.records.get(&id).map(|entry| entry.value().clone())
    }

    /// All records, ordered by id.
    pub fn list(&self) -> Vec<Recipe> {
        let mut records: Vec<Recipe> =
            self.records.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by_key(|recipe| recipe.id);
        records
    }

    /// Insert a new record. Hooks fire after the record is visible to readers.
    pub fn insert(&self, draft: RecipeDraft) -> Recipe {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let recipe = Recipe {
            id,
            title: draft.title,
            body: draft.body,
            image: draft.image,
            revision: 1,
        };
        self.records.insert(id, recipe.clone());
        self.hooks.fire(id, Mutation::Insert);
        recipe
    }

    /// Replace a record's fields and bump its revision.
    pub fn update(&self, id: i64, draft: RecipeDraft) -> Result<Recipe, StoreError> {
        let updated = {
            let mut entry = self.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
            entry.title = draft.title;
            entry.body = draft.body;
            entry.image = draft.image;
            entry.revision += 1;
            entry.clone()
        };
        // Guard released above; the write is committed before hooks run.
        self.hooks.fire(id, Mutation::Update);
        Ok(updated)
    }

    pub fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.records.remove(&id).ok_or(StoreError::NotFound(id))?;
        self.hooks.fire(id, Mutation::Delete);
        Ok(())
    }
}

impl Default for RecipeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    fn draft(title: &str) -> RecipeDraft {
        RecipeDraft {
            title: title.to_string(),
            body: "stir".to_string(),
            image: None,
        }
    }

    #[test]
    fn test_insert_allocates_ids_and_fires_hook() {
        let store = RecipeStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        store.hooks().subscribe(Box::new(move |id, mutation| {
            log.lock().unwrap().push((id, mutation));
            Ok(())
        }));

        let first = store.insert(draft("soup"));
        let second = store.insert(draft("bread"));

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.revision, 1);
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[(1, Mutation::Insert), (2, Mutation::Insert)]
        );
    }

    #[test]
    fn test_hooks_observe_the_committed_state() {
        let store = Arc::new(RecipeStore::new());
        let observed = Arc::new(AtomicBool::new(false));

        let reader = store.clone();
        let flag = observed.clone();
        store.hooks().subscribe(Box::new(move |id, mutation| {
            if mutation == Mutation::Update {
                let recipe = reader.get(id).expect("record visible to hook");
                flag.store(recipe.revision == 2, Ordering::SeqCst);
            }
            Ok(())
        }));

        let id = store.insert(draft("soup")).id;
        store.update(id, draft("stew")).unwrap();
        assert!(observed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_update_bumps_revision_and_changes_etag() {
        let store = RecipeStore::new();
        let recipe = store.insert(draft("soup"));
        let before = recipe.etag();

        let updated = store.update(recipe.id, draft("stew")).unwrap();
        assert_eq!(updated.revision, 2);
        assert_ne!(updated.etag(), before);
    }

    #[test]
    fn test_update_and_delete_missing_record() {
        let store = RecipeStore::new();
        assert!(matches!(store.update(9, draft("x")), Err(StoreError::NotFound(9))));
        assert!(matches!(store.delete(9), Err(StoreError::NotFound(9))));
    }

    #[test]
    fn test_persist_and_reload() {
        let path = std::env::temp_dir().join(format!("recipes-test-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let store = RecipeStore::load_from_file(&path).unwrap();
        store.insert(draft("soup"));
        store.insert(draft("bread"));
        store.delete(1).unwrap();
        store.persist().unwrap();

        let reloaded = RecipeStore::load_from_file(&path).unwrap();
        assert_eq!(reloaded.list().len(), 1);
        assert_eq!(reloaded.get(2).unwrap().title, "bread");
        // Id allocation resumes past the highest persisted id.
        assert_eq!(reloaded.insert(draft("cake")).id, 3);

        let _ = std::fs::remove_file(&path);
    }
}
