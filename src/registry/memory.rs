//! In-memory registry.
//!
//! Insertion-ordered, so scans see entries in the order the producer added
//! them. Used by the CLI (loaded from a JSON snapshot) and by tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use indexmap::IndexMap;
use serde_json::Value;

use crate::registry::entity::RegistryEntity;
use crate::registry::traits::Registry;
use crate::storage::StorageError;

/// Mutable registry held in memory.
#[derive(Debug)]
pub struct InMemoryRegistry {
    entries: RwLock<IndexMap<String, RegistryEntity>>,
    available: AtomicBool,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl InMemoryRegistry {
    /// Create a new empty, available registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, record)` pairs.
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let registry = Self::new();
        for (key, record) in entries {
            registry.insert(key, record);
        }
        registry
    }

    /// Parse a JSON object of `key -> record`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` when the text is not a JSON
    /// object.
    pub fn from_json(text: &str) -> Result<Self, StorageError> {
        let map: serde_json::Map<String, Value> = serde_json::from_str(text)?;
        Ok(Self::from_entries(map))
    }

    /// Insert or replace an entry, keeping its original position on replace.
    pub fn insert(&self, key: impl Into<String>, record: impl Into<RegistryEntity>) {
        self.write().insert(key.into(), record.into());
    }

    /// Remove an entry.
    pub fn remove(&self, key: &str) -> Option<RegistryEntity> {
        self.write().shift_remove(key)
    }

    /// Remove everything.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Mark the registry as present or absent.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, IndexMap<String, RegistryEntity>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, IndexMap<String, RegistryEntity>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Registry for InMemoryRegistry {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn get(&self, key: &str) -> Option<RegistryEntity> {
        self.read().get(key).cloned()
    }

    fn entries(&self) -> Vec<(String, RegistryEntity)> {
        self.read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    fn size(&self) -> usize {
        self.read().len()
    }
}
