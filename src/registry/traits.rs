//! Read contract over the external entity registry.
//!
//! The registry is owned and mutated by someone else (the map viewer). The
//! resolver only reads it and must cope with it being empty, half-populated,
//! or not there at all.

use crate::registry::entity::RegistryEntity;

/// Read-only view of a keyed entity collection.
///
/// Keys are expected to look like `<namespace>-<identifier-form>`, but
/// implementations may hold anything.
pub trait Registry: Send + Sync {
    /// Whether the registry exists yet. Defaults to `true`.
    fn is_available(&self) -> bool {
        true
    }

    /// Direct key lookup.
    fn get(&self, key: &str) -> Option<RegistryEntity>;

    /// Snapshot of all entries in iteration order. Calling again restarts
    /// from the current state.
    fn entries(&self) -> Vec<(String, RegistryEntity)>;

    /// Snapshot of all entities.
    fn values(&self) -> Vec<RegistryEntity> {
        self.entries().into_iter().map(|(_, e)| e).collect()
    }

    /// Snapshot of all keys.
    fn keys(&self) -> Vec<String> {
        self.entries().into_iter().map(|(k, _)| k).collect()
    }

    /// Number of entries.
    fn size(&self) -> usize;
}
