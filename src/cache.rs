//! Time-bounded alias cache.
//!
//! Maps canonical identifiers to the alias last seen for them. Entries expire
//! passively: a stale entry reads as absent but stays stored until it is
//! overwritten or [`AliasCache::purge_expired`] runs. The whole mapping is
//! persisted as one JSON blob after every mutation; storage problems are
//! logged and otherwise ignored, since the cache only saves lookups.
//!
//! Persisted layout:
//!
//! ```text
//! { "<canonical id>": { "alias": "<alias>", "lastUpdated": <unix millis> }, ... }
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ResolverConfig, DEFAULT_CACHE_STORAGE_KEY};
use crate::identifier::CanonicalId;
use crate::storage::{InMemoryKeyValueStore, KeyValueStore, StorageError};

/// Source of wall-clock time in unix milliseconds.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the unix epoch.
    fn now_millis(&self) -> i64;
}

/// Clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `start_millis`.
    #[must_use]
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(duration_millis(by), Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

fn duration_millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// One cached alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Alias as it was discovered (original casing).
    pub alias: String,
    /// When the alias was recorded, in unix milliseconds.
    pub last_updated: i64,
}

/// Process-wide alias cache with TTL and write-through persistence.
pub struct AliasCache {
    entries: RwLock<BTreeMap<CanonicalId, CacheEntry>>,
    store: Arc<dyn KeyValueStore>,
    storage_key: String,
    ttl_millis: i64,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AliasCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliasCache")
            .field("storage_key", &self.storage_key)
            .field("ttl_millis", &self.ttl_millis)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl AliasCache {
    /// Load the cache blob from `store`.
    ///
    /// Missing, unreadable or corrupt data yields an empty cache. Individual
    /// entries that do not decode are dropped without discarding the rest.
    #[must_use]
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        storage_key: impl Into<String>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let storage_key = storage_key.into();
        let entries = match store.get(&storage_key) {
            Ok(Some(blob)) => decode_blob(&blob),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!(error = %e, key = %storage_key, "failed to read alias cache; starting empty");
                BTreeMap::new()
            }
        };
        debug!(entries = entries.len(), key = %storage_key, "alias cache loaded");

        Self {
            entries: RwLock::new(entries),
            store,
            storage_key,
            ttl_millis: duration_millis(ttl),
            clock,
        }
    }

    /// Load using the storage key and TTL from `config` and the system clock.
    #[must_use]
    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &ResolverConfig) -> Self {
        Self::load(
            store,
            config.cache_storage_key.clone(),
            config.cache_ttl,
            Arc::new(SystemClock),
        )
    }

    /// Empty cache over volatile storage.
    #[must_use]
    pub fn in_memory(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self::load(
            Arc::new(InMemoryKeyValueStore::new()),
            DEFAULT_CACHE_STORAGE_KEY,
            ttl,
            clock,
        )
    }

    /// Cached alias for `id`, if present and not older than the TTL.
    #[must_use]
    pub fn get(&self, id: &CanonicalId) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(id)?;
        if self.is_fresh(entry) {
            Some(entry.alias.clone())
        } else {
            debug!(id = %id, "cached alias expired");
            None
        }
    }

    /// Stored entry for `id`, ignoring expiry.
    #[must_use]
    pub fn peek(&self, id: &CanonicalId) -> Option<CacheEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(id).cloned()
    }

    /// Record `alias` for `id` and persist. Empty arguments are ignored.
    pub fn set(&self, id: &CanonicalId, alias: &str) {
        if id.is_empty() || alias.trim().is_empty() {
            return;
        }
        let entry = CacheEntry {
            alias: alias.to_string(),
            last_updated: self.clock.now_millis(),
        };
        let blob = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            entries.insert(id.clone(), entry);
            serde_json::to_string(&*entries)
        };
        self.persist(blob.map_err(StorageError::from));
    }

    /// Drop every expired entry, persisting if anything changed.
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let (removed, blob) = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let before = entries.len();
            let now = self.clock.now_millis();
            let ttl = self.ttl_millis;
            entries.retain(|_, e| now.saturating_sub(e.last_updated) <= ttl);
            let removed = before - entries.len();
            (removed, (removed > 0).then(|| serde_json::to_string(&*entries)))
        };
        if let Some(blob) = blob {
            self.persist(blob.map_err(StorageError::from));
        }
        removed
    }

    /// Write the current mapping to storage.
    ///
    /// # Errors
    ///
    /// Returns the storage or serialization failure. Unlike [`set`](Self::set),
    /// this surfaces the error to the caller.
    pub fn flush(&self) -> Result<(), StorageError> {
        let blob = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_string(&*entries)?
        };
        self.store.set(&self.storage_key, &blob)
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.clock.now_millis().saturating_sub(entry.last_updated) <= self.ttl_millis
    }

    fn persist(&self, blob: Result<String, StorageError>) {
        let result = blob.and_then(|blob| self.store.set(&self.storage_key, &blob));
        if let Err(e) = result {
            warn!(error = %e, key = %self.storage_key, "failed to persist alias cache");
        }
    }
}

fn decode_blob(blob: &str) -> BTreeMap<CanonicalId, CacheEntry> {
    let raw: serde_json::Map<String, serde_json::Value> = match serde_json::from_str(blob) {
        Ok(map) => map,
        Err(e) => {
            warn!(error = %e, "alias cache blob is corrupt; starting empty");
            return BTreeMap::new();
        }
    };

    raw.into_iter()
        .filter_map(|(id, value)| {
            let entry = serde_json::from_value::<CacheEntry>(value).ok()?;
            let id = CanonicalId::parse(&id);
            (!id.is_empty()).then_some((id, entry))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "0123456789abcdef0123456789abcdef";
    const HOUR: Duration = Duration::from_secs(3600);

    fn cache_with(store: Arc<InMemoryKeyValueStore>, clock: Arc<ManualClock>) -> AliasCache {
        AliasCache::load(store, DEFAULT_CACHE_STORAGE_KEY, HOUR, clock)
    }

    #[test]
    fn set_then_get_returns_alias() {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = AliasCache::in_memory(HOUR, clock);
        let id = CanonicalId::parse(ID);

        cache.set(&id, "Rin");
        assert_eq!(cache.get(&id).as_deref(), Some("Rin"));
    }

    #[test]
    fn entries_expire_after_ttl_but_stay_stored() {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = AliasCache::in_memory(HOUR, clock.clone());
        let id = CanonicalId::parse(ID);

        cache.set(&id, "Rin");
        clock.advance(HOUR);
        assert_eq!(cache.get(&id).as_deref(), Some("Rin"), "exactly TTL is still fresh");

        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.get(&id), None);
        assert_eq!(cache.peek(&id).map(|e| e.alias), Some("Rin".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn empty_arguments_are_ignored() {
        let cache = AliasCache::in_memory(HOUR, Arc::new(ManualClock::new(0)));
        cache.set(&CanonicalId::default(), "Rin");
        cache.set(&CanonicalId::parse(ID), "   ");
        assert!(cache.is_empty());
    }

    #[test]
    fn set_persists_expected_layout() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let cache = cache_with(store.clone(), Arc::new(ManualClock::new(42)));
        cache.set(&CanonicalId::parse(ID), "Rin");

        let blob = store.get(DEFAULT_CACHE_STORAGE_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(json[ID]["alias"], "Rin");
        assert_eq!(json[ID]["lastUpdated"], 42);
    }

    #[test]
    fn load_restores_persisted_entries() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let clock = Arc::new(ManualClock::new(10));
        cache_with(store.clone(), clock.clone()).set(&CanonicalId::parse(ID), "Rin");

        let reloaded = cache_with(store, clock);
        assert_eq!(reloaded.get(&CanonicalId::parse(ID)).as_deref(), Some("Rin"));
    }

    #[test]
    fn corrupt_blob_degrades_to_empty() {
        let store = Arc::new(InMemoryKeyValueStore::with_value(
            DEFAULT_CACHE_STORAGE_KEY,
            "{not json",
        ));
        let cache = cache_with(store, Arc::new(ManualClock::new(0)));
        assert!(cache.is_empty());
    }

    #[test]
    fn malformed_entries_are_dropped_individually() {
        let blob = format!(
            r#"{{"{ID}": {{"alias": "Rin", "lastUpdated": 5}}, "ffffffffffffffffffffffffffffffff": {{"alias": 3}}}}"#
        );
        let store = Arc::new(InMemoryKeyValueStore::with_value(DEFAULT_CACHE_STORAGE_KEY, blob));
        let cache = cache_with(store, Arc::new(ManualClock::new(5)));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&CanonicalId::parse(ID)).as_deref(), Some("Rin"));
    }

    #[test]
    fn write_failures_are_swallowed() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        store.fail_writes(true);
        let cache = cache_with(store.clone(), Arc::new(ManualClock::new(0)));

        cache.set(&CanonicalId::parse(ID), "Rin");
        assert_eq!(cache.get(&CanonicalId::parse(ID)).as_deref(), Some("Rin"));
        assert!(cache.flush().is_err());
        assert_eq!(store.get(DEFAULT_CACHE_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn purge_expired_removes_only_stale_entries() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache_with(store.clone(), clock.clone());

        cache.set(&CanonicalId::parse(ID), "Old");
        clock.advance(HOUR + Duration::from_millis(1));
        cache.set(&CanonicalId::parse("ffffffffffffffffffffffffffffffff"), "New");

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        let blob = store.get(DEFAULT_CACHE_STORAGE_KEY).unwrap().unwrap();
        assert!(!blob.contains(ID));
    }
}
