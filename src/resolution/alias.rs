//! Alias resolution in both directions.
//!
//! `resolve_alias` goes identifier → alias through three tiers (cache, live
//! entity, remote service). `find_identifier_by_alias` goes alias →
//! identifier: a fast scan of live aliases, then a slow scan that resolves
//! each entry's current alias one at a time.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::AliasCache;
use crate::identifier::CanonicalId;
use crate::resolution::lookup::AliasLookup;
use crate::resolution::matcher::EntityMatcher;

fn fold(alias: &str) -> String {
    alias.trim().to_lowercase()
}

/// Resolves aliases against the registry, the cache and the remote service.
#[derive(Clone)]
pub struct AliasResolver {
    matcher: EntityMatcher,
    cache: Arc<AliasCache>,
    lookup: Arc<dyn AliasLookup>,
}

impl std::fmt::Debug for AliasResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliasResolver")
            .field("matcher", &self.matcher)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl AliasResolver {
    /// Resolver using `matcher` for live lookups.
    #[must_use]
    pub fn new(matcher: EntityMatcher, cache: Arc<AliasCache>, lookup: Arc<dyn AliasLookup>) -> Self {
        Self {
            matcher,
            cache,
            lookup,
        }
    }

    /// Entity matcher in use.
    #[must_use]
    pub fn matcher(&self) -> &EntityMatcher {
        &self.matcher
    }

    /// Alias cache in use.
    #[must_use]
    pub fn cache(&self) -> &Arc<AliasCache> {
        &self.cache
    }

    /// Identifier of the entity currently carrying `target` as its alias.
    ///
    /// Comparison is trimmed and case-insensitive. The first matching entry
    /// in registry order wins, on both the fast and the slow path.
    pub async fn find_identifier_by_alias(&self, target: &str) -> Option<CanonicalId> {
        let wanted = fold(target);
        if wanted.is_empty() {
            return None;
        }
        let entries = self.matcher.registry().entries();

        for (key, entity) in &entries {
            let Some(alias) = entity.alias() else {
                continue;
            };
            if fold(alias) != wanted {
                continue;
            }
            if let Some(id) = self.matcher.identifier_from_key(key) {
                debug!(alias = %alias, id = %id, key = %key, "alias matched live entity");
                self.cache.set(&id, alias);
                return Some(id);
            }
        }

        // One request at a time: bounds load on the lookup service and keeps
        // "first in registry order" well defined.
        for (key, entity) in &entries {
            let Some(id) = self.matcher.identifier_of(key, entity) else {
                continue;
            };
            if let Some(alias) = self.resolve_alias(&id).await {
                if fold(&alias) == wanted {
                    debug!(alias = %alias, id = %id, key = %key, "alias matched via resolution");
                    return Some(id);
                }
            }
        }

        debug!(alias = %target, entries = entries.len(), "no identifier for alias");
        None
    }

    /// Current alias of `id`: cache, then live entity, then remote lookup.
    ///
    /// Absence is a normal outcome. Remote failures are logged and reported
    /// as absence.
    pub async fn resolve_alias(&self, id: &CanonicalId) -> Option<String> {
        if id.is_empty() {
            return None;
        }

        if let Some(alias) = self.cache.get(id) {
            debug!(id = %id, alias = %alias, "alias from cache");
            return Some(alias);
        }

        if let Some(found) = self.matcher.find_by_identifier(id) {
            if let Some(alias) = found.entity.alias() {
                debug!(id = %id, alias = %alias, key = %found.key, "alias from live entity");
                return Some(alias.to_string());
            }
        }

        match self.lookup.lookup(id).await {
            Ok(Some(alias)) => {
                debug!(id = %id, alias = %alias, "alias from remote lookup");
                self.cache.set(id, &alias);
                Some(alias)
            }
            Ok(None) => {
                debug!(id = %id, "remote lookup has no alias");
                None
            }
            Err(e) => {
                warn!(id = %id, error = %e, "remote alias lookup failed");
                None
            }
        }
    }
}
