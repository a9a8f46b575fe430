//! Entity matching by identifier.
//!
//! Strategies run in a fixed order and stop at the first hit:
//!
//! 1. direct probe of the two expected keys (`<ns>-<undashed>`, `<ns>-<dashed>`)
//! 2. key scan: a key equal to either expected key, or ending with either
//!    identifier form, compared case-insensitively
//! 3. field scan over identifier-bearing fields, plus an exact comparison of
//!    the dedicated identifier field after separator stripping
//!
//! Scans are linear in registry size and return the first match in
//! iteration order.

use std::sync::Arc;

use tracing::debug;

use crate::identifier::{looks_like_identifier, normalize, CanonicalId};
use crate::registry::{Registry, RegistryEntity};

/// Strategy that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStrategy {
    /// Exact key lookup.
    DirectKey,
    /// Key equality or suffix during a scan.
    KeySuffix,
    /// Identifier-bearing entity field.
    Field,
}

/// A matched registry entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMatch {
    /// Registry key of the entry.
    pub key: String,
    /// The entity itself.
    pub entity: RegistryEntity,
    /// How it was found.
    pub strategy: MatchStrategy,
}

/// Lower-cased spellings of one identifier.
#[derive(Debug, Clone)]
struct KeyForms {
    undashed: String,
    dashed: String,
    undashed_key: String,
    dashed_key: String,
}

impl KeyForms {
    fn new(namespace: &str, id: &CanonicalId) -> Self {
        let namespace = namespace.to_lowercase();
        let undashed = id.as_str().to_string();
        let dashed = id.to_display();
        Self {
            undashed_key: format!("{namespace}-{undashed}"),
            dashed_key: format!("{namespace}-{dashed}"),
            undashed,
            dashed,
        }
    }

    fn key_matches(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        key == self.undashed_key
            || key == self.dashed_key
            || key.ends_with(&self.undashed)
            || key.ends_with(&self.dashed)
    }

    fn field_matches(&self, value: &str) -> bool {
        // Same rules as keys: a field may hold a full key or a bare id.
        self.key_matches(value)
    }
}

/// Finds registry entities by canonical identifier.
#[derive(Clone)]
pub struct EntityMatcher {
    registry: Arc<dyn Registry>,
    namespace: String,
}

impl std::fmt::Debug for EntityMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMatcher")
            .field("namespace", &self.namespace)
            .field("registry_size", &self.registry.size())
            .finish()
    }
}

impl EntityMatcher {
    /// Matcher over `registry` for keys in `namespace`.
    #[must_use]
    pub fn new(registry: Arc<dyn Registry>, namespace: impl Into<String>) -> Self {
        Self {
            registry,
            namespace: namespace.into(),
        }
    }

    /// The registry being searched.
    #[must_use]
    pub fn registry(&self) -> &Arc<dyn Registry> {
        &self.registry
    }

    /// Key namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The two keys an entity for `id` is expected under: undashed, dashed.
    #[must_use]
    pub fn expected_keys(&self, id: &CanonicalId) -> [String; 2] {
        [
            format!("{}-{}", self.namespace, id.as_str()),
            format!("{}-{}", self.namespace, id.to_display()),
        ]
    }

    /// Identifier encoded in a `<namespace>-<identifier>` key.
    #[must_use]
    pub fn identifier_from_key(&self, key: &str) -> Option<CanonicalId> {
        let prefix_len = self.namespace.len() + 1;
        if key.len() <= prefix_len || !key.is_char_boundary(prefix_len) {
            return None;
        }
        let (prefix, rest) = key.split_at(prefix_len);
        let expected = format!("{}-", self.namespace);
        if !prefix.eq_ignore_ascii_case(&expected) || !looks_like_identifier(rest) {
            return None;
        }
        Some(normalize(rest))
    }

    /// Identifier of an entry: from its key, else from its dedicated
    /// identifier field.
    #[must_use]
    pub fn identifier_of(&self, key: &str, entity: &RegistryEntity) -> Option<CanonicalId> {
        self.identifier_from_key(key).or_else(|| {
            entity
                .identifier_alias()
                .filter(|raw| looks_like_identifier(raw.trim()))
                .map(normalize)
        })
    }

    /// First entity matching `id`, trying each strategy in order.
    #[must_use]
    pub fn find_by_identifier(&self, id: &CanonicalId) -> Option<EntityMatch> {
        if id.is_empty() {
            debug!("empty identifier; nothing to match");
            return None;
        }
        let forms = KeyForms::new(&self.namespace, id);

        for key in self.expected_keys(id) {
            if let Some(entity) = self.registry.get(&key) {
                debug!(id = %id, key = %key, "matched by direct key");
                return Some(EntityMatch {
                    key,
                    entity,
                    strategy: MatchStrategy::DirectKey,
                });
            }
        }

        let entries = self.registry.entries();

        if let Some((key, entity)) = entries.iter().find(|(key, _)| forms.key_matches(key)) {
            debug!(id = %id, key = %key, "matched by key scan");
            return Some(EntityMatch {
                key: key.clone(),
                entity: entity.clone(),
                strategy: MatchStrategy::KeySuffix,
            });
        }

        let field_hit = entries.into_iter().find(|(_, entity)| {
            entity.identifier_fields().any(|v| forms.field_matches(v))
                || entity
                    .identifier_alias()
                    .is_some_and(|raw| normalize(raw) == *id)
        });
        if let Some((key, entity)) = field_hit {
            debug!(id = %id, key = %key, "matched by field scan");
            return Some(EntityMatch {
                key,
                entity,
                strategy: MatchStrategy::Field,
            });
        }

        debug!(
            id = %id,
            size = self.registry.size(),
            sample = ?self.registry.keys().into_iter().take(5).collect::<Vec<_>>(),
            "no entity for identifier"
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::registry::InMemoryRegistry;

    const ID: &str = "0123456789abcdef0123456789abcdef";
    const DASHED: &str = "01234567-89ab-cdef-0123-456789abcdef";

    fn matcher(registry: InMemoryRegistry) -> EntityMatcher {
        EntityMatcher::new(Arc::new(registry), "bm-player")
    }

    #[test]
    fn direct_key_undashed_and_dashed() {
        let registry = InMemoryRegistry::new();
        registry.insert(format!("bm-player-{DASHED}"), json!({ "name": "Rin" }));
        let m = matcher(registry).find_by_identifier(&normalize(ID)).unwrap();
        assert_eq!(m.strategy, MatchStrategy::DirectKey);
        assert_eq!(m.key, format!("bm-player-{DASHED}"));
    }

    #[test]
    fn key_scan_handles_foreign_prefix_and_case() {
        let registry = InMemoryRegistry::new();
        registry.insert("other", json!({}));
        registry.insert(format!("v2:players/{}", ID.to_uppercase()), json!({ "name": "Rin" }));
        let m = matcher(registry).find_by_identifier(&normalize(ID)).unwrap();
        assert_eq!(m.strategy, MatchStrategy::KeySuffix);
        assert_eq!(m.entity.alias(), Some("Rin"));
    }

    #[test]
    fn field_scan_finds_entity_without_matching_key() {
        let registry = InMemoryRegistry::new();
        registry.insert("marker-1", json!({ "name": "Other", "id": "something-else" }));
        registry.insert("marker-2", json!({ "name": "Rin", "data": { "id": format!("bm-player-{ID}") } }));
        let m = matcher(registry).find_by_identifier(&normalize(ID)).unwrap();
        assert_eq!(m.strategy, MatchStrategy::Field);
        assert_eq!(m.key, "marker-2");
    }

    #[test]
    fn identifier_alias_field_compares_after_stripping() {
        let registry = InMemoryRegistry::new();
        registry.insert("marker-1", json!({ "playerUuid": DASHED.to_uppercase() }));
        let m = matcher(registry).find_by_identifier(&normalize(ID)).unwrap();
        assert_eq!(m.strategy, MatchStrategy::Field);
    }

    #[test]
    fn direct_key_wins_over_field_scan() {
        let registry = InMemoryRegistry::new();
        registry.insert("marker-first", json!({ "id": ID, "name": "ByField" }));
        registry.insert(format!("bm-player-{ID}"), json!({ "name": "ByKey" }));
        let m = matcher(registry).find_by_identifier(&normalize(ID)).unwrap();
        assert_eq!(m.strategy, MatchStrategy::DirectKey);
        assert_eq!(m.entity.alias(), Some("ByKey"));
    }

    #[test]
    fn first_field_match_in_iteration_order_wins() {
        let registry = InMemoryRegistry::new();
        registry.insert("a", json!({ "uuid": ID, "name": "First" }));
        registry.insert("b", json!({ "uuid": ID, "name": "Second" }));
        let m = matcher(registry).find_by_identifier(&normalize(ID)).unwrap();
        assert_eq!(m.key, "a");
    }

    #[test]
    fn misses_return_none() {
        let registry = InMemoryRegistry::new();
        registry.insert("bm-player-ffffffffffffffffffffffffffffffff", json!({}));
        let matcher = matcher(registry);
        assert!(matcher.find_by_identifier(&normalize(ID)).is_none());
        assert!(matcher.find_by_identifier(&CanonicalId::default()).is_none());
    }

    #[test]
    fn identifier_extraction_from_keys() {
        let matcher = matcher(InMemoryRegistry::new());
        assert_eq!(
            matcher.identifier_from_key(&format!("bm-player-{DASHED}")),
            Some(normalize(ID))
        );
        assert_eq!(
            matcher.identifier_from_key(&format!("BM-PLAYER-{ID}")),
            Some(normalize(ID))
        );
        assert_eq!(matcher.identifier_from_key("bm-player-rin"), None);
        assert_eq!(matcher.identifier_from_key(&format!("bm-marker-{ID}")), None);
        assert_eq!(matcher.identifier_from_key("bm-player"), None);
    }

    #[test]
    fn identifier_of_falls_back_to_field() {
        let matcher = matcher(InMemoryRegistry::new());
        let entity = RegistryEntity::new(json!({ "uuid": DASHED }));
        assert_eq!(matcher.identifier_of("marker-7", &entity), Some(normalize(ID)));
        let entity = RegistryEntity::new(json!({ "uuid": "not-an-id" }));
        assert_eq!(matcher.identifier_of("marker-7", &entity), None);
    }
}
