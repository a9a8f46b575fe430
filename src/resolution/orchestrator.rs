//! Top-level resolve-and-follow flow.
//!
//! ```text
//! Start → Classifying → Resolving → Matching → (FallbackMatching) → Found | NotFound
//! ```
//!
//! Every phase runs at most once per call. The only retry is the stale
//! identifier fallback: when an identifier supplied directly matches nothing,
//! its current alias is resolved and mapped back to whichever identifier
//! carries that alias now, and matching runs once more with it.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::cache::{AliasCache, SystemClock};
use crate::config::ResolverConfig;
use crate::error::{FollowResult, ValidationError};
use crate::identifier::{looks_like_identifier, normalize, CanonicalId};
use crate::registry::{wait_for_registry, Registry, RegistryEntity};
use crate::resolution::alias::AliasResolver;
use crate::resolution::lookup::{AliasLookup, NoLookup};
use crate::resolution::matcher::{EntityMatcher, MatchStrategy};
use crate::resolution::target::FollowTarget;

/// External "follow this entity" action.
pub trait FollowAction: Send + Sync {
    /// Start following `entity`. Fire-and-forget.
    fn follow(&self, entity: &RegistryEntity);
}

/// Follow action that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFollowAction;

impl FollowAction for LogFollowAction {
    fn follow(&self, entity: &RegistryEntity) {
        info!(alias = entity.alias().unwrap_or("<unknown>"), "following entity");
    }
}

/// Follow action that remembers every entity it was handed.
#[derive(Debug, Default)]
pub struct RecordingFollowAction {
    followed: Mutex<Vec<RegistryEntity>>,
}

impl RecordingFollowAction {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities followed so far, oldest first.
    #[must_use]
    pub fn followed(&self) -> Vec<RegistryEntity> {
        self.followed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FollowAction for RecordingFollowAction {
    fn follow(&self, entity: &RegistryEntity) {
        self.followed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entity.clone());
    }
}

/// Phase of a single resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Deciding whether the input is an identifier or an alias.
    Classifying,
    /// Turning an alias into an identifier.
    Resolving,
    /// Looking up the entity by identifier.
    Matching,
    /// Retrying through the identifier's current alias.
    FallbackMatching,
    /// Entity found and followed.
    Found,
    /// Gave up.
    NotFound,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Classifying => "classifying",
            Self::Resolving => "resolving",
            Self::Matching => "matching",
            Self::FallbackMatching => "fallback_matching",
            Self::Found => "found",
            Self::NotFound => "not_found",
        };
        f.write_str(name)
    }
}

/// Result of one resolve-and-follow attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FollowOutcome {
    /// No target was requested.
    NoTarget,
    /// The registry does not exist.
    NoRegistry,
    /// The alias maps to no known identifier.
    AliasNotFound {
        /// Alias as supplied.
        alias: String,
        /// Sample of registry keys, for diagnostics.
        available_keys: Vec<String>,
    },
    /// No entity for the identifier, even after the fallback.
    EntityNotFound {
        /// Identifier that was looked up.
        id: CanonicalId,
        /// Sample of registry keys, for diagnostics.
        available_keys: Vec<String>,
    },
    /// The entity was found and handed to the follow action.
    Followed {
        /// Registry key of the entity.
        key: String,
        /// The entity.
        entity: RegistryEntity,
        /// Identifier the entity was matched with.
        id: CanonicalId,
        /// Current alias, if one could be resolved.
        alias: Option<String>,
        /// Strategy that matched.
        strategy: MatchStrategy,
        /// True when the stale identifier fallback produced the match.
        via_fallback: bool,
    },
}

impl FollowOutcome {
    /// True for [`FollowOutcome::Followed`].
    #[must_use]
    pub const fn is_followed(&self) -> bool {
        matches!(self, Self::Followed { .. })
    }
}

/// Drives identifier/alias resolution and the follow action.
pub struct FollowOrchestrator {
    registry: Arc<dyn Registry>,
    resolver: AliasResolver,
    action: Arc<dyn FollowAction>,
    config: ResolverConfig,
}

impl fmt::Debug for FollowOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FollowOrchestrator")
            .field("resolver", &self.resolver)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FollowOrchestrator {
    /// Start building an orchestrator.
    #[must_use]
    pub fn builder() -> FollowOrchestratorBuilder {
        FollowOrchestratorBuilder::default()
    }

    /// Alias resolver in use.
    #[must_use]
    pub fn resolver(&self) -> &AliasResolver {
        &self.resolver
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Wait for the registry, then resolve and follow `target`.
    ///
    /// No target is a logged no-op. A readiness timeout does not stop the
    /// attempt.
    pub async fn run(&self, target: Option<FollowTarget>) -> FollowOutcome {
        let Some(target) = target else {
            info!("no follow target requested");
            return FollowOutcome::NoTarget;
        };
        wait_for_registry(
            self.registry.as_ref(),
            self.config.readiness_timeout,
            self.config.readiness_poll_interval,
        )
        .await;
        self.resolve_and_follow(target.input()).await
    }

    /// Resolve `input` (identifier or alias) to an entity and follow it.
    pub async fn resolve_and_follow(&self, input: &str) -> FollowOutcome {
        if !self.registry.is_available() {
            warn!(input, "no registry available");
            return FollowOutcome::NoRegistry;
        }

        let input = input.trim();
        debug!(phase = %Phase::Classifying, input);
        let direct = looks_like_identifier(input);

        let id = if direct {
            normalize(input)
        } else {
            debug!(phase = %Phase::Resolving, alias = input);
            match self.resolver.find_identifier_by_alias(input).await {
                Some(id) => id,
                None => {
                    let available_keys = self.sample_keys();
                    warn!(
                        phase = %Phase::NotFound,
                        alias = input,
                        ?available_keys,
                        "alias not found"
                    );
                    return FollowOutcome::AliasNotFound {
                        alias: input.to_string(),
                        available_keys,
                    };
                }
            }
        };

        debug!(phase = %Phase::Matching, id = %id);
        let matcher = self.resolver.matcher();
        let mut matched = matcher.find_by_identifier(&id).map(|m| (m, id.clone(), false));

        if matched.is_none() && direct {
            debug!(phase = %Phase::FallbackMatching, id = %id);
            if let Some(realiased) = self.realias(&id).await {
                matched = matcher
                    .find_by_identifier(&realiased)
                    .map(|m| (m, realiased, true));
            }
        }

        let Some((found, id, via_fallback)) = matched else {
            let available_keys = self.sample_keys();
            warn!(
                phase = %Phase::NotFound,
                id = %id.to_display(),
                ?available_keys,
                "entity not found"
            );
            return FollowOutcome::EntityNotFound { id, available_keys };
        };

        self.action.follow(&found.entity);
        let alias = self.resolver.resolve_alias(&id).await;
        info!(
            phase = %Phase::Found,
            id = %id.to_display(),
            key = %found.key,
            alias = alias.as_deref().unwrap_or("<unknown>"),
            via_fallback,
            "following"
        );

        FollowOutcome::Followed {
            key: found.key,
            entity: found.entity,
            id,
            alias,
            strategy: found.strategy,
            via_fallback,
        }
    }

    /// Identifier currently carrying `id`'s alias, when it differs from `id`.
    async fn realias(&self, id: &CanonicalId) -> Option<CanonicalId> {
        let alias = self.resolver.resolve_alias(id).await?;
        let realiased = self.resolver.find_identifier_by_alias(&alias).await?;
        if realiased == *id {
            return None;
        }
        debug!(from = %id, to = %realiased, alias = %alias, "identifier re-resolved through alias");
        Some(realiased)
    }

    fn sample_keys(&self) -> Vec<String> {
        self.registry
            .keys()
            .into_iter()
            .take(self.config.diagnostic_sample)
            .collect()
    }
}

/// Builder for [`FollowOrchestrator`].
#[derive(Default)]
pub struct FollowOrchestratorBuilder {
    registry: Option<Arc<dyn Registry>>,
    cache: Option<Arc<AliasCache>>,
    lookup: Option<Arc<dyn AliasLookup>>,
    action: Option<Arc<dyn FollowAction>>,
    config: ResolverConfig,
}

impl FollowOrchestratorBuilder {
    /// Registry to resolve against (required).
    #[must_use]
    pub fn registry(mut self, registry: Arc<dyn Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Alias cache. Defaults to an empty in-memory cache.
    #[must_use]
    pub fn cache(mut self, cache: Arc<AliasCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Remote lookup service. Defaults to [`NoLookup`].
    #[must_use]
    pub fn lookup(mut self, lookup: Arc<dyn AliasLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Follow action (required).
    #[must_use]
    pub fn action(mut self, action: Arc<dyn FollowAction>) -> Self {
        self.action = Some(action);
        self
    }

    /// Configuration. Defaults to [`ResolverConfig::default`].
    #[must_use]
    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate and assemble.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid config or a missing
    /// registry or action.
    pub fn build(self) -> FollowResult<FollowOrchestrator> {
        let config = self.config.validate()?;
        let registry = self
            .registry
            .ok_or(ValidationError::MissingField { field: "registry" })?;
        let action = self
            .action
            .ok_or(ValidationError::MissingField { field: "action" })?;
        let cache = self.cache.unwrap_or_else(|| {
            Arc::new(AliasCache::in_memory(config.cache_ttl, Arc::new(SystemClock)))
        });
        let lookup = self
            .lookup
            .unwrap_or_else(|| Arc::new(NoLookup) as Arc<dyn AliasLookup>);

        let matcher = EntityMatcher::new(registry.clone(), config.key_namespace.clone());
        Ok(FollowOrchestrator {
            registry,
            resolver: AliasResolver::new(matcher, cache, lookup),
            action,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::registry::InMemoryRegistry;

    const RIN: &str = "0123456789abcdef0123456789abcdef";

    fn orchestrator(registry: Arc<InMemoryRegistry>) -> (FollowOrchestrator, Arc<RecordingFollowAction>) {
        let action = Arc::new(RecordingFollowAction::new());
        let orchestrator = FollowOrchestrator::builder()
            .registry(registry)
            .action(action.clone())
            .config(
                ResolverConfig::default()
                    .with_namespace("ns")
                    .with_readiness(Duration::from_secs(15), Duration::from_millis(250)),
            )
            .build()
            .unwrap();
        (orchestrator, action)
    }

    #[test]
    fn builder_requires_collaborators() {
        let err = FollowOrchestrator::builder()
            .action(Arc::new(LogFollowAction))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("registry"));

        let err = FollowOrchestrator::builder()
            .registry(Arc::new(InMemoryRegistry::new()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("action"));
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let err = FollowOrchestrator::builder()
            .registry(Arc::new(InMemoryRegistry::new()))
            .action(Arc::new(LogFollowAction))
            .config(ResolverConfig::default().with_namespace(""))
            .build()
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn unavailable_registry_is_reported() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.set_available(false);
        let (orchestrator, action) = orchestrator(registry);
        assert_eq!(orchestrator.resolve_and_follow(RIN).await, FollowOutcome::NoRegistry);
        assert!(action.followed().is_empty());
    }

    #[tokio::test]
    async fn follows_by_identifier() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.insert(format!("ns-{RIN}"), json!({ "name": "Rin" }));
        let (orchestrator, action) = orchestrator(registry);

        let outcome = orchestrator.resolve_and_follow(&RIN.to_uppercase()).await;
        let FollowOutcome::Followed { alias, via_fallback, strategy, .. } = outcome else {
            panic!("expected follow, got {outcome:?}");
        };
        assert_eq!(alias.as_deref(), Some("Rin"));
        assert!(!via_fallback);
        assert_eq!(strategy, MatchStrategy::DirectKey);
        assert_eq!(action.followed().len(), 1);
    }

    #[tokio::test]
    async fn unknown_identifier_reports_sample() {
        let registry = Arc::new(InMemoryRegistry::new());
        for i in 0..20 {
            registry.insert(format!("ns-other-{i}"), json!({}));
        }
        let (orchestrator, action) = orchestrator(registry);

        let outcome = orchestrator.resolve_and_follow(RIN).await;
        let FollowOutcome::EntityNotFound { id, available_keys } = outcome else {
            panic!("expected not found, got {outcome:?}");
        };
        assert_eq!(id.as_str(), RIN);
        assert_eq!(available_keys.len(), 10);
        assert_eq!(available_keys[0], "ns-other-0");
        assert!(action.followed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_without_target_is_noop() {
        let (orchestrator, action) = orchestrator(Arc::new(InMemoryRegistry::new()));
        assert_eq!(orchestrator.run(None).await, FollowOutcome::NoTarget);
        assert!(action.followed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_proceeds_after_readiness_timeout() {
        let (orchestrator, _) = orchestrator(Arc::new(InMemoryRegistry::new()));
        let outcome = orchestrator
            .run(Some(FollowTarget::Alias("Rin".to_string())))
            .await;
        assert_eq!(
            outcome,
            FollowOutcome::AliasNotFound {
                alias: "Rin".to_string(),
                available_keys: Vec::new(),
            }
        );
    }

    #[test]
    fn phase_names() {
        assert_eq!(Phase::FallbackMatching.to_string(), "fallback_matching");
        assert_eq!(Phase::NotFound.to_string(), "not_found");
    }
}
