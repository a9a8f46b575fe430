//! Resolver configuration.

use std::time::Duration;

use crate::error::ValidationError;

/// Key namespace used by the map viewer's player marker set.
pub const DEFAULT_KEY_NAMESPACE: &str = "bm-player";

/// Storage key holding the serialized alias cache.
pub const DEFAULT_CACHE_STORAGE_KEY: &str = "bluemapPlayerCache";

/// How long a cached alias stays valid.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(1000 * 60 * 60);

/// Remote lookup endpoint; `{id}` is replaced with the undashed identifier.
pub const DEFAULT_LOOKUP_ENDPOINT: &str = "https://api.minetools.eu/uuid/{id}";

/// Configuration shared by the matcher, alias resolver and orchestrator.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Registry key prefix. Keys look like `<namespace>-<identifier>`.
    pub key_namespace: String,
    /// Time-to-live of cached aliases.
    pub cache_ttl: Duration,
    /// Storage key of the persisted cache blob.
    pub cache_storage_key: String,
    /// Remote lookup URL template.
    pub lookup_endpoint: String,
    /// Per-request timeout of the remote lookup.
    pub lookup_timeout: Duration,
    /// Upper bound on the registry readiness wait.
    pub readiness_timeout: Duration,
    /// Interval between readiness checks.
    pub readiness_poll_interval: Duration,
    /// Maximum number of registry keys listed in not-found diagnostics.
    pub diagnostic_sample: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            key_namespace: DEFAULT_KEY_NAMESPACE.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_storage_key: DEFAULT_CACHE_STORAGE_KEY.to_string(),
            lookup_endpoint: DEFAULT_LOOKUP_ENDPOINT.to_string(),
            lookup_timeout: Duration::from_secs(5),
            readiness_timeout: Duration::from_secs(15),
            readiness_poll_interval: Duration::from_millis(250),
            diagnostic_sample: 10,
        }
    }
}

impl ResolverConfig {
    /// Sets the registry key namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.key_namespace = namespace.into();
        self
    }

    /// Sets the cache TTL.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the readiness wait bounds.
    #[must_use]
    pub fn with_readiness(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.readiness_timeout = timeout;
        self.readiness_poll_interval = poll_interval;
        self
    }

    /// Checks the configuration, returning it unchanged when valid.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for empty names, zero durations, or a
    /// lookup endpoint without an `{id}` placeholder.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.key_namespace.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "key_namespace",
            });
        }
        if self.cache_storage_key.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "cache_storage_key",
            });
        }
        if !self.lookup_endpoint.contains("{id}") {
            return Err(ValidationError::InvalidEndpointTemplate {
                template: self.lookup_endpoint,
            });
        }

        for (field, value) in [
            ("cache_ttl", self.cache_ttl),
            ("lookup_timeout", self.lookup_timeout),
            ("readiness_timeout", self.readiness_timeout),
            ("readiness_poll_interval", self.readiness_poll_interval),
        ] {
            if value.is_zero() {
                return Err(ValidationError::ZeroDuration { field });
            }
        }

        Ok(self)
    }

    /// Expands the lookup endpoint for an undashed identifier.
    #[must_use]
    pub fn lookup_url(&self, undashed_id: &str) -> String {
        self.lookup_endpoint.replace("{id}", undashed_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ResolverConfig::default().validate().unwrap();
        assert_eq!(config.key_namespace, "bm-player");
        assert_eq!(config.cache_ttl, Duration::from_millis(3_600_000));
        assert_eq!(config.readiness_timeout, Duration::from_secs(15));
    }

    #[test]
    fn rejects_empty_namespace() {
        let err = ResolverConfig::default()
            .with_namespace("  ")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ValidationError::EmptyField { field: "key_namespace" }));
    }

    #[test]
    fn rejects_zero_ttl() {
        let err = ResolverConfig::default()
            .with_cache_ttl(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ValidationError::ZeroDuration { field: "cache_ttl" }));
    }

    #[test]
    fn rejects_endpoint_without_placeholder() {
        let config = ResolverConfig {
            lookup_endpoint: "https://example.invalid/uuid/".to_string(),
            ..ResolverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidEndpointTemplate { .. })
        ));
    }

    #[test]
    fn lookup_url_substitutes_identifier() {
        let config = ResolverConfig::default();
        assert_eq!(
            config.lookup_url("0123456789abcdef0123456789abcdef"),
            "https://api.minetools.eu/uuid/0123456789abcdef0123456789abcdef"
        );
    }
}
