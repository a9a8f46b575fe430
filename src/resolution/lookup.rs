//! Remote alias lookup service.
//!
//! The service maps an undashed identifier to its current alias. Anything
//! other than a well-formed success body is absence from the resolver's point
//! of view; the error type only exists so callers can log what went wrong.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ResolverConfig;
use crate::error::{FollowError, FollowResult, LookupError, ValidationError};
use crate::identifier::CanonicalId;

/// Identifier → alias lookup against an external service.
#[async_trait]
pub trait AliasLookup: Send + Sync {
    /// Current alias for `id`, `Ok(None)` when the service knows none.
    async fn lookup(&self, id: &CanonicalId) -> Result<Option<String>, LookupError>;
}

/// Offline lookup that never finds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLookup;

#[async_trait]
impl AliasLookup for NoLookup {
    async fn lookup(&self, _id: &CanonicalId) -> Result<Option<String>, LookupError> {
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl LookupResponse {
    fn into_alias(self) -> Option<String> {
        if self.status.as_deref().is_some_and(|s| !s.eq_ignore_ascii_case("OK")) {
            return None;
        }
        self.name.filter(|n| !n.trim().is_empty())
    }
}

/// HTTP GET lookup against a templated endpoint.
#[derive(Debug, Clone)]
pub struct HttpAliasLookup {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAliasLookup {
    /// Lookup against `endpoint`, where `{id}` stands for the undashed id.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a template without `{id}`, or an
    /// internal error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> FollowResult<Self> {
        let endpoint = endpoint.into();
        if !endpoint.contains("{id}") {
            return Err(ValidationError::InvalidEndpointTemplate { template: endpoint }.into());
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("follow-resolver/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FollowError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, endpoint })
    }

    /// Lookup configured from `config`.
    ///
    /// # Errors
    ///
    /// See [`HttpAliasLookup::new`].
    pub fn from_config(config: &ResolverConfig) -> FollowResult<Self> {
        Self::new(config.lookup_endpoint.clone(), config.lookup_timeout)
    }

    /// Request URL for `id`.
    #[must_use]
    pub fn url_for(&self, id: &CanonicalId) -> String {
        self.endpoint.replace("{id}", id.as_str())
    }
}

#[async_trait]
impl AliasLookup for HttpAliasLookup {
    async fn lookup(&self, id: &CanonicalId) -> Result<Option<String>, LookupError> {
        let response = self
            .client
            .get(self.url_for(id))
            .send()
            .await?
            .error_for_status()?;
        let body: LookupResponse = response.json().await?;
        Ok(body.into_alias())
    }
}
