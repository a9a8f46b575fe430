//! # follow-resolver
//!
//! Resolves a player, given by UUID or by name, against a live and possibly
//! still-populating map marker registry, then hands the matching marker to a
//! "follow" action.
//!
//! ## Core Concepts
//!
//! - **CanonicalId**: undashed, lower-case identifier every comparison uses
//! - **Registry**: read-only view over the externally owned marker collection
//! - **EntityMatcher**: direct key probe, key scan, then field scan
//! - **AliasResolver**: alias → identifier scans and the cache → live → remote
//!   identifier → alias tiers
//! - **AliasCache**: TTL-bounded, write-through persisted alias cache
//! - **FollowOrchestrator**: classification, matching, and the stale identifier
//!   fallback
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use follow_resolver::{FollowOrchestrator, InMemoryRegistry, LogFollowAction};
//!
//! let registry = Arc::new(InMemoryRegistry::from_json(markers_json)?);
//! let orchestrator = FollowOrchestrator::builder()
//!     .registry(registry)
//!     .action(Arc::new(LogFollowAction))
//!     .build()?;
//!
//! let outcome = orchestrator.resolve_and_follow("Rin").await;
//! assert!(outcome.is_followed());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod error;
pub mod identifier;
pub mod registry;
pub mod resolution;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use cache::{AliasCache, CacheEntry, Clock, ManualClock, SystemClock};
pub use config::ResolverConfig;
pub use error::{FollowError, FollowResult, LookupError, ValidationError};
pub use identifier::{looks_like_identifier, normalize, to_display, CanonicalId};
pub use registry::{wait_for_registry, InMemoryRegistry, Readiness, Registry, RegistryEntity};
pub use resolution::{
    AliasLookup, AliasResolver, EntityMatch, EntityMatcher, FollowAction, FollowOrchestrator,
    FollowOutcome, FollowTarget, HttpAliasLookup, LogFollowAction, MatchStrategy, NoLookup,
    RecordingFollowAction,
};
pub use storage::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, StorageError};
