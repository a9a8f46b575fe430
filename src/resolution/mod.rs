//! Resolution layer: entity matching, alias resolution, the remote lookup
//! service, follow targets, and the orchestrator tying them together.

pub mod alias;
pub mod lookup;
pub mod matcher;
pub mod orchestrator;
pub mod target;

pub use alias::AliasResolver;
pub use lookup::{AliasLookup, HttpAliasLookup, NoLookup};
pub use matcher::{EntityMatch, EntityMatcher, MatchStrategy};
pub use orchestrator::{
    FollowAction, FollowOrchestrator, FollowOrchestratorBuilder, FollowOutcome, LogFollowAction,
    Phase, RecordingFollowAction,
};
pub use target::{FollowTarget, ALIAS_PARAM, IDENTIFIER_PARAM};
