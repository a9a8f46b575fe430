//! Bounded wait for the registry to populate.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::registry::traits::Registry;

/// Result of [`wait_for_registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The registry is available and holds at least one entry.
    Ready {
        /// Time spent waiting.
        waited: Duration,
    },
    /// The ceiling was reached first.
    TimedOut {
        /// Time spent waiting.
        waited: Duration,
    },
}

impl Readiness {
    /// True for [`Readiness::Ready`].
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Polls until the registry is available and non-empty, or `timeout` elapses.
///
/// A timeout is reported, not raised: callers go on to resolve against
/// whatever the registry holds.
pub async fn wait_for_registry(
    registry: &dyn Registry,
    timeout: Duration,
    interval: Duration,
) -> Readiness {
    let start = Instant::now();
    loop {
        if registry.is_available() && registry.size() > 0 {
            let waited = start.elapsed();
            debug!(?waited, size = registry.size(), "registry ready");
            return Readiness::Ready { waited };
        }

        let waited = start.elapsed();
        if waited >= timeout {
            warn!(
                ?waited,
                available = registry.is_available(),
                "registry not populated before timeout; continuing anyway"
            );
            return Readiness::TimedOut { waited };
        }
        sleep(interval.min(timeout - waited)).await;
    }
}
