//! Single-flight state of the refresh scheduler.

use futures::future::{BoxFuture, Shared};
use tokio::time::Instant;

use simgate_core::result::AppResult;
use simgate_core::types::AuthTokens;

/// A refresh whose outcome every concurrent caller awaits.
pub type SharedRefresh = Shared<BoxFuture<'static, AppResult<AuthTokens>>>;

/// Where the scheduler is in its refresh cycle.
#[derive(Default)]
pub enum FlightState {
    /// No refresh running.
    #[default]
    Idle,
    /// One refresh running; callers join it.
    InFlight(SharedRefresh),
    /// A refresh just succeeded; callers before `until` reuse its tokens.
    Cooldown {
        /// The renewed pair.
        tokens: AuthTokens,
        /// End of the reuse window.
        until: Instant,
    },
}

impl std::fmt::Debug for FlightState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::InFlight(_) => f.write_str("InFlight"),
            Self::Cooldown { until, .. } => f.debug_struct("Cooldown").field("until", until).finish(),
        }
    }
}

/// What started a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// The armed timer fired.
    Timer,
    /// A caller asked for it.
    Explicit,
}
