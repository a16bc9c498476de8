//! Session lifecycle events.
//!
//! Events are published on an [`EventBus`] and consumed by whatever drives
//! the UI: the agent binary logs them, the CLI prints them, and tests
//! assert on them.

pub mod auth;
pub mod bus;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use auth::AuthEvent;
pub use bus::EventBus;

/// Envelope around an [`AuthEvent`] with delivery metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The event payload.
    pub payload: AuthEvent,
}

impl DomainEvent {
    /// Wrap a payload with a fresh id and the current time.
    pub fn new(payload: AuthEvent) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            payload,
        }
    }
}
