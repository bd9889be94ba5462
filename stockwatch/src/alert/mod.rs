//! Low-stock alerting: policy, the popup decision, per-identity memory,
//! and the event-driven refresh cycle that ties them together.

mod evaluator;
mod orchestrator;
mod policy;
mod store;

use serde::{Deserialize, Serialize};

pub use evaluator::{AlertVerdict, evaluate};
pub use orchestrator::{AlertView, CycleOutcome, InventoryEvent, PollingOrchestrator};
pub use policy::{AlertPolicy, DEFAULT_COOLDOWN_HOURS};
pub use store::{AlertStore, GUEST_SCOPE, Identity, SessionAlertStore};

/// Milliseconds since the Unix epoch.
pub type EpochMillis = i64;

pub fn now_millis() -> EpochMillis {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as EpochMillis
}

/// What the alert logic remembers about one identity during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMemory {
    pub identity: String,
    /// Low-stock count seen on the previous evaluation.
    pub last_observed_count: u64,
    /// When the operator last dismissed the popup.
    pub last_acknowledged_at: Option<EpochMillis>,
}

impl AlertMemory {
    /// Fresh memory: nothing observed, never acknowledged.
    pub fn zeroed(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            last_observed_count: 0,
            last_acknowledged_at: None,
        }
    }
}
