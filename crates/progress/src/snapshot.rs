//! Serializable view of tracker state at a point in time.

use chrono::{DateTime, Utc};
use deploy_core::{SessionId, StepState};
use serde::{Deserialize, Serialize};

/// A snapshot of deployment progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    /// Session the snapshot was taken from
    pub session_id: SessionId,

    /// When snapshot was taken
    pub timestamp: DateTime<Utc>,

    /// Per-step flags in declaration order
    pub steps: Vec<StepEntry>,

    /// Most recent failure reason
    pub failure_reason: Option<String>,

    /// Whether every required step was successful
    pub finished: bool,

    /// Name of the next pending step (empty when none)
    pub next_pending: String,
}

/// One step's flags inside a snapshot.
///
/// The name is kept as a string so that restoring can reject names outside
/// the known sequence instead of failing deserialization outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEntry {
    /// Step wire name
    pub name: String,

    /// Required flag
    pub required: bool,

    /// Successful flag
    pub successful: bool,
}

impl StepEntry {
    /// Flags of this entry.
    pub fn state(&self) -> StepState {
        StepState {
            required: self.required,
            successful: self.successful,
        }
    }
}

impl ProgressSnapshot {
    /// Number of steps still pending.
    pub fn pending_count(&self) -> usize {
        self.steps.iter().filter(|s| s.state().is_pending()).count()
    }
}
