//! Event model - observable changes to tracker state.

use crate::id::SessionId;
use crate::step::StepName;
use crate::Time;
use serde::{Deserialize, Serialize};

/// A single state change emitted by the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerEvent {
    /// Session the change belongs to
    pub session_id: SessionId,

    /// When it happened
    pub timestamp: Time,

    /// What changed
    pub change: Change,
}

impl TrackerEvent {
    /// Create a new event stamped with the current time.
    pub fn new(session_id: SessionId, change: Change) -> Self {
        Self {
            session_id,
            timestamp: chrono::Utc::now(),
            change,
        }
    }

    /// The step this event refers to, if any.
    pub fn step(&self) -> Option<StepName> {
        match &self.change {
            Change::RequiredChanged { step, .. } | Change::SuccessChanged { step, .. } => {
                Some(*step)
            }
            Change::FailureReasonChanged { .. } | Change::Reset => None,
        }
    }
}

/// Kind of change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    /// A step's required flag flipped
    RequiredChanged { step: StepName, required: bool },
    /// A step's successful flag flipped
    SuccessChanged { step: StepName, successful: bool },
    /// The failure reason was overwritten or cleared
    FailureReasonChanged { reason: Option<String> },
    /// All state returned to construction defaults
    Reset,
}
