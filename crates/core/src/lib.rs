//! Crowdsale deployment core data models.
//!
//! This crate defines the fixed deployment sequence, per-step state, the
//! configuration that decides conditional steps, and the events emitted
//! when tracker state changes.

#![warn(missing_docs)]

// Core identities
mod id;

// Deployment sequence
mod step;
mod options;

// Changes and errors
mod event;
mod error;

// Re-exports
pub use id::SessionId;
pub use step::{StepName, StepKind, StepState};
pub use options::DeploymentOptions;
pub use event::{TrackerEvent, Change};
pub use error::{TrackerError, Result};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
