//! Deployment Progress Tracking
//!
//! Per-step required/successful bookkeeping, completion and next-step
//! queries, change observers, and a runner that drives the sequence.

#![warn(missing_docs)]

pub mod tracker;
pub mod observer;
pub mod snapshot;
pub mod runner;

pub use tracker::DeploymentProgressTracker;
pub use observer::{TrackerObserver, ObserverId};
pub use snapshot::{ProgressSnapshot, StepEntry};
pub use runner::{DeploymentRunner, RunnerConfig, RunOutcome, StepExecutor, StepFailure};
