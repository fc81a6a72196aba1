//! Error taxonomy for the deployment tracker.

/// Error type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors raised at the tracker boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    /// A step name outside the fixed deployment sequence
    #[error("Unknown step name: {0}")]
    UnknownStepName(String),

    /// A snapshot that does not describe exactly the known steps
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}
