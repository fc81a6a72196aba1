//! Observer contract for reacting to tracker changes.

use crate::tracker::DeploymentProgressTracker;
use deploy_core::TrackerEvent;

/// Something that reacts to tracker state changes (a UI, a log sink, a test).
///
/// Observers run synchronously after the change has been applied, so derived
/// queries on `tracker` already reflect it.
pub trait TrackerObserver: Send + Sync {
    /// Called once per state change.
    fn on_event(&self, event: &TrackerEvent, tracker: &DeploymentProgressTracker);
}

impl<F> TrackerObserver for F
where
    F: Fn(&TrackerEvent, &DeploymentProgressTracker) + Send + Sync,
{
    fn on_event(&self, event: &TrackerEvent, tracker: &DeploymentProgressTracker) {
        self(event, tracker)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);
