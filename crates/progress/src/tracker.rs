//! Deployment progress tracking.

use crate::observer::{ObserverId, TrackerObserver};
use crate::snapshot::{ProgressSnapshot, StepEntry};
use chrono::Utc;
use deploy_core::{
    Change, DeploymentOptions, Result, SessionId, StepName, StepState, TrackerError,
    TrackerEvent,
};
use indexmap::IndexMap;
use tracing::{debug, info};

/// Single source of truth for per-step required/successful flags and the
/// most recent failure reason of one deployment session.
///
/// The tracker never performs deployment work itself. An external driver
/// reads [`next_pending_transaction`](Self::next_pending_transaction),
/// executes that step, and reports the outcome back through the mutators.
pub struct DeploymentProgressTracker {
    session_id: SessionId,
    steps: IndexMap<StepName, StepState>,
    failure_reason: Option<String>,
    observers: Vec<(ObserverId, Box<dyn TrackerObserver>)>,
    next_observer_id: u64,
}

impl DeploymentProgressTracker {
    /// Create a tracker with every step required and none successful.
    pub fn new() -> Self {
        Self::with_session(SessionId::new())
    }

    /// Create a fresh tracker for an existing session id.
    pub fn with_session(session_id: SessionId) -> Self {
        Self {
            session_id,
            steps: initial_steps(),
            failure_reason: None,
            observers: Vec::new(),
            next_observer_id: 0,
        }
    }

    /// Create a tracker and apply `options` to the conditional steps.
    pub fn with_options(options: &DeploymentOptions) -> Self {
        let mut tracker = Self::new();
        tracker.configure(options);
        tracker
    }

    /// Session this tracker belongs to.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    // === Mutators ===

    /// Mark `step` as required.
    pub fn set_required(&mut self, step: StepName) {
        self.update_required(step, true);
    }

    /// Mark `step` as not required.
    pub fn set_not_required(&mut self, step: StepName) {
        self.update_required(step, false);
    }

    /// Mark `step` as successful.
    pub fn set_successful(&mut self, step: StepName) {
        self.update_successful(step, true);
    }

    /// Mark `step` as not successful.
    pub fn set_not_successful(&mut self, step: StepName) {
        self.update_successful(step, false);
    }

    /// Mark the step named `name` as required.
    pub fn set_required_by_name(&mut self, name: &str) -> Result<()> {
        self.set_required(name.parse()?);
        Ok(())
    }

    /// Mark the step named `name` as not required.
    pub fn set_not_required_by_name(&mut self, name: &str) -> Result<()> {
        self.set_not_required(name.parse()?);
        Ok(())
    }

    /// Mark the step named `name` as successful.
    pub fn set_successful_by_name(&mut self, name: &str) -> Result<()> {
        self.set_successful(name.parse()?);
        Ok(())
    }

    /// Mark the step named `name` as not successful.
    pub fn set_not_successful_by_name(&mut self, name: &str) -> Result<()> {
        self.set_not_successful(name.parse()?);
        Ok(())
    }

    /// Overwrite the failure reason. An empty string clears it.
    ///
    /// Only one reason is retained: if several steps fail before the reason
    /// is read, earlier reasons are lost.
    pub fn set_failure_reason(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        let reason = if reason.is_empty() { None } else { Some(reason) };
        self.update_failure_reason(reason);
    }

    /// Clear the failure reason.
    pub fn clear_failure_reason(&mut self) {
        self.update_failure_reason(None);
    }

    /// Apply configuration choices to the conditional steps.
    pub fn configure(&mut self, options: &DeploymentOptions) {
        for step in StepName::ALL.into_iter().filter(|s| s.is_conditional()) {
            self.update_required(step, options.requires(step));
        }
    }

    /// Return every step and the failure reason to construction state.
    pub fn reset(&mut self) {
        let initial = initial_steps();
        if self.steps == initial && self.failure_reason.is_none() {
            return;
        }

        let was_finished = self.deployment_has_finished();
        self.steps = initial;
        self.failure_reason = None;
        debug!("Session {} reset", self.session_id);
        self.emit(Change::Reset, was_finished);
    }

    // === Derived queries ===

    /// Whether every required step is successful.
    ///
    /// Steps that are not required are ignored whatever their successful flag.
    pub fn deployment_has_finished(&self) -> bool {
        self.steps.values().all(|s| !s.required || s.successful)
    }

    /// The earliest step, in declaration order, that is required and not
    /// yet successful. `None` when nothing is pending.
    pub fn next_pending_transaction(&self) -> Option<StepName> {
        self.steps
            .iter()
            .find(|(_, state)| state.is_pending())
            .map(|(step, _)| *step)
    }

    /// Wire name of the next pending step, or `""` when nothing is pending.
    pub fn next_pending_name(&self) -> &'static str {
        self.next_pending_transaction()
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    // === Accessors ===

    /// Flags of `step`.
    pub fn state(&self, step: StepName) -> StepState {
        self.steps[&step]
    }

    /// Whether `step` is required.
    pub fn is_required(&self, step: StepName) -> bool {
        self.state(step).required
    }

    /// Whether `step` is successful.
    pub fn is_successful(&self, step: StepName) -> bool {
        self.state(step).successful
    }

    /// Most recent failure reason.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// All steps with their flags, in declaration order.
    pub fn steps(&self) -> impl Iterator<Item = (StepName, StepState)> + '_ {
        self.steps.iter().map(|(step, state)| (*step, *state))
    }

    /// Required steps that are not yet successful, in declaration order.
    pub fn pending_steps(&self) -> Vec<StepName> {
        self.steps()
            .filter(|(_, state)| state.is_pending())
            .map(|(step, _)| step)
            .collect()
    }

    /// Number of required steps.
    pub fn required_count(&self) -> usize {
        self.steps.values().filter(|s| s.required).count()
    }

    /// Number of required steps that are successful.
    pub fn successful_required_count(&self) -> usize {
        self.steps
            .values()
            .filter(|s| s.required && s.successful)
            .count()
    }

    // === Observers ===

    /// Register an observer; it is called after every state change.
    pub fn subscribe(&mut self, observer: impl TrackerObserver + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    // === Snapshots ===

    /// Take a snapshot of the current state.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            session_id: self.session_id,
            timestamp: Utc::now(),
            steps: self
                .steps()
                .map(|(step, state)| StepEntry {
                    name: step.as_str().to_string(),
                    required: state.required,
                    successful: state.successful,
                })
                .collect(),
            failure_reason: self.failure_reason.clone(),
            finished: self.deployment_has_finished(),
            next_pending: self.next_pending_name().to_string(),
        }
    }

    /// Rebuild a tracker from a snapshot.
    ///
    /// The snapshot must list every known step exactly once. Its derived
    /// fields are ignored and recomputed from the flags.
    pub fn from_snapshot(snapshot: &ProgressSnapshot) -> Result<Self> {
        let mut restored: IndexMap<StepName, StepState> = IndexMap::new();
        for entry in &snapshot.steps {
            let step: StepName = entry.name.parse()?;
            if restored.insert(step, entry.state()).is_some() {
                return Err(TrackerError::InvalidSnapshot(format!(
                    "step {} listed more than once",
                    step
                )));
            }
        }

        let mut steps = IndexMap::with_capacity(StepName::ALL.len());
        for step in StepName::ALL {
            let state = restored.get(&step).copied().ok_or_else(|| {
                TrackerError::InvalidSnapshot(format!("step {} is missing", step))
            })?;
            steps.insert(step, state);
        }

        let mut tracker = Self::with_session(snapshot.session_id);
        tracker.steps = steps;
        tracker.failure_reason = snapshot.failure_reason.clone().filter(|r| !r.is_empty());
        Ok(tracker)
    }

    fn update_required(&mut self, step: StepName, required: bool) {
        let was_finished = self.deployment_has_finished();
        let state = &mut self.steps[&step];
        if state.required == required {
            return;
        }
        state.required = required;
        debug!("Step {} required = {}", step, required);
        self.emit(Change::RequiredChanged { step, required }, was_finished);
    }

    fn update_successful(&mut self, step: StepName, successful: bool) {
        let was_finished = self.deployment_has_finished();
        let state = &mut self.steps[&step];
        if state.successful == successful {
            return;
        }
        state.successful = successful;
        debug!("Step {} successful = {}", step, successful);
        self.emit(Change::SuccessChanged { step, successful }, was_finished);
    }

    fn update_failure_reason(&mut self, reason: Option<String>) {
        if self.failure_reason == reason {
            return;
        }
        debug!("Failure reason = {:?}", reason);
        self.failure_reason = reason.clone();
        let was_finished = self.deployment_has_finished();
        self.emit(Change::FailureReasonChanged { reason }, was_finished);
    }

    fn emit(&self, change: Change, was_finished: bool) {
        if !was_finished && self.deployment_has_finished() {
            info!("Deployment {} finished", self.session_id);
        }

        let event = TrackerEvent::new(self.session_id, change);
        for (_, observer) in &self.observers {
            observer.on_event(&event, self);
        }
    }
}

impl Default for DeploymentProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DeploymentProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentProgressTracker")
            .field("session_id", &self.session_id)
            .field("steps", &self.steps)
            .field("failure_reason", &self.failure_reason)
            .field("observers", &self.observers.len())
            .finish()
    }
}

fn initial_steps() -> IndexMap<StepName, StepState> {
    StepName::ALL
        .into_iter()
        .map(|step| (step, StepState::pending()))
        .collect()
}
