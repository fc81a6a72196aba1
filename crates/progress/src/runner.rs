//! Deployment runner - drives the tracker through the step sequence.

use crate::tracker::DeploymentProgressTracker;
use async_trait::async_trait;
use deploy_core::StepName;
use tracing::{debug, info, warn};

/// Failure reported by a step executor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct StepFailure {
    /// Human-readable description of what went wrong
    pub reason: String,
}

impl StepFailure {
    /// Create a new failure.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Performs the blockchain work behind a step (submit + await confirmation).
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Execute `step`, returning once its transaction is confirmed or has failed.
    async fn execute(&self, step: StepName) -> Result<(), StepFailure>;
}

/// Configuration for the runner.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Max steps executed per `run` call (None = until finished or failed)
    pub max_steps: Option<usize>,
}

/// Result of running one or more steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The step was executed and marked successful
    Executed(StepName),
    /// The step failed; the reason was recorded on the tracker
    Failed { step: StepName, reason: String },
    /// Nothing is pending
    Finished,
    /// `max_steps` was reached with steps still pending
    Paused,
}

/// Drives a tracker in declaration order:
/// ```text
/// Next pending → Execute → Mark successful | Record failure
/// ```
pub struct DeploymentRunner<E: StepExecutor> {
    tracker: DeploymentProgressTracker,
    executor: E,
    config: RunnerConfig,
    steps_run: usize,
}

impl<E: StepExecutor> DeploymentRunner<E> {
    /// Create a new runner.
    pub fn new(tracker: DeploymentProgressTracker, executor: E) -> Self {
        Self {
            tracker,
            executor,
            config: RunnerConfig::default(),
            steps_run: 0,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute the next pending step, if any.
    pub async fn run_next(&mut self) -> RunOutcome {
        let Some(step) = self.tracker.next_pending_transaction() else {
            return RunOutcome::Finished;
        };

        debug!(
            "Executing step {} ({}/{})",
            step,
            self.tracker.successful_required_count() + 1,
            self.tracker.required_count()
        );
        self.steps_run += 1;

        match self.executor.execute(step).await {
            Ok(()) => {
                self.tracker.set_successful(step);
                info!("Step {} confirmed", step);
                RunOutcome::Executed(step)
            }
            Err(failure) => {
                warn!("Step {} failed: {}", step, failure);
                self.tracker.set_failure_reason(failure.reason.clone());
                self.tracker.set_not_successful(step);
                RunOutcome::Failed {
                    step,
                    reason: failure.reason,
                }
            }
        }
    }

    /// Execute pending steps until the deployment finishes, a step fails,
    /// or `max_steps` is reached.
    pub async fn run(&mut self) -> RunOutcome {
        let mut executed = 0;
        loop {
            if self.tracker.deployment_has_finished() {
                info!("No pending steps left");
                return RunOutcome::Finished;
            }

            if let Some(max) = self.config.max_steps {
                if executed >= max {
                    info!("Reached max steps ({})", max);
                    return RunOutcome::Paused;
                }
            }

            match self.run_next().await {
                RunOutcome::Executed(_) => executed += 1,
                outcome => return outcome,
            }
        }
    }

    /// Prepare `step` to be attempted again after a failure.
    pub fn retry(&mut self, step: StepName) {
        debug!("Retrying step {}", step);
        self.tracker.set_not_successful(step);
        self.tracker.clear_failure_reason();
    }

    /// Steps attempted so far.
    pub fn steps_run(&self) -> usize {
        self.steps_run
    }

    /// Get a reference to the tracker.
    pub fn tracker(&self) -> &DeploymentProgressTracker {
        &self.tracker
    }

    /// Get a mutable reference to the tracker.
    pub fn tracker_mut(&mut self) -> &mut DeploymentProgressTracker {
        &mut self.tracker
    }

    /// Consume the runner, returning the tracker.
    pub fn into_tracker(self) -> DeploymentProgressTracker {
        self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deploy_core::DeploymentOptions;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockExecutor {
        failing: Mutex<HashSet<StepName>>,
        executed: Mutex<Vec<StepName>>,
    }

    impl MockExecutor {
        fn failing(steps: &[StepName]) -> Self {
            Self {
                failing: Mutex::new(steps.iter().copied().collect()),
                executed: Mutex::new(Vec::new()),
            }
        }

        fn heal(&self, step: StepName) {
            self.failing.lock().unwrap().remove(&step);
        }
    }

    #[async_trait]
    impl StepExecutor for MockExecutor {
        async fn execute(&self, step: StepName) -> Result<(), StepFailure> {
            self.executed.lock().unwrap().push(step);
            if self.failing.lock().unwrap().contains(&step) {
                return Err(StepFailure::new(format!("{} reverted", step)));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_run_to_completion() {
        let tracker = DeploymentProgressTracker::with_options(&DeploymentOptions {
            reserved_tokens: true,
            whitelist: false,
        });
        let mut runner = DeploymentRunner::new(tracker, MockExecutor::default());

        assert_eq!(runner.run().await, RunOutcome::Finished);
        assert!(runner.tracker().deployment_has_finished());
        assert_eq!(runner.steps_run(), 14);

        let executed = runner.executor.executed.lock().unwrap().clone();
        let expected: Vec<_> = StepName::ALL
            .into_iter()
            .filter(|s| *s != StepName::Whitelist)
            .collect();
        assert_eq!(executed, expected);
    }

    #[tokio::test]
    async fn test_run_stops_on_failure() {
        let executor = MockExecutor::failing(&[StepName::Crowdsale]);
        let mut runner = DeploymentRunner::new(DeploymentProgressTracker::new(), executor);

        let outcome = runner.run().await;
        assert_eq!(
            outcome,
            RunOutcome::Failed {
                step: StepName::Crowdsale,
                reason: "crowdsale reverted".to_string(),
            }
        );
        assert_eq!(runner.tracker().failure_reason(), Some("crowdsale reverted"));
        assert_eq!(
            runner.tracker().next_pending_transaction(),
            Some(StepName::Crowdsale)
        );
        assert_eq!(runner.steps_run(), 4);
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let executor = MockExecutor::failing(&[StepName::SetReleaseAgent]);
        let mut runner = DeploymentRunner::new(DeploymentProgressTracker::new(), executor);

        assert!(matches!(runner.run().await, RunOutcome::Failed { .. }));

        runner.executor.heal(StepName::SetReleaseAgent);
        runner.retry(StepName::SetReleaseAgent);
        assert_eq!(runner.tracker().failure_reason(), None);

        assert_eq!(runner.run().await, RunOutcome::Finished);
        let tracker = runner.into_tracker();
        assert!(tracker.deployment_has_finished());
    }

    #[tokio::test]
    async fn test_max_steps_pauses() {
        let mut runner = DeploymentRunner::new(
            DeploymentProgressTracker::new(),
            MockExecutor::default(),
        )
        .with_config(RunnerConfig { max_steps: Some(2) });

        assert_eq!(runner.run().await, RunOutcome::Paused);
        assert_eq!(
            runner.tracker().next_pending_transaction(),
            Some(StepName::PricingStrategy)
        );

        assert_eq!(runner.run_next().await, RunOutcome::Executed(StepName::PricingStrategy));
    }

    #[tokio::test]
    async fn test_run_next_when_finished() {
        let mut tracker = DeploymentProgressTracker::new();
        for step in StepName::ALL {
            tracker.set_not_required(step);
        }
        let mut runner = DeploymentRunner::new(tracker, MockExecutor::default());
        assert_eq!(runner.run_next().await, RunOutcome::Finished);
        assert_eq!(runner.steps_run(), 0);
    }
}
