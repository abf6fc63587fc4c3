//! RunContext type definition

use tokio_util::sync::CancellationToken;

/// Per-command context handed to collaborators.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Execution run this command belongs to
    pub run_id: String,
    /// Position of the command in the plan
    pub step_index: usize,
    /// Planner rationale for the command
    pub reason: String,
    /// Cancellation token for cooperative cancellation
    pub cancellation_token: CancellationToken,
}

impl RunContext {
    pub fn new(
        run_id: impl Into<String>,
        step_index: usize,
        reason: impl Into<String>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            step_index,
            reason: reason.into(),
            cancellation_token,
        }
    }

    /// Check if the run has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// Get a future that completes when cancellation is requested
    pub async fn cancelled(&self) {
        self.cancellation_token.cancelled().await
    }
}
