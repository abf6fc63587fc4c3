//! Execution collaborators
//!
//! The executor depends on narrow capabilities only:
//! - CommandRunner: run one command and return its output
//! - WaitProbe: observe whether a completion condition holds
//! - RemoteSession: connect/run/close for remote-bootstrap scenarios
//!
//! Concrete backends (process wrappers around cloud CLIs, SSH sessions)
//! are supplied by the caller.

mod context;
mod session;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::WaitFor;

pub use context::RunContext;
pub use session::{shell_join, RemoteSession, SessionRunner};

// Re-export CancellationToken for convenience
pub use tokio_util::sync::CancellationToken;

/// Collaborator errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunnerError {
    #[error("failed to start command: {0}")]
    Spawn(String),

    #[error("command exited with status {status}: {stderr}")]
    NonZeroExit { status: String, stderr: String },

    #[error("command timed out after {0} ms")]
    Timeout(u64),

    #[error("session error: {0}")]
    Session(String),

    #[error("{0}")]
    Other(String),
}

impl RunnerError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Runs one already-substituted command.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Execute `args` and return the command's output
    async fn run(&self, ctx: &RunContext, args: &[String]) -> Result<String, RunnerError>;
}

/// Observes a completion condition.
#[async_trait]
pub trait WaitProbe: Send + Sync {
    /// Whether the condition currently holds; errors count as "not yet".
    async fn observe(&self, ctx: &RunContext, wait: &WaitFor) -> Result<bool, RunnerError>;
}
