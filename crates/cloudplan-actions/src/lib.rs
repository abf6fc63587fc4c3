//! # Cloudplan Actions
//!
//! Concrete collaborators for the cloudplan executor:
//! - `ProcessCommandRunner` runs each command as a child process of a
//!   configured CLI program
//! - `CommandWaitProbe` observes wait conditions by running a probe command

mod probe;
mod process;

pub use probe::CommandWaitProbe;
pub use process::ProcessCommandRunner;

// Re-export core collaborator traits
pub use cloudplan_core::runner::{CommandRunner, RunContext, RunnerError, WaitProbe};
