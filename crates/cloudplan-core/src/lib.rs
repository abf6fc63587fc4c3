//! # Cloudplan Core
//!
//! Deterministic logic for turning machine-proposed cloud command plans into
//! something safe to run.
//!
//! This crate contains:
//! - Command / Plan / binding definitions
//! - Script extraction and intent classification
//! - Dedup passes, autofix and the normalizer that composes them
//! - The sequential, binding-aware executor and its collaborator traits
//!
//! This crate does NOT care about:
//! - Who produced the plan
//! - How commands actually reach a cloud provider
//! - How results are displayed

pub mod autofix;
pub mod classify;
pub mod dedup;
pub mod executor;
pub mod normalizer;
pub mod runner;
pub mod script;
pub mod types;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::autofix::{DistributionFixer, PlanFixer};
    pub use crate::classify::{Gate, IntentClassifier, IntentRule, RuleLayer, RuleTable};
    pub use crate::dedup::{
        DedupPass, DocumentCyclePass, ExactDuplicatePass, LaunchCyclePass, OrphanPass,
        PassOutcome, ReadOnlyPass, SemanticIntentPass, DEFAULT_PASS_ORDER,
    };
    pub use crate::executor::{
        ConnectionInfo, ExecError, ExecResult, ExecutionProgressEvent, ExecutionProgressReporter,
        ExecutionState, Executor,
    };
    pub use crate::normalizer::{
        NormalizeError, NormalizeReport, NormalizedPlan, PassLogger, PassSettings, PlanNormalizer,
    };
    pub use crate::runner::{
        CancellationToken, CommandRunner, RemoteSession, RunContext, RunnerError, SessionRunner,
        WaitProbe,
    };
    pub use crate::script::ScriptExtractor;
    pub use crate::types::{Bindings, Command, Plan, WaitFor};
}

// Re-export key types at crate root
pub use executor::{ExecResult, Executor};
pub use normalizer::{NormalizedPlan, PlanNormalizer};
pub use runner::{CommandRunner, WaitProbe};
pub use types::{Bindings, Command, Plan, WaitFor};
