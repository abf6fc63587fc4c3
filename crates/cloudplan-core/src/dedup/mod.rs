//! Dedup passes
//!
//! Each pass is an independent, order-preserving filter over a Plan:
//! - It never reorders commands
//! - It is idempotent: applying it to its own output removes nothing
//! - It is total: commands it cannot parse or classify are kept

mod documents;
mod exact;
mod intent;
mod launches;
mod orphans;
mod read_only;

use std::collections::BTreeSet;

use crate::types::{Command, Plan};

pub use documents::DocumentCyclePass;
pub use exact::ExactDuplicatePass;
pub use intent::SemanticIntentPass;
pub use launches::{identifier_keys, LaunchCyclePass};
pub use orphans::OrphanPass;
pub use read_only::ReadOnlyPass;

/// Result of one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutcome {
    pub plan: Plan,
    pub removed: usize,
}

impl PassOutcome {
    fn unchanged(plan: &Plan) -> Self {
        Self {
            plan: plan.clone(),
            removed: 0,
        }
    }

    fn dropping(plan: &Plan, dropped: &BTreeSet<usize>) -> Self {
        Self {
            plan: plan.without(dropped),
            removed: dropped.len(),
        }
    }
}

/// One dedup pass over a plan.
pub trait DedupPass: Send + Sync {
    /// Stable pass name (used in config and reports)
    fn name(&self) -> &'static str;

    /// Build the pruned plan; the input is never modified.
    fn apply(&self, plan: &Plan) -> PassOutcome;
}

/// Names of the built-in passes in their default order.
pub const DEFAULT_PASS_ORDER: [&str; 6] = [
    ExactDuplicatePass::NAME,
    SemanticIntentPass::NAME,
    DocumentCyclePass::NAME,
    LaunchCyclePass::NAME,
    ReadOnlyPass::NAME,
    OrphanPass::NAME,
];

/// Index of the latest command before `before` that declares `key`.
fn producer_before(plan: &Plan, key: &str, before: usize) -> Option<usize> {
    plan.commands[..before.min(plan.len())]
        .iter()
        .rposition(|cmd| cmd.produces.contains_key(key))
}

fn operation_in(command: &Command, operations: &[String]) -> bool {
    command
        .operation()
        .is_some_and(|op| operations.iter().any(|known| known.eq_ignore_ascii_case(op)))
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}
