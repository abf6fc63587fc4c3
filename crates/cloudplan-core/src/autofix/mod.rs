//! Invariant autofix
//!
//! Fixers repair plans after dedup by filling gaps only: they add missing
//! `produces` mappings and missing completion steps, never overwrite an
//! existing mapping and never remove a command.

mod distribution;

use crate::types::Plan;

pub use distribution::DistributionFixer;

/// Plan fixer trait
pub trait PlanFixer: Send + Sync {
    /// Stable fixer name (used in reports)
    fn name(&self) -> &'static str;

    /// Repair `plan` in place; returns the number of repairs applied.
    fn fix(&self, plan: &mut Plan) -> usize;
}
