use std::collections::BTreeSet;

use super::{DedupPass, PassOutcome};
use crate::types::Plan;

/// Drops commands that reference a placeholder nothing before them produces.
///
/// Runs to a fixed point: dropping a command can orphan the keys it
/// declared. The dropped set only grows, so the loop runs at most
/// `plan.len() + 1` sweeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrphanPass;

impl OrphanPass {
    pub const NAME: &'static str = "orphans";

    /// Indices of commands referencing keys not produced by a kept command
    /// at or before them.
    fn sweep(plan: &Plan, dropped: &BTreeSet<usize>) -> Vec<usize> {
        let mut available: BTreeSet<&str> = BTreeSet::new();
        let mut orphaned = Vec::new();
        for (idx, cmd) in plan.commands.iter().enumerate() {
            if dropped.contains(&idx) {
                continue;
            }
            let own: BTreeSet<&str> = cmd.produces.keys().map(String::as_str).collect();
            let missing = cmd
                .placeholders()
                .into_iter()
                .find(|key| !available.contains(key) && !own.contains(key));
            match missing {
                Some(key) => {
                    tracing::debug!(
                        pass = Self::NAME,
                        index = idx,
                        placeholder = key,
                        "orphaned placeholder"
                    );
                    orphaned.push(idx);
                }
                None => available.extend(own),
            }
        }
        orphaned
    }
}

impl DedupPass for OrphanPass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, plan: &Plan) -> PassOutcome {
        let mut dropped = BTreeSet::new();
        for _ in 0..=plan.len() {
            let orphaned = Self::sweep(plan, &dropped);
            if orphaned.is_empty() {
                break;
            }
            dropped.extend(orphaned);
        }
        PassOutcome::dropping(plan, &dropped)
    }
}
