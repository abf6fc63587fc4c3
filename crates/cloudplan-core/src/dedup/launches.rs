use std::collections::BTreeSet;

use super::{operation_in, producer_before, strings, DedupPass, PassOutcome};
use crate::types::{Command, Plan};

/// Keeps only the last resource launch and prunes the lifecycle of earlier ones.
#[derive(Debug, Clone)]
pub struct LaunchCyclePass {
    service: String,
    operation: String,
    lifecycle_operations: Vec<String>,
}

/// Produced keys that identify a launched instance.
///
/// Substring heuristic: the key mentions both `INSTANCE` and `ID`. Unrelated
/// keys with the same substrings match too.
pub fn identifier_keys(command: &Command) -> Vec<&str> {
    command
        .produces
        .keys()
        .map(String::as_str)
        .filter(|key| {
            let upper = key.to_ascii_uppercase();
            upper.contains("INSTANCE") && upper.contains("ID")
        })
        .collect()
}

impl LaunchCyclePass {
    pub const NAME: &'static str = "launch_cycles";

    pub fn new(service: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            operation: operation.into(),
            lifecycle_operations: strings(&[
                "terminate-instances",
                "wait",
                "describe-instance-status",
                "register-targets",
                "deregister-targets",
                "describe-target-health",
            ]),
        }
    }
}

impl Default for LaunchCyclePass {
    fn default() -> Self {
        Self::new("ec2", "run-instances")
    }
}

impl DedupPass for LaunchCyclePass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, plan: &Plan) -> PassOutcome {
        let launches: Vec<usize> = plan
            .commands
            .iter()
            .enumerate()
            .filter(|(_, cmd)| cmd.is_shape(&self.service, &self.operation))
            .map(|(idx, _)| idx)
            .collect();
        let Some((_, superseded)) = launches.split_last() else {
            return PassOutcome::unchanged(plan);
        };
        if superseded.is_empty() {
            return PassOutcome::unchanged(plan);
        }

        let mut dropped: BTreeSet<usize> = superseded.iter().copied().collect();
        for &launch in superseded {
            let keys = identifier_keys(&plan.commands[launch]);
            for (idx, cmd) in plan.commands.iter().enumerate().skip(launch + 1) {
                if dropped.contains(&idx) || !operation_in(cmd, &self.lifecycle_operations) {
                    continue;
                }
                // a lifecycle step belongs to the latest launch before it that produced the key
                let owned = keys.iter().any(|key| {
                    cmd.references(key) && producer_before(plan, key, idx) == Some(launch)
                });
                if owned {
                    dropped.insert(idx);
                }
            }
        }

        tracing::debug!(
            pass = Self::NAME,
            launches = launches.len(),
            dropped = dropped.len(),
            "superseded launch cycles"
        );
        PassOutcome::dropping(plan, &dropped)
    }
}
