use std::collections::{BTreeSet, HashMap};

use super::{strings, DedupPass, PassOutcome};
use crate::types::{Command, Plan};

/// Collapses repeated read-only queries to their last occurrence.
#[derive(Debug, Clone)]
pub struct ReadOnlyPass {
    verbs: Vec<String>,
    /// Flags naming the queried target, highest priority first
    target_flags: Vec<String>,
}

impl ReadOnlyPass {
    pub const NAME: &'static str = "read_only";

    pub fn new(verbs: Vec<String>, target_flags: Vec<String>) -> Self {
        Self {
            verbs,
            target_flags,
        }
    }

    fn is_read_only(&self, command: &Command) -> bool {
        command.produces.is_empty()
            && command.wait_for.is_none()
            && command.operation().is_some_and(|op| {
                let op = op.to_ascii_lowercase();
                self.verbs.iter().any(|verb| op.starts_with(verb.as_str()))
            })
    }

    fn group_key(&self, command: &Command) -> (String, String, String) {
        let target = self
            .target_flags
            .iter()
            .find_map(|flag| command.flag_value(flag))
            .unwrap_or_default();
        (
            command.service().unwrap_or_default().to_ascii_lowercase(),
            command.operation().unwrap_or_default().to_ascii_lowercase(),
            target.to_string(),
        )
    }
}

impl Default for ReadOnlyPass {
    fn default() -> Self {
        Self::new(
            strings(&["describe-", "get-", "list-"]),
            strings(&[
                "--command-id",
                "--instance-ids",
                "--instance-id",
                "--id",
                "--distribution-id",
                "--name",
                "--names",
                "--document-name",
                "--function-name",
                "--bucket",
                "--cluster",
                "--stack-name",
                "--group-ids",
                "--vpc-ids",
                "--load-balancer-arn",
                "--target-group-arn",
                "--repository-name",
                "--log-group-name",
            ]),
        )
    }
}

impl DedupPass for ReadOnlyPass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, plan: &Plan) -> PassOutcome {
        let queries: Vec<(usize, (String, String, String))> = plan
            .commands
            .iter()
            .enumerate()
            .filter(|(_, cmd)| self.is_read_only(cmd))
            .map(|(idx, cmd)| (idx, self.group_key(cmd)))
            .collect();

        let mut last: HashMap<&(String, String, String), usize> = HashMap::new();
        for (idx, key) in &queries {
            last.insert(key, *idx);
        }
        let dropped: BTreeSet<usize> = queries
            .iter()
            .filter(|(idx, key)| last.get(key) != Some(idx))
            .map(|(idx, _)| *idx)
            .collect();
        PassOutcome::dropping(plan, &dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::test_support::assert_idempotent;
    use crate::types::WaitFor;

    #[test]
    fn test_repeated_queries_keep_last() {
        let status_a = Command::new(["ec2", "describe-instance-status", "--instance-ids", "i-1"]);
        let status_b = Command::new([
            "ec2",
            "describe-instance-status",
            "--instance-ids",
            "i-1",
            "--output",
            "table",
        ]);
        let other_target =
            Command::new(["ec2", "describe-instance-status", "--instance-ids", "i-2"]);
        let mutate = Command::new(["ec2", "start-instances", "--instance-ids", "i-1"]);
        let plan = Plan::new(vec![
            status_a,
            mutate.clone(),
            other_target.clone(),
            status_b.clone(),
        ]);

        let outcome = ReadOnlyPass::default().apply(&plan);
        assert_eq!(outcome.plan.commands, vec![mutate, other_target, status_b]);
        assert_eq!(outcome.removed, 1);
        assert_idempotent(&ReadOnlyPass::default(), &plan);
    }

    #[test]
    fn test_producing_or_waiting_queries_are_not_read_only() {
        let producing = Command::new(["ec2", "describe-vpcs"]).with_produces("VPC_ID", "VpcId");
        let waiting = Command::new(["ec2", "describe-vpcs"])
            .with_wait_for(WaitFor::new("vpc-1", "vpc-available"));
        let plan = Plan::new(vec![
            producing.clone(),
            producing,
            waiting.clone(),
            waiting,
        ]);
        assert_eq!(ReadOnlyPass::default().apply(&plan).removed, 0);
    }

    #[test]
    fn test_untargeted_queries_group_together() {
        let plan = Plan::new(vec![
            Command::new(["s3api", "list-buckets"]),
            Command::new(["s3api", "list-buckets", "--query", "Buckets[].Name"]),
        ]);
        let outcome = ReadOnlyPass::default().apply(&plan);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.plan.commands[0].args.len(), 4);
    }
}
