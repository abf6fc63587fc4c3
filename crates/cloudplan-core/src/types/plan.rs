//! Plan type definition

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::command::Command;

/// An ordered sequence of commands.
///
/// Order is both execution order and value-dependency order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "PlanRepr")]
pub struct Plan {
    pub commands: Vec<Command>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlanRepr {
    Bare(Vec<Command>),
    Wrapped {
        #[serde(alias = "Commands")]
        commands: Vec<Command>,
    },
}

impl From<PlanRepr> for Plan {
    fn from(repr: PlanRepr) -> Self {
        match repr {
            PlanRepr::Bare(commands) | PlanRepr::Wrapped { commands } => Self { commands },
        }
    }
}

impl Plan {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether any command declares `key`.
    pub fn produces(&self, key: &str) -> bool {
        self.commands.iter().any(|cmd| cmd.produces.contains_key(key))
    }

    /// Keep commands whose index is not in `dropped`, preserving order.
    pub fn without(&self, dropped: &BTreeSet<usize>) -> Plan {
        Plan::new(
            self.commands
                .iter()
                .enumerate()
                .filter(|(idx, _)| !dropped.contains(idx))
                .map(|(_, cmd)| cmd.clone())
                .collect(),
        )
    }
}

impl From<Vec<Command>> for Plan {
    fn from(commands: Vec<Command>) -> Self {
        Self::new(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_deserializes_bare_and_wrapped() {
        let bare: Plan = serde_json::from_value(json!([{"args": ["s3", "ls"]}])).expect("bare");
        let wrapped: Plan =
            serde_json::from_value(json!({"commands": [{"args": ["s3", "ls"]}]})).expect("wrapped");
        assert_eq!(bare, wrapped);
        assert_eq!(bare.len(), 1);
    }

    #[test]
    fn test_without_preserves_order() {
        let plan = Plan::new(vec![
            Command::new(["a"]),
            Command::new(["b"]),
            Command::new(["c"]),
        ]);
        let kept = plan.without(&BTreeSet::from([1]));
        assert_eq!(kept.commands, vec![Command::new(["a"]), Command::new(["c"])]);
    }
}
