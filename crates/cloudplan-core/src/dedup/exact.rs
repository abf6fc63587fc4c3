use std::collections::{BTreeSet, HashSet};

use super::{DedupPass, PassOutcome};
use crate::types::{Command, Plan};

/// Joins signature tokens; never appears in ordinary arguments.
const SIGNATURE_SEPARATOR: &str = "\u{1f}";

/// Drops later commands whose non-blank tokens equal an earlier command's.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactDuplicatePass;

impl ExactDuplicatePass {
    pub const NAME: &'static str = "exact_duplicates";
}

/// Signature of a command, `None` when it has no non-blank token.
fn signature(command: &Command) -> Option<String> {
    let tokens: Vec<&str> = command
        .args
        .iter()
        .map(String::as_str)
        .filter(|token| !token.trim().is_empty())
        .collect();
    if tokens.is_empty() {
        return None;
    }
    Some(tokens.join(SIGNATURE_SEPARATOR))
}

impl DedupPass for ExactDuplicatePass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, plan: &Plan) -> PassOutcome {
        let mut seen = HashSet::new();
        let dropped: BTreeSet<usize> = plan
            .commands
            .iter()
            .enumerate()
            .filter_map(|(idx, cmd)| {
                let sig = signature(cmd)?;
                (!seen.insert(sig)).then_some(idx)
            })
            .collect();
        PassOutcome::dropping(plan, &dropped)
    }
}
