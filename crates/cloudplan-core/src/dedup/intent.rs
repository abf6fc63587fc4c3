use std::collections::{BTreeSet, HashMap};

use super::{DedupPass, PassOutcome};
use crate::classify::IntentClassifier;
use crate::script::ScriptExtractor;
use crate::types::Plan;

/// Keeps only the last remote-execution send of each classified intent.
#[derive(Debug, Clone)]
pub struct SemanticIntentPass {
    service: String,
    operation: String,
    extractor: ScriptExtractor,
    classifier: IntentClassifier,
}

impl SemanticIntentPass {
    pub const NAME: &'static str = "semantic_intent";

    pub fn new(classifier: IntentClassifier) -> Self {
        Self {
            service: "ssm".to_string(),
            operation: "send-command".to_string(),
            extractor: ScriptExtractor::default(),
            classifier,
        }
    }

    /// Restrict the pass to `service operation` commands.
    pub fn with_shape(mut self, service: impl Into<String>, operation: impl Into<String>) -> Self {
        self.service = service.into();
        self.operation = operation.into();
        self
    }

    pub fn with_extractor(mut self, extractor: ScriptExtractor) -> Self {
        self.extractor = extractor;
        self
    }
}

impl Default for SemanticIntentPass {
    fn default() -> Self {
        Self::new(IntentClassifier::default())
    }
}

impl DedupPass for SemanticIntentPass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, plan: &Plan) -> PassOutcome {
        let classified: Vec<(usize, String)> = plan
            .commands
            .iter()
            .enumerate()
            .filter(|(_, cmd)| cmd.is_shape(&self.service, &self.operation))
            .filter_map(|(idx, cmd)| {
                let script = self.extractor.extract(cmd);
                let category = self.classifier.classify(&script)?;
                Some((idx, category.to_string()))
            })
            .collect();

        let mut last: HashMap<&str, usize> = HashMap::new();
        for (idx, category) in &classified {
            last.insert(category.as_str(), *idx);
        }

        let dropped: BTreeSet<usize> = classified
            .iter()
            .filter(|(idx, category)| last.get(category.as_str()) != Some(idx))
            .map(|(idx, _)| *idx)
            .collect();
        if dropped.is_empty() {
            return PassOutcome::unchanged(plan);
        }
        tracing::debug!(
            pass = Self::NAME,
            dropped = ?dropped,
            "superseded same-intent sends"
        );
        PassOutcome::dropping(plan, &dropped)
    }
}
