use std::collections::{BTreeMap, BTreeSet};

use super::{operation_in, producer_before, strings, DedupPass, PassOutcome};
use crate::classify::IntentClassifier;
use crate::script::ScriptExtractor;
use crate::types::{Command, Plan};

/// Prunes superseded define/execute/delete cycles of remote-execution documents.
///
/// Documents are grouped by classified intent. When one intent is served by
/// several document names, only the document defined last survives; the
/// cycles of the others are dropped together with any later wait/inspect
/// command that consumes a value only their execute step produced.
#[derive(Debug, Clone)]
pub struct DocumentCyclePass {
    service: String,
    define_operation: String,
    execute_operation: String,
    delete_operation: String,
    name_flag: String,
    document_flag: String,
    inspect_operations: Vec<String>,
    extractor: ScriptExtractor,
    classifier: IntentClassifier,
}

#[derive(Debug)]
struct DocumentInfo {
    last_define: usize,
    intent: Option<String>,
}

impl DocumentCyclePass {
    pub const NAME: &'static str = "document_cycles";

    pub fn new(classifier: IntentClassifier) -> Self {
        Self {
            service: "ssm".to_string(),
            define_operation: "create-document".to_string(),
            execute_operation: "send-command".to_string(),
            delete_operation: "delete-document".to_string(),
            name_flag: "--name".to_string(),
            document_flag: "--document-name".to_string(),
            inspect_operations: strings(&[
                "wait",
                "get-command-invocation",
                "list-command-invocations",
            ]),
            extractor: ScriptExtractor::default(),
            classifier,
        }
    }

    pub fn with_extractor(mut self, extractor: ScriptExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    fn is_op(&self, command: &Command, operation: &str) -> bool {
        command.is_shape(&self.service, operation)
    }

    /// Document name this command defines, executes or deletes.
    fn document_of<'a>(&self, command: &'a Command) -> Option<&'a str> {
        let name = if self.is_op(command, &self.define_operation)
            || self.is_op(command, &self.delete_operation)
        {
            command.flag_value(&self.name_flag)
        } else if self.is_op(command, &self.execute_operation) {
            command.flag_value(&self.document_flag)
        } else {
            None
        }?;
        let name = name.trim();
        (!name.is_empty()).then_some(name)
    }

    fn documents<'a>(&self, plan: &'a Plan) -> BTreeMap<&'a str, DocumentInfo> {
        let mut documents = BTreeMap::new();
        for (idx, cmd) in plan.commands.iter().enumerate() {
            if !self.is_op(cmd, &self.define_operation) {
                continue;
            }
            let Some(name) = self.document_of(cmd) else {
                continue;
            };
            let script = self.extractor.extract(cmd);
            let intent = self.classifier.classify(&script).map(ToString::to_string);
            documents.insert(
                name,
                DocumentInfo {
                    last_define: idx,
                    intent,
                },
            );
        }
        documents
    }

    fn superseded<'a>(&self, documents: &BTreeMap<&'a str, DocumentInfo>) -> BTreeSet<&'a str> {
        let mut by_intent: BTreeMap<&str, Vec<(&'a str, usize)>> = BTreeMap::new();
        for (name, info) in documents {
            if let Some(intent) = info.intent.as_deref() {
                by_intent
                    .entry(intent)
                    .or_default()
                    .push((*name, info.last_define));
            }
        }

        let mut superseded = BTreeSet::new();
        for names in by_intent.values().filter(|names| names.len() > 1) {
            let Some(&(winner, _)) = names.iter().max_by_key(|(_, define_idx)| *define_idx) else {
                continue;
            };
            superseded.extend(
                names
                    .iter()
                    .map(|(name, _)| *name)
                    .filter(|name| *name != winner),
            );
        }
        superseded
    }
}

impl Default for DocumentCyclePass {
    fn default() -> Self {
        Self::new(IntentClassifier::default())
    }
}

impl DedupPass for DocumentCyclePass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, plan: &Plan) -> PassOutcome {
        let documents = self.documents(plan);
        let superseded = self.superseded(&documents);
        if superseded.is_empty() {
            return PassOutcome::unchanged(plan);
        }

        let mut dropped = BTreeSet::new();
        let mut dropped_executes = BTreeSet::new();
        for (idx, cmd) in plan.commands.iter().enumerate() {
            if self
                .document_of(cmd)
                .is_some_and(|name| superseded.contains(name))
            {
                dropped.insert(idx);
                if self.is_op(cmd, &self.execute_operation) {
                    dropped_executes.insert(idx);
                }
            }
        }

        for (idx, cmd) in plan.commands.iter().enumerate() {
            if dropped.contains(&idx) || !operation_in(cmd, &self.inspect_operations) {
                continue;
            }
            let consumes_dropped = cmd.placeholders().into_iter().any(|key| {
                cmd.references(key)
                    && producer_before(plan, key, idx)
                        .is_some_and(|owner| dropped_executes.contains(&owner))
            });
            if consumes_dropped {
                dropped.insert(idx);
            }
        }

        tracing::debug!(
            pass = Self::NAME,
            superseded = ?superseded,
            dropped = dropped.len(),
            "superseded document cycles"
        );
        PassOutcome::dropping(plan, &dropped)
    }
}
