//! Intent classification of recovered scripts
//!
//! Classification is a table of rule layers evaluated top to bottom. Each
//! layer names substring gates over the lower-cased script and an ordered
//! list of rules; the first rule whose gates hold wins. Unmatched scripts
//! have no category and must never be removed on intent grounds.

pub mod rules;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Named substring test; active when any marker occurs in the script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    pub name: String,
    pub any_of: Vec<String>,
}

impl Gate {
    pub fn new(name: impl Into<String>, markers: &[&str]) -> Self {
        Self {
            name: name.into(),
            any_of: markers.iter().map(|m| m.to_ascii_lowercase()).collect(),
        }
    }

    fn is_active(&self, lowered: &str) -> bool {
        self.any_of
            .iter()
            .any(|marker| lowered.contains(&marker.to_ascii_lowercase()))
    }
}

/// Category selected when every `all_of` gate is active and no `none_of` gate is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRule {
    pub category: String,
    #[serde(default)]
    pub all_of: Vec<String>,
    #[serde(default)]
    pub none_of: Vec<String>,
}

impl IntentRule {
    pub fn new(category: impl Into<String>, all_of: &[&str], none_of: &[&str]) -> Self {
        Self {
            category: category.into(),
            all_of: all_of.iter().map(ToString::to_string).collect(),
            none_of: none_of.iter().map(ToString::to_string).collect(),
        }
    }

    fn matches(&self, active: &BTreeSet<&str>) -> bool {
        !self.all_of.is_empty()
            && self.all_of.iter().all(|g| active.contains(g.as_str()))
            && !self.none_of.iter().any(|g| active.contains(g.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleLayer {
    pub name: String,
    #[serde(default)]
    pub gates: Vec<Gate>,
    #[serde(default)]
    pub rules: Vec<IntentRule>,
}

impl RuleLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gates: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gates.push(gate);
        self
    }

    pub fn with_rule(mut self, rule: IntentRule) -> Self {
        self.rules.push(rule);
        self
    }

    fn classify(&self, lowered: &str) -> Option<&str> {
        let active: BTreeSet<&str> = self
            .gates
            .iter()
            .filter(|gate| gate.is_active(lowered))
            .map(|gate| gate.name.as_str())
            .collect();
        if active.is_empty() {
            return None;
        }
        self.rules
            .iter()
            .find(|rule| rule.matches(&active))
            .map(|rule| rule.category.as_str())
    }
}

/// Ordered rule layers, domain-specific first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    pub layers: Vec<RuleLayer>,
}

impl RuleTable {
    pub fn new(layers: Vec<RuleLayer>) -> Self {
        Self { layers }
    }

    /// Put `layer` ahead of every existing layer.
    pub fn with_priority_layer(mut self, layer: RuleLayer) -> Self {
        self.layers.insert(0, layer);
        self
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new(vec![rules::domain_layer(), rules::generic_layer()])
    }
}

/// Maps scripts to intent categories.
#[derive(Debug, Clone, Default)]
pub struct IntentClassifier {
    table: RuleTable,
}

impl IntentClassifier {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    /// Category of `script`, or `None` when no rule matches.
    pub fn classify(&self, script: &str) -> Option<&str> {
        if script.trim().is_empty() {
            return None;
        }
        let lowered = script.to_ascii_lowercase();
        self.table
            .layers
            .iter()
            .find_map(|layer| layer.classify(&lowered))
    }
}
