//! Command type definitions
//!
//! A Command is one shell-like invocation proposed by the planner.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::placeholder::{placeholder, placeholder_keys};

/// Completion condition to wait for after a command succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WaitFor {
    /// Resource identifier to watch (may contain placeholders)
    #[serde(default, alias = "Resource")]
    pub resource: String,
    /// Condition name, e.g. "instance-running"
    #[serde(default, alias = "Condition")]
    pub condition: String,
    /// Hard timeout; zero means the executor default
    #[serde(default, alias = "Timeout", with = "super::duration")]
    pub timeout: Duration,
}

impl WaitFor {
    pub fn new(resource: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            condition: condition.into(),
            timeout: Duration::ZERO,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A single command in a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Command {
    /// Tokens, conventionally `[service, operation, ...flags]`
    #[serde(default, alias = "Args")]
    pub args: Vec<String>,
    /// Planner rationale
    #[serde(default, alias = "Reason")]
    pub reason: String,
    /// Declared outputs: key -> extraction expression
    #[serde(default, alias = "Produces")]
    pub produces: BTreeMap<String, String>,
    /// Optional completion condition
    #[serde(
        default,
        alias = "WaitFor",
        alias = "wait",
        skip_serializing_if = "Option::is_none"
    )]
    pub wait_for: Option<WaitFor>,
}

impl Command {
    /// Create a command from its tokens
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Declare one produced key
    pub fn with_produces(mut self, key: impl Into<String>, expression: impl Into<String>) -> Self {
        self.produces.insert(key.into(), expression.into());
        self
    }

    pub fn with_wait_for(mut self, wait_for: WaitFor) -> Self {
        self.wait_for = Some(wait_for);
        self
    }

    /// True when no token carries non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.args.iter().all(|arg| arg.trim().is_empty())
    }

    fn shape_tokens(&self) -> &[String] {
        match self.args.first() {
            Some(first) if first.eq_ignore_ascii_case("aws") => &self.args[1..],
            _ => &self.args,
        }
    }

    /// Service token (a leading `aws` is skipped).
    pub fn service(&self) -> Option<&str> {
        self.shape_tokens().first().map(|s| s.trim())
    }

    /// Operation token following the service.
    pub fn operation(&self) -> Option<&str> {
        self.shape_tokens().get(1).map(|s| s.trim())
    }

    /// Whether this command is `service operation ...`.
    pub fn is_shape(&self, service: &str, operation: &str) -> bool {
        self.service()
            .is_some_and(|s| s.eq_ignore_ascii_case(service))
            && self
                .operation()
                .is_some_and(|op| op.eq_ignore_ascii_case(operation))
    }

    /// Value of `--flag value` or `--flag=value`, first occurrence wins.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        let mut tokens = self.args.iter();
        while let Some(token) = tokens.next() {
            if token == flag {
                return tokens.next().map(String::as_str);
            }
            if let Some(value) = token
                .strip_prefix(flag)
                .and_then(|rest| rest.strip_prefix('='))
            {
                return Some(value);
            }
        }
        None
    }

    /// Placeholder keys referenced by args and the wait resource.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        let wait_resource = self.wait_for.iter().map(|w| w.resource.as_str());
        for text in self.args.iter().map(String::as_str).chain(wait_resource) {
            for key in placeholder_keys(text) {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Placeholder-substring match of `<key>` against the args.
    pub fn references(&self, key: &str) -> bool {
        let token = placeholder(key);
        self.args.iter().any(|arg| arg.contains(&token))
    }
}
