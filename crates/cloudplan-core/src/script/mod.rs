//! Script extraction from remote-execution parameters
//!
//! Planners encode the shell script of a remote-execution command in several
//! ad-hoc ways. Extraction tries them in a fixed priority order and yields an
//! empty string whenever it cannot be sure.

mod quotes;

use serde_json::{Map, Value};

use crate::types::Command;

pub use quotes::normalize_single_quotes;

const SHORTHAND_PREFIX: &str = "commands=";
const SCRIPT_KEYS: [&str; 2] = ["commands", "runCommand"];

/// Recovers embedded scripts from a command's args.
#[derive(Debug, Clone)]
pub struct ScriptExtractor {
    /// Flags whose values may carry a script, tried in order
    flags: Vec<String>,
}

impl ScriptExtractor {
    pub fn new(flags: Vec<String>) -> Self {
        Self { flags }
    }

    /// Newline-joined script, or empty if none can be recovered.
    pub fn extract(&self, command: &Command) -> String {
        for flag in &self.flags {
            if let Some(value) = command.flag_value(flag) {
                let script = extract_script(value);
                if !script.is_empty() {
                    return script;
                }
            }
        }
        String::new()
    }
}

impl Default for ScriptExtractor {
    fn default() -> Self {
        Self::new(vec!["--parameters".to_string(), "--content".to_string()])
    }
}

/// Extract a script from one parameter value.
pub fn extract_script(raw: &str) -> String {
    let value = strip_outer_quotes(raw.trim());

    // 1 + 2: JSON object with commands, or bare JSON array
    match serde_json::from_str::<Value>(value) {
        Ok(Value::Object(map)) => {
            if let Some(lines) = script_from_object(&map) {
                return lines.join("\n");
            }
        }
        Ok(Value::Array(items)) => {
            if let Some(lines) = string_array(&items) {
                return lines.join("\n");
            }
        }
        _ => {}
    }

    // 3: commands= shorthand
    if let Some(rhs) = value.strip_prefix(SHORTHAND_PREFIX) {
        let rhs = rhs.trim();
        if rhs.starts_with('[') {
            if let Some(lines) = parse_string_array(rhs)
                .or_else(|| parse_string_array(&normalize_single_quotes(rhs)))
            {
                return lines.join("\n");
            }
        } else if !rhs.is_empty() && !is_quoted(rhs) && !rhs.starts_with('{') {
            return rhs.to_string();
        }
    }

    // 4: whole-value single-quoted object
    if value.starts_with('{') {
        if let Ok(Value::Object(map)) =
            serde_json::from_str::<Value>(&normalize_single_quotes(value))
        {
            if let Some(lines) = script_from_object(&map) {
                return lines.join("\n");
            }
        }
    }

    // 5: verbatim, unless it looks like something we failed to parse
    if looks_structured(value) {
        return String::new();
    }
    value.to_string()
}

fn strip_outer_quotes(value: &str) -> &str {
    if value.len() < 2 || !is_quoted(value) {
        return value;
    }
    let inner = value[1..value.len() - 1].trim();
    if looks_structured(inner) {
        inner
    } else {
        value
    }
}

fn is_quoted(value: &str) -> bool {
    let mut chars = value.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) => first == last && (first == '"' || first == '\''),
        _ => false,
    }
}

fn looks_structured(value: &str) -> bool {
    value.starts_with('{')
        || value.starts_with('[')
        || value
            .get(..SCRIPT_KEYS[0].len())
            .is_some_and(|head| head.eq_ignore_ascii_case(SCRIPT_KEYS[0]))
}

fn parse_string_array(raw: &str) -> Option<Vec<String>> {
    match serde_json::from_str::<Value>(raw).ok()? {
        Value::Array(items) => string_array(&items),
        _ => None,
    }
}

fn string_array(items: &[Value]) -> Option<Vec<String>> {
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| item.as_str().map(ToString::to_string))
        .collect()
}

/// `commands` at top level first, then a depth-first search for script keys.
fn script_from_object(map: &Map<String, Value>) -> Option<Vec<String>> {
    if let Some(Value::Array(items)) = map.get(SCRIPT_KEYS[0]) {
        if let Some(lines) = string_array(items) {
            return Some(lines);
        }
    }
    map.values().find_map(nested_script)
}

fn nested_script(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Object(map) => {
            for key in SCRIPT_KEYS {
                if let Some(Value::Array(items)) = map.get(key) {
                    if let Some(lines) = string_array(items) {
                        return Some(lines);
                    }
                }
            }
            map.values().find_map(nested_script)
        }
        Value::Array(items) => items.iter().find_map(nested_script),
        _ => None,
    }
}
