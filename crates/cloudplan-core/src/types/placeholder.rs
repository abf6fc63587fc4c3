//! Placeholder syntax shared with the planner.
//!
//! A placeholder is `<` + one uppercase letter + uppercase letters, digits or
//! underscores + `>`. Any other bracketed text is literal.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Resolved key -> value table built during one execution.
pub type Bindings = BTreeMap<String, String>;

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
static KEY_RE: OnceLock<Regex> = OnceLock::new();

fn placeholder_re() -> &'static Regex {
    PLACEHOLDER_RE.get_or_init(|| {
        Regex::new(r"<([A-Z][A-Z0-9_]*)>").expect("placeholder pattern is valid")
    })
}

/// Whether `key` is a valid placeholder key (without the brackets).
pub fn is_placeholder_key(key: &str) -> bool {
    KEY_RE
        .get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("key pattern is valid"))
        .is_match(key)
}

/// Format a key as its placeholder token.
pub fn placeholder(key: &str) -> String {
    format!("<{}>", key)
}

/// Keys of all placeholders in `text`, in order of appearance.
pub fn placeholder_keys(text: &str) -> impl Iterator<Item = &str> {
    placeholder_re()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Substitute bound values into a copy of `args`.
///
/// Absent or empty bindings leave the placeholder verbatim.
pub fn apply_bindings(args: &[String], bindings: &Bindings) -> Vec<String> {
    args.iter()
        .map(|arg| substitute(arg, bindings))
        .collect()
}

fn substitute(text: &str, bindings: &Bindings) -> String {
    if !text.contains('<') {
        return text.to_string();
    }
    placeholder_re()
        .replace_all(text, |caps: &Captures<'_>| {
            match bindings.get(&caps[1]).filter(|value| !value.is_empty()) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Render a template, returning `None` if any placeholder stays unresolved.
pub fn render_template(template: &str, bindings: &Bindings) -> Option<String> {
    let rendered = substitute(template, bindings);
    if placeholder_keys(&rendered).next().is_some() {
        return None;
    }
    Some(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, &str)]) -> Bindings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_apply_bindings_replaces_known_placeholder() {
        let args = vec!["--name".to_string(), "<X>".to_string()];
        let out = apply_bindings(&args, &bindings(&[("X", "v")]));
        assert_eq!(out, vec!["--name".to_string(), "v".to_string()]);
    }

    #[test]
    fn test_apply_bindings_leaves_absent_and_empty_verbatim() {
        let args = vec!["<MISSING>".to_string(), "id=<EMPTY>".to_string()];
        let out = apply_bindings(&args, &bindings(&[("EMPTY", "")]));
        assert_eq!(out, args);
    }

    #[test]
    fn test_apply_bindings_handles_embedded_and_repeated_tokens() {
        let args = vec!["arn:<REGION>:<ACCOUNT_ID>:<REGION>".to_string()];
        let out = apply_bindings(
            &args,
            &bindings(&[("REGION", "us-east-1"), ("ACCOUNT_ID", "123")]),
        );
        assert_eq!(out, vec!["arn:us-east-1:123:us-east-1".to_string()]);
    }

    #[test]
    fn test_lowercase_and_mixed_case_brackets_are_literal() {
        let text = "<html> <Name> <vpc_id> <9AB> <VPC_ID>";
        let keys: Vec<_> = placeholder_keys(text).collect();
        assert_eq!(keys, vec!["VPC_ID"]);
    }

    #[test]
    fn test_render_template_requires_all_values() {
        let b = bindings(&[("DOMAIN", "d123.example.net")]);
        assert_eq!(
            render_template("https://<DOMAIN>", &b).as_deref(),
            Some("https://d123.example.net")
        );
        assert_eq!(render_template("https://<OTHER>", &b), None);
    }

    #[test]
    fn test_is_placeholder_key() {
        assert!(is_placeholder_key("INSTANCE_ID"));
        assert!(is_placeholder_key("X"));
        assert!(!is_placeholder_key("instance_id"));
        assert!(!is_placeholder_key("1ID"));
    }
}
