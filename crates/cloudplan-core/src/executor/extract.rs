//! Learning produced values from command output

use serde_json::Value;

use crate::types::{placeholder_keys, render_template, Bindings, Command};

/// How a `produces` expression reads a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction<'a> {
    /// `$.A.B[0]` or `.A.B[0]` over JSON output
    JsonPath(&'a str),
    /// Rendered from other bindings, e.g. `https://<DOMAIN>`
    Template(&'a str),
    /// Key or text marker located in the output
    Marker(&'a str),
}

impl<'a> Extraction<'a> {
    pub fn classify(expression: &'a str) -> Self {
        let trimmed = expression.trim();
        if trimmed.starts_with("$.") || trimmed.starts_with('.') {
            Extraction::JsonPath(trimmed)
        } else if placeholder_keys(trimmed).next().is_some() {
            Extraction::Template(trimmed)
        } else {
            Extraction::Marker(trimmed)
        }
    }
}

/// Read one value from `output`; templates need bindings and yield `None` here.
pub fn extract_value(output: &str, expression: &str) -> Option<String> {
    match Extraction::classify(expression) {
        Extraction::JsonPath(path) => extract_json_path(output, path),
        Extraction::Marker(marker) => extract_marker(output, marker),
        Extraction::Template(_) => None,
    }
}

/// Learn every `produces` key of `command` from its output.
///
/// Direct extractions are learned first, templates afterwards so they can
/// reference values the same command just produced. Returns the learned keys.
pub fn learn_produced(command: &Command, output: &str, bindings: &mut Bindings) -> Vec<String> {
    let mut learned = Vec::new();
    let mut templates = Vec::new();

    for (key, expression) in &command.produces {
        match Extraction::classify(expression) {
            Extraction::Template(template) => templates.push((key, template)),
            _ => {
                if let Some(value) = extract_value(output, expression).filter(|v| !v.is_empty()) {
                    bindings.insert(key.clone(), value);
                    learned.push(key.clone());
                }
            }
        }
    }

    // Templates may chain; stop once a round learns nothing.
    while !templates.is_empty() {
        let before = templates.len();
        templates.retain(|(key, template)| match render_template(template, bindings) {
            Some(value) => {
                bindings.insert((*key).clone(), value);
                learned.push((*key).clone());
                false
            }
            None => true,
        });
        if templates.len() == before {
            break;
        }
    }

    learned
}

fn extract_json_path(output: &str, path: &str) -> Option<String> {
    let root: Value = serde_json::from_str(output.trim()).ok()?;
    let path = path.strip_prefix('$').unwrap_or(path);
    let path = path.strip_prefix('.').unwrap_or(path);

    let mut current = &root;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        let (name, indices) = split_indices(segment)?;
        if !name.is_empty() {
            current = current.get(name)?;
        }
        for index in indices {
            current = current.get(index)?;
        }
    }
    scalar_text(current)
}

/// `Items[0][2]` -> ("Items", [0, 2])
fn split_indices(segment: &str) -> Option<(&str, Vec<usize>)> {
    let Some(open) = segment.find('[') else {
        return Some((segment, Vec::new()));
    };
    let name = &segment[..open];
    let mut indices = Vec::new();
    let mut rest = &segment[open..];
    while let Some(body) = rest.strip_prefix('[') {
        let close = body.find(']')?;
        indices.push(body[..close].trim().parse().ok()?);
        rest = &body[close + 1..];
    }
    rest.is_empty().then_some((name, indices))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn extract_marker(output: &str, marker: &str) -> Option<String> {
    if marker.is_empty() {
        return None;
    }
    if let Ok(root) = serde_json::from_str::<Value>(output.trim()) {
        if root.is_object() || root.is_array() {
            return find_key(&root, marker);
        }
    }

    let start = output.find(marker)? + marker.len();
    let rest = output[start..].trim_start_matches(['"', '\'', ':', '=', ' ', '\t']);
    let end = rest
        .find(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | ',' | ']' | '}' | ')'))
        .unwrap_or(rest.len());
    let value = &rest[..end];
    (!value.is_empty()).then(|| value.to_string())
}

/// First scalar under `key`, depth-first.
fn find_key(value: &Value, key: &str) -> Option<String> {
    match value {
        Value::Object(map) => map.iter().find_map(|(k, v)| {
            if k == key {
                if let Some(text) = scalar_text(v) {
                    return Some(text);
                }
            }
            find_key(v, key)
        }),
        Value::Array(items) => items.iter().find_map(|item| find_key(item, key)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VPC_OUTPUT: &str = r#"{"Vpc": {"VpcId": "vpc-123", "CidrBlock": "10.0.0.0/16"}}"#;

    #[test]
    fn test_classify_expressions() {
        assert_eq!(Extraction::classify("$.Vpc.VpcId"), Extraction::JsonPath("$.Vpc.VpcId"));
        assert_eq!(Extraction::classify(".Vpc.VpcId"), Extraction::JsonPath(".Vpc.VpcId"));
        assert_eq!(
            Extraction::classify("https://<DOMAIN>"),
            Extraction::Template("https://<DOMAIN>")
        );
        assert_eq!(Extraction::classify("InstanceId"), Extraction::Marker("InstanceId"));
    }

    #[test]
    fn test_json_path_walks_objects_and_indices() {
        assert_eq!(extract_value(VPC_OUTPUT, "$.Vpc.VpcId"), Some("vpc-123".to_string()));
        let output = r#"{"Instances": [{"InstanceId": "i-1", "CpuOptions": {"CoreCount": 2}}]}"#;
        assert_eq!(
            extract_value(output, ".Instances[0].InstanceId"),
            Some("i-1".to_string())
        );
        assert_eq!(
            extract_value(output, "$.Instances[0].CpuOptions.CoreCount"),
            Some("2".to_string())
        );
        assert_eq!(extract_value(output, "$.Instances[3].InstanceId"), None);
        assert_eq!(extract_value("not json", "$.Vpc.VpcId"), None);
    }

    #[test]
    fn test_marker_in_json_finds_first_key_depth_first() {
        let output = r#"{"Reservation": {"Instances": [{"InstanceId": "i-abc"}]}}"#;
        assert_eq!(extract_value(output, "InstanceId"), Some("i-abc".to_string()));
        assert_eq!(extract_value(output, "Missing"), None);
    }

    #[test]
    fn test_marker_in_text_reads_following_token() {
        let output = "created bucket\nBucketName: my-bucket, region=us-east-1\n";
        assert_eq!(extract_value(output, "BucketName"), Some("my-bucket".to_string()));
        assert_eq!(extract_value(output, "region"), Some("us-east-1".to_string()));
        assert_eq!(extract_value("id=\"abc\"", "id"), Some("abc".to_string()));
        assert_eq!(extract_value("nothing here", "id"), None);
    }

    #[test]
    fn test_learn_produced_renders_templates_after_direct_values() {
        let command = Command::new(["cloudfront", "create-distribution"])
            .with_produces("DISTRIBUTION_DOMAIN", "$.Distribution.DomainName")
            .with_produces("DISTRIBUTION_ID", "$.Distribution.Id")
            .with_produces("DISTRIBUTION_URL", "https://<DISTRIBUTION_DOMAIN>");
        let output = r#"{"Distribution": {"Id": "E123", "DomainName": "d1.cloudfront.net"}}"#;

        let mut bindings = Bindings::new();
        let learned = learn_produced(&command, output, &mut bindings);

        assert_eq!(learned.len(), 3);
        assert_eq!(bindings["DISTRIBUTION_ID"], "E123");
        assert_eq!(bindings["DISTRIBUTION_URL"], "https://d1.cloudfront.net");
    }

    #[test]
    fn test_learn_produced_skips_unresolved_templates() {
        let command = Command::new(["elbv2", "create-load-balancer"])
            .with_produces("LB_URL", "http://<LB_DNS>");
        let mut bindings = Bindings::new();
        assert!(learn_produced(&command, "{}", &mut bindings).is_empty());
        assert!(bindings.is_empty());
    }
}
