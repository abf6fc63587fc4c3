use serde::{Deserialize, Serialize};

use crate::types::Bindings;

/// Suffixes that mark a user-facing endpoint, highest priority first.
const ENDPOINT_SUFFIXES: [(&str, EndpointKind); 5] = [
    ("_URL", EndpointKind::Web),
    ("_ENDPOINT", EndpointKind::Web),
    ("_DOMAIN", EndpointKind::Web),
    ("_PUBLIC_IP", EndpointKind::Host),
    ("_PUBLIC_DNS", EndpointKind::Host),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndpointKind {
    Web,
    Host,
}

/// How to reach what the plan deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Binding the endpoint came from
    pub key: String,
    pub endpoint: String,
    /// Suggested next command, e.g. `open https://...` or `ssh 1.2.3.4`
    pub hint: String,
}

impl ConnectionInfo {
    /// Pick the highest-priority endpoint binding, if any.
    pub fn from_bindings(bindings: &Bindings) -> Option<Self> {
        ENDPOINT_SUFFIXES.iter().find_map(|(suffix, kind)| {
            bindings
                .iter()
                .find(|(key, value)| key.ends_with(*suffix) && !value.trim().is_empty())
                .map(|(key, value)| Self::new(key, value.trim(), *kind))
        })
    }

    fn new(key: &str, value: &str, kind: EndpointKind) -> Self {
        let (endpoint, hint) = match kind {
            EndpointKind::Web => {
                let url = if value.contains("://") {
                    value.to_string()
                } else {
                    format!("https://{}", value)
                };
                let hint = format!("open {}", url);
                (url, hint)
            }
            EndpointKind::Host => (value.to_string(), format!("ssh {}", value)),
        };
        Self {
            key: key.to_string(),
            endpoint,
            hint,
        }
    }
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
    fn test_url_wins_over_public_ip() {
        let info = ConnectionInfo::from_bindings(&bindings(&[
            ("WEB_PUBLIC_IP", "3.4.5.6"),
            ("SITE_URL", "https://example.com"),
        ]))
        .expect("connection");
        assert_eq!(info.key, "SITE_URL");
        assert_eq!(info.hint, "open https://example.com");
    }

    #[test]
    fn test_domain_gets_scheme_and_host_gets_ssh_hint() {
        let web = ConnectionInfo::from_bindings(&bindings(&[("CDN_DOMAIN", "d1.cloudfront.net")]))
            .expect("connection");
        assert_eq!(web.endpoint, "https://d1.cloudfront.net");

        let host = ConnectionInfo::from_bindings(&bindings(&[
            ("VPC_ID", "vpc-1"),
            ("BASTION_PUBLIC_IP", "3.4.5.6"),
        ]))
        .expect("connection");
        assert_eq!(host.endpoint, "3.4.5.6");
        assert_eq!(host.hint, "ssh 3.4.5.6");
    }

    #[test]
    fn test_no_endpoint_bindings() {
        assert_eq!(ConnectionInfo::from_bindings(&bindings(&[("VPC_ID", "vpc-1")])), None);
        assert_eq!(ConnectionInfo::from_bindings(&bindings(&[("SITE_URL", " ")])), None);
    }
}
