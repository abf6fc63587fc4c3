//! Built-in rule layers.

use super::{Gate, IntentRule, RuleLayer};

pub const ONBOARD: &str = "onboard";
pub const ONBOARD_START: &str = "onboard_start";
pub const CONFIGURE: &str = "configure";
pub const LIST_INVOCATIONS: &str = "list_invocations";

pub const CLONE: &str = "clone";
pub const START: &str = "start";
pub const STOP: &str = "stop";
pub const ENV_SETUP: &str = "env_setup";
pub const REGISTRY_PULL: &str = "registry_pull";
pub const DIAGNOSTICS: &str = "diagnostics";
pub const MKDIR: &str = "mkdir";

const START_MARKERS: &[&str] = &[
    "docker compose up",
    "docker-compose up",
    "docker run",
    "systemctl start",
    "systemctl restart",
    "service start",
    "npm start",
    "npm run start",
    "pm2 start",
    "nohup ",
];

/// Service bootstrap layer: onboarding, startup, configuration, invocation listing.
pub fn domain_layer() -> RuleLayer {
    let mut service_start: Vec<&str> = vec!["gateway start", "daemon start", "start --daemon"];
    service_start.extend_from_slice(START_MARKERS);

    RuleLayer::new("domain")
        .with_gate(Gate::new("onboard", &["onboard"]))
        .with_gate(Gate::new("start", &service_start))
        .with_gate(Gate::new("config", &["config set", "configure "]))
        .with_gate(Gate::new("list_invocations", &["list-command-invocations"]))
        .with_rule(IntentRule::new(ONBOARD, &["onboard"], &["start"]))
        .with_rule(IntentRule::new(ONBOARD_START, &["onboard", "start"], &[]))
        .with_rule(IntentRule::new(CONFIGURE, &["config"], &["start", "onboard"]))
        .with_rule(IntentRule::new(LIST_INVOCATIONS, &["list_invocations"], &[]))
}

/// Generic host-setup layer.
pub fn generic_layer() -> RuleLayer {
    RuleLayer::new("generic")
        .with_gate(Gate::new("clone", &["git clone"]))
        .with_gate(Gate::new("start", START_MARKERS))
        .with_gate(Gate::new(
            "stop",
            &[
                "docker stop",
                "docker rm",
                "docker compose down",
                "docker-compose down",
                "systemctl stop",
                "pkill ",
                "kill ",
            ],
        ))
        .with_gate(Gate::new(
            "env_write",
            &["> .env", ">.env", ">> .env", ">>.env", "tee .env", "tee -a .env"],
        ))
        .with_gate(Gate::new(
            "registry_pull",
            &["docker pull", "ecr get-login-password", "docker login"],
        ))
        .with_gate(Gate::new(
            "diagnostics",
            &[
                "docker ps",
                "docker logs",
                "systemctl status",
                "journalctl",
                "netstat",
                "ss -",
                "curl -s localhost",
                "curl localhost",
                "uptime",
                "df -h",
                "free -m",
            ],
        ))
        .with_gate(Gate::new("mkdir", &["mkdir"]))
        .with_rule(IntentRule::new(CLONE, &["clone"], &[]))
        .with_rule(IntentRule::new(START, &["start"], &[]))
        .with_rule(IntentRule::new(STOP, &["stop"], &["start"]))
        .with_rule(IntentRule::new(ENV_SETUP, &["env_write"], &["start"]))
        .with_rule(IntentRule::new(REGISTRY_PULL, &["registry_pull"], &[]))
        .with_rule(IntentRule::new(DIAGNOSTICS, &["diagnostics"], &["start"]))
        .with_rule(IntentRule::new(
            MKDIR,
            &["mkdir"],
            &["clone", "start", "env_write"],
        ))
}
