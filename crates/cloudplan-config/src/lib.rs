//! # Cloudplan Config
//!
//! Unified single-file configuration for cloudplan.
//! A single `cloudplan.yaml` configures normalization passes, execution
//! timing, the command runner backend, and observability settings.

mod loader;

pub use loader::{load_config, ConfigError, ConfigManager, ConfigWatcher, ReloadHook};

use std::collections::BTreeMap;
use std::time::Duration;

use cloudplan_core::classify::RuleLayer;
use cloudplan_core::dedup::DEFAULT_PASS_ORDER;
use serde::Deserialize;

/// Top-level configuration schema for cloudplan.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudplanConfig {
    /// Config schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for CloudplanConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
            normalizer: NormalizerConfig::default(),
            executor: ExecutorConfig::default(),
            runner: RunnerConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            environment: default_env(),
        }
    }
}

fn default_app_name() -> String {
    "cloudplan".to_string()
}

fn default_env() -> String {
    "development".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NormalizerConfig {
    /// Dedup passes by name, in execution order.
    #[serde(default = "default_passes")]
    pub passes: Vec<String>,
    #[serde(default = "default_send_service")]
    pub send_service: String,
    #[serde(default = "default_send_operation")]
    pub send_operation: String,
    #[serde(default = "default_launch_service")]
    pub launch_service: String,
    #[serde(default = "default_launch_operation")]
    pub launch_operation: String,
    /// Classifier layers evaluated ahead of the built-in ones.
    #[serde(default)]
    pub extra_rules: Vec<RuleLayer>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            passes: default_passes(),
            send_service: default_send_service(),
            send_operation: default_send_operation(),
            launch_service: default_launch_service(),
            launch_operation: default_launch_operation(),
            extra_rules: Vec::new(),
        }
    }
}

fn default_passes() -> Vec<String> {
    DEFAULT_PASS_ORDER.iter().map(ToString::to_string).collect()
}

fn default_send_service() -> String {
    "ssm".to_string()
}

fn default_send_operation() -> String {
    "send-command".to_string()
}

fn default_launch_service() -> String {
    "ec2".to_string()
}

fn default_launch_operation() -> String {
    "run-instances".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Used by waits that carry no timeout of their own.
    #[serde(default = "default_wait_timeout_secs")]
    pub default_wait_timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            poll_interval_ms: default_poll_interval_ms(),
            default_wait_timeout_secs: default_wait_timeout_secs(),
        }
    }
}

impl ExecutorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn default_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.default_wait_timeout_secs)
    }
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_wait_timeout_secs() -> u64 {
    600
}

/// Process backend that runs plan commands.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Executable prepended to every command's args.
    #[serde(default = "default_program")]
    pub program: String,
    /// Args inserted between the program and the command's own args.
    #[serde(default)]
    pub prefix_args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub working_dir: Option<String>,
    #[serde(default = "default_runner_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub wait_probe: Option<WaitProbeConfig>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            prefix_args: Vec::new(),
            env: BTreeMap::new(),
            working_dir: None,
            timeout_ms: default_runner_timeout_ms(),
            wait_probe: None,
        }
    }
}

fn default_program() -> String {
    "aws".to_string()
}

fn default_runner_timeout_ms() -> u64 {
    300_000
}

/// Command used to observe wait conditions; exit status 0 means observed.
///
/// `{resource}` and `{condition}` in `args` are replaced per wait.
#[derive(Debug, Clone, Deserialize)]
pub struct WaitProbeConfig {
    /// Defaults to the runner's program.
    #[serde(default)]
    pub program: Option<String>,
    pub args: Vec<String>,
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_probe_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: CloudplanConfig = serde_yaml::from_str("{}").expect("parse");
        assert_eq!(config.version, 1);
        assert_eq!(config.app.name, "cloudplan");
        assert_eq!(config.normalizer.passes.len(), DEFAULT_PASS_ORDER.len());
        assert_eq!(config.executor.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.runner.program, "aws");
        assert!(config.runner.wait_probe.is_none());
    }

    #[test]
    fn test_sections_parse_from_yaml() {
        let yaml = r#"
normalizer:
  passes: [exact_duplicates, orphans]
  extra_rules:
    - name: team
      gates:
        - name: deploy
          any_of: ["./deploy.sh"]
      rules:
        - category: team_deploy
          all_of: [deploy]
executor:
  dry_run: true
  poll_interval_ms: 250
runner:
  program: aws
  prefix_args: ["--region", "us-east-1"]
  env:
    AWS_PAGER: ""
  wait_probe:
    args: ["cloudformation", "wait", "{condition}", "--stack-name", "{resource}"]
"#;
        let config: CloudplanConfig = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(config.normalizer.passes, vec!["exact_duplicates", "orphans"]);
        assert_eq!(config.normalizer.extra_rules[0].rules[0].category, "team_deploy");
        assert!(config.executor.dry_run);
        assert_eq!(config.executor.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.executor.default_wait_timeout_secs, 600);
        assert_eq!(config.runner.env["AWS_PAGER"], "");
        let probe = config.runner.wait_probe.expect("probe");
        assert_eq!(probe.args.len(), 5);
        assert_eq!(probe.timeout_ms, 30_000);
    }
}
