//! Bootstrap helpers for starting cloudplan from a single YAML config.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use cloudplan_actions::{CommandWaitProbe, ProcessCommandRunner};
use cloudplan_config::{load_config, CloudplanConfig, ConfigError, NormalizerConfig};
use cloudplan_core::classify::{IntentClassifier, RuleTable};
use cloudplan_core::executor::{ExecResult, ExecutionProgressReporter, Executor};
use cloudplan_core::normalizer::{
    NormalizeError, NormalizedPlan, PassLogger, PassSettings, PlanNormalizer,
};
use cloudplan_core::runner::{CommandRunner, WaitProbe};
use cloudplan_core::types::{Bindings, Plan};

use crate::logging::init_tracing_if_needed;

/// Runtime bootstrap errors.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("normalizer error: {0}")]
    Normalize(#[from] NormalizeError),
    #[error("failed to read plan '{path}': {source}")]
    PlanIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid plan: {0}")]
    PlanParse(#[from] serde_json::Error),
}

/// Normalization and execution results of one run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub normalized: NormalizedPlan,
    pub result: ExecResult,
}

/// Normalizer and executor built from unified config.
pub struct PlanRuntime {
    pub config: CloudplanConfig,
    pub normalizer: PlanNormalizer,
    pub executor: Executor,
}

impl PlanRuntime {
    /// Load config, initialize tracing, and wire the process backend.
    pub fn from_config_path(path: impl AsRef<Path>) -> Result<Self, BootstrapError> {
        let config = load_config(path.as_ref())?;
        init_tracing_if_needed(&config.observability);
        Self::from_config(config)
    }

    /// Wire the process backend described by `config.runner`.
    pub fn from_config(config: CloudplanConfig) -> Result<Self, BootstrapError> {
        let runner = Arc::new(ProcessCommandRunner::from_config(&config.runner));
        let probe = CommandWaitProbe::from_config(&config.runner)
            .map(|probe| Arc::new(probe) as Arc<dyn WaitProbe>);
        Self::with_collaborators(config, runner, probe)
    }

    /// Wire caller-supplied collaborators instead of the process backend.
    pub fn with_collaborators(
        config: CloudplanConfig,
        runner: Arc<dyn CommandRunner>,
        probe: Option<Arc<dyn WaitProbe>>,
    ) -> Result<Self, BootstrapError> {
        let normalizer = build_normalizer(&config.normalizer)?;

        let mut executor = Executor::new(runner)
            .with_dry_run(config.executor.dry_run)
            .with_poll_interval(config.executor.poll_interval())
            .with_default_wait_timeout(config.executor.default_wait_timeout());
        if let Some(probe) = probe {
            executor = executor.with_wait_probe(probe);
        }

        tracing::info!(
            app = %config.app.name,
            environment = %config.app.environment,
            passes = ?normalizer.pass_names(),
            dry_run = config.executor.dry_run,
            "plan runtime ready"
        );

        Ok(Self {
            config,
            normalizer,
            executor,
        })
    }

    /// Attach a realtime execution progress reporter.
    pub fn with_progress_reporter(self, reporter: Arc<dyn ExecutionProgressReporter>) -> Self {
        Self {
            executor: self.executor.with_progress_reporter(reporter),
            ..self
        }
    }

    /// Read a plan (bare command array or `{ "commands": [...] }`) from disk.
    pub fn load_plan(path: impl AsRef<Path>) -> Result<Plan, BootstrapError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| BootstrapError::PlanIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_plan(&content)
    }

    pub fn parse_plan(content: &str) -> Result<Plan, BootstrapError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn normalize(&self, plan: Plan) -> NormalizedPlan {
        self.normalizer.normalize(plan)
    }

    /// Normalize `plan` once, then execute the result.
    pub async fn run(&self, plan: Plan, cancellation_token: CancellationToken) -> RunOutcome {
        self.run_with_bindings(plan, Bindings::new(), cancellation_token)
            .await
    }

    pub async fn run_with_bindings(
        &self,
        plan: Plan,
        initial: Bindings,
        cancellation_token: CancellationToken,
    ) -> RunOutcome {
        let normalized = self.normalize(plan);
        let result = self
            .executor
            .execute_with_bindings(&normalized.plan, initial, cancellation_token)
            .await;
        RunOutcome { normalized, result }
    }
}

fn build_normalizer(config: &NormalizerConfig) -> Result<PlanNormalizer, BootstrapError> {
    let table = config
        .extra_rules
        .iter()
        .rev()
        .cloned()
        .fold(RuleTable::default(), RuleTable::with_priority_layer);
    let settings = PassSettings {
        classifier: IntentClassifier::new(table),
        send_service: config.send_service.clone(),
        send_operation: config.send_operation.clone(),
        launch_service: config.launch_service.clone(),
        launch_operation: config.launch_operation.clone(),
    };
    let logger: PassLogger = Arc::new(|args: fmt::Arguments<'_>| tracing::info!("{}", args));
    Ok(PlanNormalizer::from_pass_names(&config.passes, &settings)?.with_logger(logger))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudplan_core::classify::{Gate, IntentRule, RuleLayer};

    #[test]
    fn test_extra_rules_take_priority_in_listed_order() {
        let mut config = NormalizerConfig::default();
        config.extra_rules = vec![
            RuleLayer::new("first")
                .with_gate(Gate::new("deploy", &["./deploy.sh"]))
                .with_rule(IntentRule::new("first_deploy", &["deploy"], &[])),
            RuleLayer::new("second")
                .with_gate(Gate::new("deploy", &["./deploy.sh"]))
                .with_rule(IntentRule::new("second_deploy", &["deploy"], &[])),
        ];
        let table = config
            .extra_rules
            .iter()
            .rev()
            .cloned()
            .fold(RuleTable::default(), RuleTable::with_priority_layer);
        let classifier = IntentClassifier::new(table);
        assert_eq!(classifier.classify("./deploy.sh --prod"), Some("first_deploy"));
        assert!(build_normalizer(&config).is_ok());
    }

    #[test]
    fn test_parse_plan_accepts_both_shapes() {
        let bare = PlanRuntime::parse_plan(r#"[{"args": ["s3", "ls"]}]"#).expect("bare");
        let wrapped =
            PlanRuntime::parse_plan(r#"{"commands": [{"Args": ["s3", "ls"]}]}"#).expect("wrapped");
        assert_eq!(bare, wrapped);
        assert!(matches!(
            PlanRuntime::parse_plan("not json"),
            Err(BootstrapError::PlanParse(_))
        ));
    }

    #[test]
    fn test_load_plan_reports_missing_file() {
        let err = PlanRuntime::load_plan("/nonexistent/cloudplan/plan.json").expect_err("missing");
        assert!(matches!(err, BootstrapError::PlanIo { .. }));
    }
}
