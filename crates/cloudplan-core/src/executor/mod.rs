//! Executor module
//!
//! The Executor runs a normalized plan strictly in list order:
//! - Placeholders are substituted from the run's binding table
//! - Produced values are learned from each command's output
//! - Waits are polled until observed, timed out, or cancelled
//! - The first failure stops the run

mod connection;
mod extract;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tokio::time::{sleep, sleep_until, Instant};

use crate::runner::{CancellationToken, CommandRunner, RunContext, WaitProbe};
use crate::types::{apply_bindings, Bindings, Command, Plan, WaitFor};

pub use connection::ConnectionInfo;
pub use extract::{extract_value, learn_produced, Extraction};

const MAX_LOG_TEXT_CHARS: usize = 2_000;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(600);
/// Stand-in deadline for timeouts too large to add to `Instant::now()`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn wait_deadline(now: Instant, timeout: Duration) -> Instant {
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={}]", char_count));
    preview
}

/// Execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Pending,
    /// Running the command at this index
    Running(usize),
    Succeeded,
    Failed(usize),
    TimedOut(usize),
    Cancelled(usize),
}

/// Execution errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecError {
    #[error("step {step} failed ({command}): {message}")]
    CommandFailed {
        step: usize,
        command: String,
        message: String,
    },

    #[error("step {step} timed out after {timeout:?} waiting for {resource} to be {condition}")]
    WaitTimedOut {
        step: usize,
        resource: String,
        condition: String,
        timeout: Duration,
    },

    #[error("step {step} cancelled")]
    Cancelled { step: usize },

    #[error("step {step} references <{placeholder}> which nothing binds or produces")]
    UnresolvedPlaceholder { step: usize, placeholder: String },
}

impl ExecError {
    pub fn step(&self) -> usize {
        match self {
            Self::CommandFailed { step, .. }
            | Self::WaitTimedOut { step, .. }
            | Self::Cancelled { step }
            | Self::UnresolvedPlaceholder { step, .. } => *step,
        }
    }

    fn terminal_state(&self) -> ExecutionState {
        match self {
            Self::WaitTimedOut { step, .. } => ExecutionState::TimedOut(*step),
            Self::Cancelled { step } => ExecutionState::Cancelled(*step),
            other => ExecutionState::Failed(other.step()),
        }
    }
}

/// Outcome of one execution run.
#[derive(Debug, Clone)]
pub struct ExecResult {
    pub success: bool,
    pub state: ExecutionState,
    pub run_id: String,
    /// Final binding table of the run
    pub bindings: Bindings,
    pub connection: Option<ConnectionInfo>,
    pub errors: Vec<ExecError>,
    /// Commands that finished (or were validated, in dry-run)
    pub completed_steps: usize,
}

/// Realtime execution progress event.
#[derive(Debug, Clone)]
pub struct ExecutionProgressEvent {
    pub run_id: String,
    pub step_index: Option<usize>,
    /// Phase label, e.g. step_started/step_completed/plan_completed.
    pub phase: String,
    /// Optional human-readable message.
    pub message: Option<String>,
    /// Extra structured metadata.
    pub metadata: serde_json::Value,
}

impl ExecutionProgressEvent {
    pub fn new(
        run_id: impl Into<String>,
        step_index: Option<usize>,
        phase: impl Into<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            step_index,
            phase: phase.into(),
            message: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Sink interface for execution progress reporting.
#[async_trait]
pub trait ExecutionProgressReporter: Send + Sync {
    async fn report(&self, event: ExecutionProgressEvent) -> Result<(), String>;
}

/// The executor
pub struct Executor {
    runner: Arc<dyn CommandRunner>,
    probe: Option<Arc<dyn WaitProbe>>,
    poll_interval: Duration,
    default_wait_timeout: Duration,
    dry_run: bool,
    progress_reporter: Option<Arc<dyn ExecutionProgressReporter>>,
}

impl Executor {
    /// Create a new executor around a command runner
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            probe: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            default_wait_timeout: DEFAULT_WAIT_TIMEOUT,
            dry_run: false,
            progress_reporter: None,
        }
    }

    pub fn with_wait_probe(mut self, probe: Arc<dyn WaitProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Timeout for waits that do not carry their own.
    pub fn with_default_wait_timeout(mut self, timeout: Duration) -> Self {
        self.default_wait_timeout = timeout;
        self
    }

    /// Substitute and log only; neither the runner nor the probe is called.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Attach a realtime execution progress reporter.
    pub fn with_progress_reporter(mut self, reporter: Arc<dyn ExecutionProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Execute a plan with an empty binding table.
    pub async fn execute(&self, plan: &Plan, cancellation_token: CancellationToken) -> ExecResult {
        self.execute_with_bindings(plan, Bindings::new(), cancellation_token)
            .await
    }

    /// Execute a plan, seeding the binding table with `initial`.
    pub async fn execute_with_bindings(
        &self,
        plan: &Plan,
        initial: Bindings,
        cancellation_token: CancellationToken,
    ) -> ExecResult {
        let run_id = uuid::Uuid::new_v4().to_string();
        tracing::info!(
            run_id = %run_id,
            steps = plan.len(),
            dry_run = self.dry_run,
            "plan execution started"
        );

        if self.dry_run {
            return self.dry_run_plan(plan, initial, run_id).await;
        }

        let mut bindings = initial;
        let mut state = ExecutionState::Pending;
        for (index, command) in plan.commands.iter().enumerate() {
            let next = ExecutionState::Running(index);
            tracing::trace!(run_id = %run_id, from = ?state, to = ?next, "state transition");
            state = next;
            let ctx = RunContext::new(
                run_id.clone(),
                index,
                command.reason.clone(),
                cancellation_token.clone(),
            );
            if let Err(error) = self.run_step(&ctx, command, &mut bindings).await {
                return self.finish_failed(run_id, bindings, error, index).await;
            }
        }

        self.finish_succeeded(run_id, bindings, plan.len()).await
    }

    async fn run_step(
        &self,
        ctx: &RunContext,
        command: &Command,
        bindings: &mut Bindings,
    ) -> Result<(), ExecError> {
        let step = ctx.step_index;
        if ctx.is_cancelled() {
            return Err(ExecError::Cancelled { step });
        }

        let args = apply_bindings(&command.args, bindings);
        let command_line = args.join(" ");
        tracing::info!(
            run_id = %ctx.run_id,
            step_index = step,
            command = %command_line,
            "step started"
        );
        self.report(
            ExecutionProgressEvent::new(ctx.run_id.clone(), Some(step), "step_started")
                .with_message(command.reason.clone())
                .with_metadata(json!({ "args": args })),
        )
        .await;

        let output = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(ExecError::Cancelled { step }),
            result = self.runner.run(ctx, &args) => {
                result.map_err(|err| ExecError::CommandFailed {
                    step,
                    command: command_line.clone(),
                    message: err.to_string(),
                })?
            }
        };
        tracing::debug!(
            step_index = step,
            output = %truncate_for_log(&output, MAX_LOG_TEXT_CHARS),
            "step output"
        );

        let learned = learn_produced(command, &output, bindings);
        let missing: Vec<&String> = command
            .produces
            .keys()
            .filter(|key| !learned.contains(key))
            .collect();
        if !missing.is_empty() {
            tracing::warn!(
                step_index = step,
                missing = ?missing,
                "declared values not found in output"
            );
        }

        if let Some(wait) = &command.wait_for {
            self.wait_for(ctx, wait, bindings, &command_line).await?;
        }

        self.report(
            ExecutionProgressEvent::new(ctx.run_id.clone(), Some(step), "step_completed")
                .with_metadata(json!({ "learned": learned })),
        )
        .await;
        Ok(())
    }

    async fn wait_for(
        &self,
        ctx: &RunContext,
        wait: &WaitFor,
        bindings: &Bindings,
        command_line: &str,
    ) -> Result<(), ExecError> {
        let step = ctx.step_index;
        let Some(probe) = &self.probe else {
            return Err(ExecError::CommandFailed {
                step,
                command: command_line.to_string(),
                message: format!("no wait probe configured for {}", wait.condition),
            });
        };

        let resource = apply_bindings(std::slice::from_ref(&wait.resource), bindings)
            .pop()
            .unwrap_or_default();
        let timeout = if wait.timeout.is_zero() {
            self.default_wait_timeout
        } else {
            wait.timeout
        };
        let resolved = WaitFor::new(resource, wait.condition.clone()).with_timeout(timeout);

        tracing::info!(
            step_index = step,
            resource = %resolved.resource,
            condition = %resolved.condition,
            timeout_secs = timeout.as_secs(),
            "waiting for condition"
        );
        self.report(
            ExecutionProgressEvent::new(ctx.run_id.clone(), Some(step), "step_waiting")
                .with_message(format!("{} {}", resolved.resource, resolved.condition))
                .with_metadata(json!({ "timeout_secs": timeout.as_secs() })),
        )
        .await;

        let deadline = wait_deadline(Instant::now(), timeout);
        let timed_out = || ExecError::WaitTimedOut {
            step,
            resource: resolved.resource.clone(),
            condition: resolved.condition.clone(),
            timeout,
        };

        loop {
            let observed = tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(ExecError::Cancelled { step }),
                _ = sleep_until(deadline) => return Err(timed_out()),
                result = probe.observe(ctx, &resolved) => result,
            };
            match observed {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(err) => tracing::debug!(step_index = step, "wait probe not ready: {}", err),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(timed_out());
            }
            let nap = self.poll_interval.min(deadline - now);
            tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(ExecError::Cancelled { step }),
                _ = sleep(nap) => {}
            }
        }
    }

    async fn dry_run_plan(&self, plan: &Plan, bindings: Bindings, run_id: String) -> ExecResult {
        let mut declared: std::collections::BTreeSet<&str> = bindings
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, _)| key.as_str())
            .collect();
        let mut errors = Vec::new();

        for (index, command) in plan.commands.iter().enumerate() {
            declared.extend(command.produces.keys().map(String::as_str));
            let args = apply_bindings(&command.args, &bindings);
            tracing::info!(
                run_id = %run_id,
                step_index = index,
                command = %args.join(" "),
                "dry-run step"
            );

            for key in command.placeholders() {
                if !declared.contains(key) {
                    errors.push(ExecError::UnresolvedPlaceholder {
                        step: index,
                        placeholder: key.to_string(),
                    });
                }
            }
        }

        let state = errors
            .first()
            .map(ExecError::terminal_state)
            .unwrap_or(ExecutionState::Succeeded);
        let success = errors.is_empty();
        let connection = ConnectionInfo::from_bindings(&bindings);
        let phase = if success { "plan_completed" } else { "plan_failed" };
        self.report(
            ExecutionProgressEvent::new(run_id.clone(), None, phase)
                .with_metadata(json!({ "dry_run": true, "errors": errors.len() })),
        )
        .await;

        ExecResult {
            success,
            state,
            run_id,
            bindings,
            connection,
            errors,
            completed_steps: plan.len(),
        }
    }

    async fn finish_succeeded(
        &self,
        run_id: String,
        bindings: Bindings,
        steps: usize,
    ) -> ExecResult {
        let connection = ConnectionInfo::from_bindings(&bindings);
        tracing::info!(run_id = %run_id, steps, "plan execution completed");
        let mut event = ExecutionProgressEvent::new(run_id.clone(), None, "plan_completed");
        if let Some(info) = &connection {
            event = event.with_message(info.hint.clone());
        }
        self.report(event).await;

        ExecResult {
            success: true,
            state: ExecutionState::Succeeded,
            run_id,
            bindings,
            connection,
            errors: Vec::new(),
            completed_steps: steps,
        }
    }

    async fn finish_failed(
        &self,
        run_id: String,
        bindings: Bindings,
        error: ExecError,
        index: usize,
    ) -> ExecResult {
        tracing::warn!(run_id = %run_id, step_index = index, "plan execution failed: {}", error);
        self.report(
            ExecutionProgressEvent::new(run_id.clone(), Some(index), "step_failed")
                .with_message(error.to_string()),
        )
        .await;
        self.report(
            ExecutionProgressEvent::new(run_id.clone(), Some(index), "plan_failed")
                .with_message(error.to_string()),
        )
        .await;

        ExecResult {
            success: false,
            state: error.terminal_state(),
            run_id,
            bindings,
            connection: None,
            errors: vec![error],
            completed_steps: index,
        }
    }

    async fn report(&self, event: ExecutionProgressEvent) {
        if let Some(reporter) = &self.progress_reporter {
            if let Err(err) = reporter.report(event).await {
                tracing::warn!("failed to report execution progress: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RunnerError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records invocations and answers from a table keyed by operation.
    #[derive(Default)]
    struct ScriptedRunner {
        outputs: HashMap<String, Result<String, RunnerError>>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        fn with_output(mut self, operation: &str, output: &str) -> Self {
            self.outputs
                .insert(operation.to_string(), Ok(output.to_string()));
            self
        }

        fn with_failure(mut self, operation: &str, err: RunnerError) -> Self {
            self.outputs.insert(operation.to_string(), Err(err));
            self
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, _ctx: &RunContext, args: &[String]) -> Result<String, RunnerError> {
            self.calls.lock().expect("lock").push(args.to_vec());
            let operation = args.get(1).cloned().unwrap_or_default();
            self.outputs
                .get(&operation)
                .cloned()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    /// Reports observed after `ready_after` polls.
    struct CountingProbe {
        polls: AtomicUsize,
        ready_after: usize,
        resources: Mutex<Vec<String>>,
    }

    impl CountingProbe {
        fn new(ready_after: usize) -> Self {
            Self {
                polls: AtomicUsize::new(0),
                ready_after,
                resources: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl WaitProbe for CountingProbe {
        async fn observe(&self, _ctx: &RunContext, wait: &WaitFor) -> Result<bool, RunnerError> {
            self.resources.lock().expect("lock").push(wait.resource.clone());
            let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(polls >= self.ready_after)
        }
    }

    struct CollectProgressReporter {
        events: Mutex<Vec<ExecutionProgressEvent>>,
    }

    impl CollectProgressReporter {
        fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }

        fn phases(&self) -> Vec<String> {
            self.events
                .lock()
                .expect("lock")
                .iter()
                .map(|event| event.phase.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ExecutionProgressReporter for CollectProgressReporter {
        async fn report(&self, event: ExecutionProgressEvent) -> Result<(), String> {
            self.events.lock().expect("lock").push(event);
            Ok(())
        }
    }

    fn vpc_plan() -> Plan {
        Plan::new(vec![
            Command::new(["ec2", "create-vpc", "--cidr-block", "10.0.0.0/16"])
                .with_produces("VPC_ID", "$.Vpc.VpcId"),
            Command::new(["ec2", "create-subnet", "--vpc-id", "<VPC_ID>"]),
        ])
    }

    fn fast(executor: Executor) -> Executor {
        executor
            .with_poll_interval(Duration::from_millis(5))
            .with_default_wait_timeout(Duration::from_millis(100))
    }

    #[tokio::test]
    async fn test_values_flow_to_later_commands() {
        let runner = Arc::new(
            ScriptedRunner::default().with_output("create-vpc", r#"{"Vpc": {"VpcId": "vpc-123"}}"#),
        );
        let reporter = Arc::new(CollectProgressReporter::new());
        let executor = Executor::new(runner.clone()).with_progress_reporter(reporter.clone());

        let result = executor.execute(&vpc_plan(), CancellationToken::new()).await;

        assert!(result.success);
        assert_eq!(result.state, ExecutionState::Succeeded);
        assert_eq!(result.bindings["VPC_ID"], "vpc-123");
        assert_eq!(runner.calls()[1], vec!["ec2", "create-subnet", "--vpc-id", "vpc-123"]);
        assert_eq!(
            reporter.phases(),
            vec![
                "step_started",
                "step_completed",
                "step_started",
                "step_completed",
                "plan_completed"
            ]
        );
    }

    #[tokio::test]
    async fn test_unbound_placeholder_is_passed_verbatim() {
        let runner = Arc::new(ScriptedRunner::default());
        let executor = Executor::new(runner.clone());
        let plan = Plan::new(vec![Command::new(["s3", "ls", "<BUCKET>"])]);

        let result = executor.execute(&plan, CancellationToken::new()).await;

        assert!(result.success);
        assert_eq!(runner.calls()[0], vec!["s3", "ls", "<BUCKET>"]);
    }

    #[tokio::test]
    async fn test_first_failure_stops_the_run() {
        let runner = Arc::new(ScriptedRunner::default().with_failure(
            "create-vpc",
            RunnerError::NonZeroExit {
                status: "1".to_string(),
                stderr: "quota exceeded".to_string(),
            },
        ));
        let executor = Executor::new(runner.clone());

        let result = executor.execute(&vpc_plan(), CancellationToken::new()).await;

        assert!(!result.success);
        assert_eq!(result.state, ExecutionState::Failed(0));
        assert_eq!(runner.calls().len(), 1);
        assert_eq!(result.completed_steps, 0);
        match &result.errors[..] {
            [ExecError::CommandFailed { step: 0, message, .. }] => {
                assert!(message.contains("quota exceeded"));
            }
            other => panic!("unexpected errors: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wait_polls_until_observed() {
        let runner = Arc::new(ScriptedRunner::default().with_output(
            "run-instances",
            r#"{"Instances": [{"InstanceId": "i-9"}]}"#,
        ));
        let probe = Arc::new(CountingProbe::new(3));
        let executor = fast(Executor::new(runner).with_wait_probe(probe.clone()));
        let plan = Plan::new(vec![Command::new(["ec2", "run-instances"])
            .with_produces("INSTANCE_ID", "$.Instances[0].InstanceId")
            .with_wait_for(WaitFor::new("<INSTANCE_ID>", "running"))]);

        let result = executor.execute(&plan, CancellationToken::new()).await;

        assert!(result.success, "{:?}", result.errors);
        assert_eq!(probe.polls.load(Ordering::SeqCst), 3);
        assert!(probe.resources.lock().expect("lock").iter().all(|r| r == "i-9"));
    }

    #[tokio::test]
    async fn test_wait_with_unbounded_timeout_still_completes() {
        let readiness = Arc::new(CountingProbe::new(1));
        let executor = fast(
            Executor::new(Arc::new(ScriptedRunner::default())).with_wait_probe(readiness.clone()),
        );
        let plan = Plan::new(vec![Command::new(["rds", "create-db-instance"]).with_wait_for(
            WaitFor::new("db-1", "available").with_timeout(Duration::from_secs(u64::MAX)),
        )]);

        let result = executor.execute(&plan, CancellationToken::new()).await;

        assert!(result.success, "{:?}", result.errors);
        assert_eq!(readiness.polls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wait_deadline_saturates_instead_of_overflowing() {
        let now = Instant::now();
        assert_eq!(wait_deadline(now, Duration::from_secs(5)), now + Duration::from_secs(5));
        assert_eq!(wait_deadline(now, Duration::MAX), now + FAR_FUTURE);
    }

    #[tokio::test]
    async fn test_wait_times_out_with_distinct_outcome() {
        let runner = Arc::new(ScriptedRunner::default());
        let executor = fast(
            Executor::new(runner).with_wait_probe(Arc::new(CountingProbe::new(usize::MAX))),
        );
        let plan = Plan::new(vec![Command::new(["rds", "create-db-instance"]).with_wait_for(
            WaitFor::new("db-1", "available").with_timeout(Duration::from_millis(30)),
        )]);

        let result = executor.execute(&plan, CancellationToken::new()).await;

        assert_eq!(result.state, ExecutionState::TimedOut(0));
        assert!(matches!(
            &result.errors[..],
            [ExecError::WaitTimedOut { resource, condition, .. }]
                if resource == "db-1" && condition == "available"
        ));
    }

    #[tokio::test]
    async fn test_wait_without_probe_fails_the_step() {
        let executor = Executor::new(Arc::new(ScriptedRunner::default()));
        let plan = Plan::new(vec![Command::new(["rds", "create-db-instance"])
            .with_wait_for(WaitFor::new("db-1", "available"))]);

        let result = executor.execute(&plan, CancellationToken::new()).await;

        assert_eq!(result.state, ExecutionState::Failed(0));
    }

    #[tokio::test]
    async fn test_cancellation_during_wait() {
        let runner = Arc::new(ScriptedRunner::default());
        let executor = Executor::new(runner.clone())
            .with_wait_probe(Arc::new(CountingProbe::new(usize::MAX)))
            .with_poll_interval(Duration::from_millis(5))
            .with_default_wait_timeout(Duration::from_secs(30));
        let plan = Plan::new(vec![
            Command::new(["rds", "create-db-instance"])
                .with_wait_for(WaitFor::new("db-1", "available")),
            Command::new(["rds", "describe-db-instances"]),
        ]);
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = executor.execute(&plan, token).await;

        assert_eq!(result.state, ExecutionState::Cancelled(0));
        assert_eq!(result.errors, vec![ExecError::Cancelled { step: 0 }]);
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let runner = Arc::new(ScriptedRunner::default());
        let token = CancellationToken::new();
        token.cancel();

        let result = Executor::new(runner.clone()).execute(&vpc_plan(), token).await;

        assert_eq!(result.state, ExecutionState::Cancelled(0));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_calls_nothing_and_checks_declarations() {
        let runner = Arc::new(ScriptedRunner::default());
        let executor = Executor::new(runner.clone()).with_dry_run(true);

        let ok = executor.execute(&vpc_plan(), CancellationToken::new()).await;
        assert!(ok.success);
        assert!(runner.calls().is_empty());

        let plan = Plan::new(vec![Command::new(["ec2", "create-subnet", "--vpc-id", "<VPC_ID>"])]);
        let bad = executor.execute(&plan, CancellationToken::new()).await;
        assert!(!bad.success);
        assert_eq!(
            bad.errors,
            vec![ExecError::UnresolvedPlaceholder {
                step: 0,
                placeholder: "VPC_ID".to_string()
            }]
        );

        let seeded: Bindings = [("VPC_ID".to_string(), "vpc-1".to_string())].into_iter().collect();
        let bound = executor
            .execute_with_bindings(&plan, seeded, CancellationToken::new())
            .await;
        assert!(bound.success);
    }

    #[tokio::test]
    async fn test_connection_info_from_final_bindings() {
        let runner = Arc::new(ScriptedRunner::default().with_output(
            "create-distribution",
            r#"{"Distribution": {"Id": "E1", "DomainName": "d1.cloudfront.net"}}"#,
        ));
        let plan = Plan::new(vec![Command::new(["cloudfront", "create-distribution"])
            .with_produces("DISTRIBUTION_DOMAIN", "$.Distribution.DomainName")
            .with_produces("DISTRIBUTION_URL", "https://<DISTRIBUTION_DOMAIN>")]);

        let result = Executor::new(runner).execute(&plan, CancellationToken::new()).await;

        let connection = result.connection.expect("connection");
        assert_eq!(connection.key, "DISTRIBUTION_URL");
        assert_eq!(connection.hint, "open https://d1.cloudfront.net");
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short", 10), "short");
        assert_eq!(truncate_for_log("abcdef", 3), "abc... [truncated, total_chars=6]");
    }
}
