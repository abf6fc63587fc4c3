use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use cloudplan_config::RunnerConfig;
use cloudplan_core::executor::truncate_for_log;
use cloudplan_core::runner::{CommandRunner, RunContext, RunnerError};

const STDERR_PREVIEW_CHARS: usize = 2_000;

/// Runs plan commands as `program prefix_args... args...`.
#[derive(Debug, Clone)]
pub struct ProcessCommandRunner {
    program: String,
    prefix_args: Vec<String>,
    env: BTreeMap<String, String>,
    working_dir: Option<PathBuf>,
    timeout_ms: u64,
}

impl ProcessCommandRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
            env: BTreeMap::new(),
            working_dir: None,
            timeout_ms: RunnerConfig::default().timeout_ms,
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            program: config.program.clone(),
            prefix_args: config.prefix_args.clone(),
            env: config.env.clone(),
            working_dir: config.working_dir.as_ref().map(PathBuf::from),
            timeout_ms: config.timeout_ms,
        }
    }

    pub fn with_prefix_args(mut self, args: Vec<String>) -> Self {
        self.prefix_args = args;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub(crate) async fn spawn(&self, args: &[String]) -> Result<Output, RunnerError> {
        run_process(
            &self.program,
            self.prefix_args.iter().chain(args),
            &self.env,
            self.working_dir.as_ref(),
            self.timeout_ms,
        )
        .await
    }
}

#[async_trait]
impl CommandRunner for ProcessCommandRunner {
    async fn run(&self, ctx: &RunContext, args: &[String]) -> Result<String, RunnerError> {
        tracing::debug!(
            run_id = %ctx.run_id,
            step_index = ctx.step_index,
            program = %self.program,
            "spawning command"
        );
        let output = self.spawn(args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RunnerError::NonZeroExit {
                status: output.status.to_string(),
                stderr: truncate_for_log(stderr.trim(), STDERR_PREVIEW_CHARS),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Spawn a child process and collect its output.
///
/// The child is killed if the returned future is dropped or times out.
pub(crate) async fn run_process<'a>(
    program: &str,
    args: impl Iterator<Item = &'a String>,
    env: &BTreeMap<String, String>,
    working_dir: Option<&PathBuf>,
    timeout_ms: u64,
) -> Result<Output, RunnerError> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(cwd) = working_dir {
        cmd.current_dir(cwd);
    }
    if !env.is_empty() {
        cmd.envs(env);
    }
    cmd.kill_on_drop(true);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = cmd.spawn().map_err(|e| {
        RunnerError::Spawn(format!("failed to spawn '{}': {}", program, e))
    })?;

    match timeout(Duration::from_millis(timeout_ms), child.wait_with_output()).await {
        Ok(result) => result
            .map_err(|e| RunnerError::other(format!("wait for '{}' failed: {}", program, e))),
        Err(_) => Err(RunnerError::Timeout(timeout_ms)),
    }
}
