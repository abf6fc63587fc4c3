use std::collections::BTreeMap;

use async_trait::async_trait;

use cloudplan_config::RunnerConfig;
use cloudplan_core::runner::{RunContext, RunnerError, WaitProbe};
use cloudplan_core::types::WaitFor;

use crate::process::run_process;

/// Observes a wait condition by running a probe command.
///
/// `{resource}` and `{condition}` in the args template are replaced per
/// wait; exit status 0 means the condition holds.
#[derive(Debug, Clone)]
pub struct CommandWaitProbe {
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    timeout_ms: u64,
}

impl CommandWaitProbe {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            env: BTreeMap::new(),
            timeout_ms: 30_000,
        }
    }

    /// Build the configured probe, if the runner section declares one.
    pub fn from_config(config: &RunnerConfig) -> Option<Self> {
        let probe = config.wait_probe.as_ref()?;
        Some(Self {
            program: probe
                .program
                .clone()
                .unwrap_or_else(|| config.program.clone()),
            args: probe.args.clone(),
            env: config.env.clone(),
            timeout_ms: probe.timeout_ms,
        })
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn render_args(&self, wait: &WaitFor) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{resource}", &wait.resource)
                    .replace("{condition}", &wait.condition)
            })
            .collect()
    }
}

#[async_trait]
impl WaitProbe for CommandWaitProbe {
    async fn observe(&self, ctx: &RunContext, wait: &WaitFor) -> Result<bool, RunnerError> {
        let args = self.render_args(wait);
        let output =
            run_process(&self.program, args.iter(), &self.env, None, self.timeout_ms).await?;
        tracing::debug!(
            step_index = ctx.step_index,
            resource = %wait.resource,
            observed = output.status.success(),
            "wait probe ran"
        );
        Ok(output.status.success())
    }
}
