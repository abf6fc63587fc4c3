//! A runtime that follows `cloudplan.yaml` as it changes.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use tokio_util::sync::CancellationToken;

use cloudplan_config::{CloudplanConfig, ConfigManager, ConfigWatcher, ReloadHook};
use cloudplan_core::runner::{CommandRunner, WaitProbe};
use cloudplan_core::types::{Bindings, Plan};

use crate::bootstrap::{BootstrapError, PlanRuntime, RunOutcome};
use crate::logging::init_tracing_if_needed;

type RuntimeFactory =
    Arc<dyn Fn(CloudplanConfig) -> Result<PlanRuntime, BootstrapError> + Send + Sync>;
type SharedRuntime = Arc<RwLock<Arc<PlanRuntime>>>;

/// Rebuilds its [`PlanRuntime`] whenever the config file reloads.
///
/// Runs already in flight finish on the runtime they started with.
pub struct ReloadingRuntime {
    manager: Arc<ConfigManager>,
    factory: RuntimeFactory,
    current: SharedRuntime,
}

impl ReloadingRuntime {
    /// Load config and wire the process backend described by `config.runner`.
    pub async fn from_config_path(path: impl Into<PathBuf>) -> Result<Self, BootstrapError> {
        Self::with_factory(path.into(), Arc::new(PlanRuntime::from_config)).await
    }

    /// Keep the given collaborators across reloads.
    pub async fn with_collaborators(
        path: impl Into<PathBuf>,
        runner: Arc<dyn CommandRunner>,
        probe: Option<Arc<dyn WaitProbe>>,
    ) -> Result<Self, BootstrapError> {
        let factory: RuntimeFactory = Arc::new(move |config| {
            PlanRuntime::with_collaborators(config, Arc::clone(&runner), probe.clone())
        });
        Self::with_factory(path.into(), factory).await
    }

    async fn with_factory(path: PathBuf, factory: RuntimeFactory) -> Result<Self, BootstrapError> {
        let manager = Arc::new(ConfigManager::new(path));
        manager.load().await?;
        let config = manager.snapshot().await;
        init_tracing_if_needed(&config.observability);
        let runtime = factory(config)?;
        Ok(Self {
            manager,
            factory,
            current: Arc::new(RwLock::new(Arc::new(runtime))),
        })
    }

    pub fn current(&self) -> Arc<PlanRuntime> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Re-read the config file now. On error the previous runtime stays.
    pub async fn reload(&self) -> Result<(), BootstrapError> {
        self.manager.load().await?;
        let config = self.manager.snapshot().await;
        install(&self.factory, &self.current, config)
    }

    /// Rebuild on every config file write until the watcher is dropped.
    pub fn watch(&self) -> Result<ConfigWatcher, BootstrapError> {
        let factory = Arc::clone(&self.factory);
        let current = Arc::clone(&self.current);
        let hook: ReloadHook = Arc::new(move |config: &CloudplanConfig| {
            if let Err(err) = install(&factory, &current, config.clone()) {
                tracing::error!(error = %err, "runtime rebuild failed, keeping previous runtime");
            }
        });
        Ok(self.manager.start_watching(hook)?)
    }

    pub async fn run(&self, plan: Plan, cancellation_token: CancellationToken) -> RunOutcome {
        self.current().run(plan, cancellation_token).await
    }

    pub async fn run_with_bindings(
        &self,
        plan: Plan,
        initial: Bindings,
        cancellation_token: CancellationToken,
    ) -> RunOutcome {
        self.current()
            .run_with_bindings(plan, initial, cancellation_token)
            .await
    }
}

fn install(
    factory: &RuntimeFactory,
    current: &SharedRuntime,
    config: CloudplanConfig,
) -> Result<(), BootstrapError> {
    let runtime = Arc::new(factory(config)?);
    tracing::info!(app = %runtime.config.app.name, "runtime rebuilt from reloaded config");
    *current.write().unwrap_or_else(PoisonError::into_inner) = runtime;
    Ok(())
}
