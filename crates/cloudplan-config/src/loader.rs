//! Configuration loading and hot-reload support.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cloudplan_core::dedup::DEFAULT_PASS_ORDER;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::{CloudplanConfig, NormalizerConfig, RunnerConfig};

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("File watch error: {0}")]
    Notify(#[from] notify::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load cloudplan configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<CloudplanConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: CloudplanConfig = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &CloudplanConfig) -> Result<(), ConfigError> {
    if config.version == 0 {
        return Err(ConfigError::Invalid(
            "version must be greater than 0".to_string(),
        ));
    }

    if config.app.name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "app.name must not be empty".to_string(),
        ));
    }

    if config.executor.poll_interval_ms == 0 {
        return Err(ConfigError::Invalid(
            "executor.poll_interval_ms must be > 0".to_string(),
        ));
    }

    if config.executor.default_wait_timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "executor.default_wait_timeout_secs must be > 0".to_string(),
        ));
    }

    validate_normalizer(&config.normalizer)?;
    validate_runner(&config.runner)?;

    Ok(())
}

fn validate_normalizer(config: &NormalizerConfig) -> Result<(), ConfigError> {
    for pass in &config.passes {
        if !DEFAULT_PASS_ORDER.contains(&pass.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "normalizer.passes: unknown pass '{}'",
                pass
            )));
        }
    }

    for (label, value) in [
        ("send_service", &config.send_service),
        ("send_operation", &config.send_operation),
        ("launch_service", &config.launch_service),
        ("launch_operation", &config.launch_operation),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "normalizer.{} must not be empty",
                label
            )));
        }
    }

    for layer in &config.extra_rules {
        if layer.name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "normalizer.extra_rules[].name must not be empty".to_string(),
            ));
        }
        for rule in &layer.rules {
            if rule.category.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "normalizer.extra_rules[{}].rules[].category must not be empty",
                    layer.name
                )));
            }
            let unknown = rule
                .all_of
                .iter()
                .chain(&rule.none_of)
                .find(|gate| !layer.gates.iter().any(|g| &g.name == *gate));
            if let Some(gate) = unknown {
                return Err(ConfigError::Invalid(format!(
                    "normalizer.extra_rules[{}]: rule '{}' uses undefined gate '{}'",
                    layer.name, rule.category, gate
                )));
            }
        }
    }

    Ok(())
}

fn validate_runner(config: &RunnerConfig) -> Result<(), ConfigError> {
    if config.program.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "runner.program must not be empty".to_string(),
        ));
    }

    if config.timeout_ms == 0 {
        return Err(ConfigError::Invalid(
            "runner.timeout_ms must be > 0".to_string(),
        ));
    }

    if let Some(probe) = &config.wait_probe {
        if probe.args.is_empty() {
            return Err(ConfigError::Invalid(
                "runner.wait_probe.args must not be empty".to_string(),
            ));
        }
        if probe.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "runner.wait_probe.timeout_ms must be > 0".to_string(),
            ));
        }
    }

    Ok(())
}

/// Called with the new config after each successful reload.
pub type ReloadHook = Arc<dyn Fn(&CloudplanConfig) + Send + Sync>;

/// Manages unified configuration with hot-reload support.
pub struct ConfigManager {
    path: PathBuf,
    config: Arc<RwLock<CloudplanConfig>>,
}

impl ConfigManager {
    /// Create a new config manager.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(CloudplanConfig::default())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a reference to the current config.
    pub fn config(&self) -> Arc<RwLock<CloudplanConfig>> {
        self.config.clone()
    }

    pub async fn snapshot(&self) -> CloudplanConfig {
        self.config.read().await.clone()
    }

    /// Load configuration from file; the previous config stays on error.
    pub async fn load(&self) -> Result<(), ConfigError> {
        let config = load_config(&self.path)?;
        let mut current = self.config.write().await;
        *current = config;
        Ok(())
    }

    /// Watch the config file and reload it on every write.
    ///
    /// Must be called inside a tokio runtime; reloads run on that runtime.
    pub fn start_watching(
        self: &Arc<Self>,
        on_reload: ReloadHook,
    ) -> Result<ConfigWatcher, ConfigError> {
        let manager = Arc::clone(self);
        let handle = tokio::runtime::Handle::current();

        let mut watcher: RecommendedWatcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
                let kind = match res {
                    Ok(event) => event.kind,
                    Err(err) => {
                        tracing::warn!(error = %err, "config watch error");
                        return;
                    }
                };
                if !triggers_reload(&kind) {
                    return;
                }
                let manager = Arc::clone(&manager);
                let on_reload = Arc::clone(&on_reload);
                handle.spawn(async move { manager.reload_and_notify(&on_reload).await });
            })?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %self.path.display(), "watching config file");
        Ok(ConfigWatcher { _watcher: watcher })
    }

    async fn reload_and_notify(&self, on_reload: &ReloadHook) {
        if let Err(err) = self.load().await {
            tracing::error!(
                path = %self.path.display(),
                error = %err,
                "config reload rejected, keeping previous config"
            );
            return;
        }
        tracing::info!(path = %self.path.display(), "config reloaded");
        on_reload(&self.snapshot().await);
    }
}

fn triggers_reload(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Modify(_) | EventKind::Create(_))
}

/// Keeps the file watcher alive.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
}
