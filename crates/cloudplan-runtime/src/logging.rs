//! Process-wide tracing setup.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use cloudplan_config::ObservabilityConfig;
use tracing_subscriber::EnvFilter;

const LOG_FILE_ENV: &str = "CLOUDPLAN_LOG_FILE";
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Install the global subscriber once per process.
///
/// `RUST_LOG` wins over `observability.log_level` and `CLOUDPLAN_LOG_FILE`
/// wins over `observability.log_file`. A log file that cannot be opened falls
/// back to stderr.
pub fn init_tracing_if_needed(observability: &ObservabilityConfig) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config_level(&observability.log_level)));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true);

        let log_file = log_file_path(observability);
        let file = log_file
            .as_deref()
            .and_then(|path| match open_log_file(Path::new(path)) {
                Ok(file) => Some(file),
                Err(err) => {
                    eprintln!("failed to open log file '{}': {}", path, err);
                    None
                }
            });
        let destination = match (&file, log_file.as_deref()) {
            (Some(_), Some(path)) => path,
            _ => "(stderr)",
        };
        let installed = match file {
            Some(file) => builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init(),
            None => builder.with_writer(io::stderr).try_init(),
        };

        if installed.is_ok() {
            tracing::info!(
                log_level = %observability.log_level,
                log_file = destination,
                "tracing initialized"
            );
        }
    });
}

fn log_file_path(observability: &ObservabilityConfig) -> Option<String> {
    std::env::var(LOG_FILE_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| observability.log_file.clone())
}

fn config_level(raw: &str) -> &'static str {
    let wanted = raw.trim().to_ascii_lowercase();
    LEVELS
        .into_iter()
        .find(|level| *level == wanted)
        .unwrap_or("info")
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
