//! # Cloudplan Runtime
//!
//! Wires a single `cloudplan.yaml` into a ready-to-use pipeline:
//! tracing, the plan normalizer, and an executor backed by the configured
//! command runner. [`ReloadingRuntime`] rebuilds that pipeline whenever the
//! config file changes.

mod bootstrap;
mod logging;
mod reload;

pub use bootstrap::{BootstrapError, PlanRuntime, RunOutcome};
pub use logging::init_tracing_if_needed;
pub use reload::ReloadingRuntime;

pub use tokio_util::sync::CancellationToken;
