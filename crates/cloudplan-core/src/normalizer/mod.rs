//! Plan Normalizer module
//!
//! Every plan goes through the normalizer exactly once before execution:
//! - Dedup passes run in a fixed order, each over the previous pass's output
//! - Fixers then fill in missing `produces` mappings and completion steps
//! - Nothing is ever reordered

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::autofix::{DistributionFixer, PlanFixer};
use crate::classify::IntentClassifier;
use crate::dedup::{
    DedupPass, DocumentCyclePass, ExactDuplicatePass, LaunchCyclePass, OrphanPass, ReadOnlyPass,
    SemanticIntentPass, DEFAULT_PASS_ORDER,
};
use crate::types::Plan;

/// Receives one formatted line per pass; absent means silent.
pub type PassLogger = Arc<dyn Fn(fmt::Arguments<'_>) + Send + Sync>;

/// Normalizer construction errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Unknown dedup pass: {0}")]
    UnknownPass(String),
}

/// Parameters shared by the built-in passes.
#[derive(Debug, Clone)]
pub struct PassSettings {
    pub classifier: IntentClassifier,
    pub send_service: String,
    pub send_operation: String,
    pub launch_service: String,
    pub launch_operation: String,
}

impl Default for PassSettings {
    fn default() -> Self {
        Self {
            classifier: IntentClassifier::default(),
            send_service: "ssm".to_string(),
            send_operation: "send-command".to_string(),
            launch_service: "ec2".to_string(),
            launch_operation: "run-instances".to_string(),
        }
    }
}

impl PassSettings {
    /// Instantiate a built-in pass by its stable name.
    pub fn build_pass(&self, name: &str) -> Result<Box<dyn DedupPass>, NormalizeError> {
        let pass: Box<dyn DedupPass> = match name {
            ExactDuplicatePass::NAME => Box::new(ExactDuplicatePass),
            SemanticIntentPass::NAME => Box::new(
                SemanticIntentPass::new(self.classifier.clone())
                    .with_shape(&self.send_service, &self.send_operation),
            ),
            DocumentCyclePass::NAME => Box::new(DocumentCyclePass::new(self.classifier.clone())),
            LaunchCyclePass::NAME => Box::new(LaunchCyclePass::new(
                &self.launch_service,
                &self.launch_operation,
            )),
            ReadOnlyPass::NAME => Box::new(ReadOnlyPass::default()),
            OrphanPass::NAME => Box::new(OrphanPass),
            other => return Err(NormalizeError::UnknownPass(other.to_string())),
        };
        Ok(pass)
    }
}

/// Removal count of one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub name: &'static str,
    pub removed: usize,
}

/// What normalization did to a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub input_len: usize,
    pub passes: Vec<PassReport>,
    pub repairs: usize,
}

impl NormalizeReport {
    pub fn total_removed(&self) -> usize {
        self.passes.iter().map(|pass| pass.removed).sum()
    }
}

/// Normalized plan ready for execution
#[derive(Debug, Clone)]
pub struct NormalizedPlan {
    pub plan: Plan,
    pub report: NormalizeReport,
}

/// Plan normalizer
#[derive(Default)]
pub struct PlanNormalizer {
    passes: Vec<Box<dyn DedupPass>>,
    fixers: Vec<Box<dyn PlanFixer>>,
    logger: Option<PassLogger>,
}

impl PlanNormalizer {
    /// Create an empty normalizer (no passes, no fixers)
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in passes in their default order, then the built-in fixers.
    pub fn with_default_passes(classifier: IntentClassifier) -> Self {
        let settings = PassSettings {
            classifier,
            ..PassSettings::default()
        };
        let mut normalizer = Self::new();
        for name in DEFAULT_PASS_ORDER {
            if let Ok(pass) = settings.build_pass(name) {
                normalizer.add_pass(pass);
            }
        }
        normalizer.add_fixer(Box::new(DistributionFixer::default()));
        normalizer
    }

    /// The named passes in the given order, then the built-in fixers.
    pub fn from_pass_names<I, S>(names: I, settings: &PassSettings) -> Result<Self, NormalizeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalizer = Self::new();
        for name in names {
            normalizer.add_pass(settings.build_pass(name.as_ref())?);
        }
        normalizer.add_fixer(Box::new(DistributionFixer::default()));
        Ok(normalizer)
    }

    /// Add a dedup pass
    pub fn add_pass(&mut self, pass: Box<dyn DedupPass>) {
        self.passes.push(pass);
    }

    /// Add a fixer
    pub fn add_fixer(&mut self, fixer: Box<dyn PlanFixer>) {
        self.fixers.push(fixer);
    }

    pub fn with_logger(mut self, logger: PassLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    fn log(&self, args: fmt::Arguments<'_>) {
        if let Some(logger) = &self.logger {
            logger(args);
        }
    }

    /// Normalize a plan
    pub fn normalize(&self, plan: Plan) -> NormalizedPlan {
        let mut report = NormalizeReport {
            input_len: plan.len(),
            ..NormalizeReport::default()
        };

        let mut current = plan;
        for pass in &self.passes {
            let outcome = pass.apply(&current);
            if outcome.removed > 0 {
                tracing::debug!(pass = pass.name(), removed = outcome.removed, "dedup pass");
                self.log(format_args!(
                    "{}: removed {} command(s)",
                    pass.name(),
                    outcome.removed
                ));
            }
            report.passes.push(PassReport {
                name: pass.name(),
                removed: outcome.removed,
            });
            current = outcome.plan;
        }

        for fixer in &self.fixers {
            let repairs = fixer.fix(&mut current);
            if repairs > 0 {
                tracing::debug!(fixer = fixer.name(), repairs, "autofix");
                self.log(format_args!("{}: applied {} repair(s)", fixer.name(), repairs));
            }
            report.repairs += repairs;
        }

        tracing::info!(
            input = report.input_len,
            output = current.len(),
            removed = report.total_removed(),
            repairs = report.repairs,
            "plan normalized"
        );

        NormalizedPlan {
            plan: current,
            report,
        }
    }
}
