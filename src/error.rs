use std::path::PathBuf;

use thiserror::Error;

/// Fatal and control-flow errors for one mutation testing run.
///
/// `NoMutationPointsDiscovered` is the odd one out: it aborts the pipeline
/// like any other error but the CLI maps it to a success exit, since an
/// unmutatable project is an expected outcome, not a failure.
#[derive(Debug, Error)]
pub enum MutorError {
    #[error("baseline tests did not pass; fix failing tests before mutating\n{log}")]
    BaselineFailed { log: String },

    #[error("aborted after {threshold} consecutive build errors; the mutated build appears to be systemically broken")]
    TooManyBuildErrors { threshold: usize },

    #[error("could not read test plan at {path}: {reason}")]
    PlanUnreadable { path: PathBuf, reason: String },

    #[error("no mutation points discovered")]
    NoMutationPointsDiscovered,

    #[error("could not read configuration at {path}: {reason}")]
    ConfigUnreadable { path: PathBuf, reason: String },

    #[error("workspace staging failed: {reason}")]
    WorkspaceFailed { reason: String },

    #[error("build for testing failed: {reason}")]
    BuildFailed { reason: String },

    #[error("source transformer failed on {path}: {reason}")]
    TransformFailed { path: PathBuf, reason: String },
}

impl MutorError {
    /// Process exit code for a fatal error. Zero-result runs exit 0 and are
    /// handled by the caller before reaching this mapping.
    pub fn exit_code(&self) -> i32 {
        match self {
            MutorError::ConfigUnreadable { .. } | MutorError::PlanUnreadable { .. } => 2,
            MutorError::BaselineFailed { .. } => 3,
            MutorError::TooManyBuildErrors { .. } => 4,
            MutorError::NoMutationPointsDiscovered => 0,
            _ => 1,
        }
    }
}
