use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MutorError;
use crate::schemata::MutationMapping;
use crate::state::RunState;

pub const DEFAULT_PLAN_FILE: &str = "mutor-mappings.json";

/// Self-contained snapshot of the discovery phase. Replaying a plan must not
/// require re-running discovery, so everything the execution phase needs is
/// here: where the embedded working copy lives, the coverage figure, and the
/// per-file mutation mappings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPlan {
    pub mutated_project_path: String,
    pub project_coverage: f64,
    pub mappings: Vec<MutationMapping>,
}

impl TestPlan {
    pub fn from_state(state: &RunState) -> Self {
        Self {
            mutated_project_path: state.mutated_project_directory.display().to_string(),
            project_coverage: state.project_coverage,
            mappings: state.mutation_mapping.clone(),
        }
    }
}

/// Write the plan as pretty JSON so it can be inspected and edited between
/// the discovery and execution phases.
pub fn save_plan(plan: &TestPlan, path: &Path) -> Result<(), MutorError> {
    let json = serde_json::to_string_pretty(plan).map_err(|e| MutorError::PlanUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    std::fs::write(path, json).map_err(|e| MutorError::PlanUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub fn load_plan(path: &Path) -> Result<TestPlan, MutorError> {
    let data = std::fs::read_to_string(path).map_err(|e| MutorError::PlanUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&data).map_err(|e| MutorError::PlanUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Where the plan lives for a given run: the configured location, or the
/// default file name next to the project.
pub fn plan_path(project_directory: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => project_directory.join(DEFAULT_PLAN_FILE),
    }
}
