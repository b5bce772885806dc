use std::path::PathBuf;

use crate::config::CommandSpec;

/// Named step subsets. Absent an explicit workflow, `run` composes the full
/// pipeline and filters it by the boolean options below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    CreateWorkspace,
    DiscoverMutation,
    ApplySchemata,
    ApplyMutation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitType {
    /// `limit` is an absolute mutant count.
    Count,
    /// `limit` is a percentage of the total schemata count across all files.
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Plain,
    Json,
}

/// Immutable configuration for one invocation. Constructed once by the CLI
/// and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Source files to mutate; empty means every discovered source file.
    pub files_to_mutate: Vec<String>,
    /// Test targets to restrict the manifest to; empty means all targets.
    pub unit_test_files: Vec<String>,
    /// Mutation operator ids to apply; empty means all operators.
    pub operators: Vec<String>,
    /// Sampling cap; `None` runs every schema.
    pub mutation_limit: Option<usize>,
    pub limit_type: LimitType,
    pub randomize: bool,
    pub skip_coverage: bool,
    pub skip_update_check: bool,
    pub create_test_plan: bool,
    pub test_plan_path: Option<PathBuf>,
    pub configuration_path: Option<PathBuf>,
    pub workflow: Option<Workflow>,
    pub report_format: ReportFormat,
    pub report_path: Option<PathBuf>,
    /// Replaces the configured test command for this invocation.
    pub test_command_override: Option<CommandSpec>,
}

impl RunOptions {
    pub fn is_using_test_plan(&self) -> bool {
        self.test_plan_path.is_some()
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            files_to_mutate: vec![],
            unit_test_files: vec![],
            operators: vec![],
            mutation_limit: None,
            limit_type: LimitType::Count,
            randomize: false,
            skip_coverage: false,
            skip_update_check: false,
            create_test_plan: false,
            test_plan_path: None,
            configuration_path: None,
            workflow: None,
            report_format: ReportFormat::Plain,
            report_path: None,
            test_command_override: None,
        }
    }
}

/// Split comma-separated CLI list values, dropping empties. Mirrors how the
/// file and test filters accept both repeated flags and `a,b,c` values.
pub fn split_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
