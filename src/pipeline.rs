use crate::options::{RunOptions, Workflow};

/// The closed set of pipeline steps. Ordering is fixed by the workflow
/// tables below; steps never reorder themselves at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    LoadConfiguration,
    CreateMutatedProjectDirectory,
    PreviousRunCleanUp,
    CopyProjectToWorkspace,
    DiscoverProjectCoverage,
    DiscoverSourceFiles,
    DiscoverMutationPoints,
    ApplySchemata,
    CreateTestPlan,
    LoadTestPlan,
    BuildForTesting,
    DiscoverTestManifest,
    PublishMappings,
    PerformMutationTesting,
}

use Step::*;

const FULL_STEPS: &[Step] = &[
    LoadConfiguration,
    CreateMutatedProjectDirectory,
    PreviousRunCleanUp,
    CopyProjectToWorkspace,
    DiscoverProjectCoverage,
    DiscoverSourceFiles,
    DiscoverMutationPoints,
    CreateTestPlan,
    ApplySchemata,
    BuildForTesting,
    PublishMappings,
    PerformMutationTesting,
];

/// `full` driven by a previously persisted plan: discovery is replaced by
/// loading the plan.
const TEST_PLAN_STEPS: &[Step] = &[
    LoadConfiguration,
    LoadTestPlan,
    BuildForTesting,
    PublishMappings,
    PerformMutationTesting,
];

const CREATE_TEST_PLAN_STEPS: &[Step] = &[
    LoadConfiguration,
    CreateMutatedProjectDirectory,
    PreviousRunCleanUp,
    CopyProjectToWorkspace,
    DiscoverProjectCoverage,
    DiscoverSourceFiles,
    DiscoverMutationPoints,
    ApplySchemata,
    CreateTestPlan,
];

const CREATE_WORKSPACE_STEPS: &[Step] = &[
    LoadConfiguration,
    CreateMutatedProjectDirectory,
    PreviousRunCleanUp,
    CopyProjectToWorkspace,
];

/// Discovery phase of a split run: embed and persist, no build or test.
/// Assumes a workspace staged by `create-workspace`.
const DISCOVER_MUTATION_STEPS: &[Step] = &[
    LoadConfiguration,
    CreateMutatedProjectDirectory,
    DiscoverSourceFiles,
    DiscoverMutationPoints,
    ApplySchemata,
    CreateTestPlan,
];

const APPLY_SCHEMATA_STEPS: &[Step] = &[
    LoadConfiguration,
    LoadTestPlan,
    BuildForTesting,
    PublishMappings,
];

const APPLY_MUTATION_STEPS: &[Step] = &[
    LoadConfiguration,
    LoadTestPlan,
    DiscoverTestManifest,
    PublishMappings,
    PerformMutationTesting,
];

/// Select and order the steps for one run. Pure function of the options:
/// an explicit workflow maps to a fixed table; otherwise the full list is
/// filtered by the boolean options.
pub fn compose(options: &RunOptions) -> Vec<Step> {
    if let Some(workflow) = options.workflow {
        return match workflow {
            Workflow::CreateWorkspace => CREATE_WORKSPACE_STEPS.to_vec(),
            Workflow::DiscoverMutation => DISCOVER_MUTATION_STEPS.to_vec(),
            Workflow::ApplySchemata => APPLY_SCHEMATA_STEPS.to_vec(),
            Workflow::ApplyMutation => APPLY_MUTATION_STEPS.to_vec(),
        };
    }

    let mut steps: Vec<Step> = if options.is_using_test_plan() {
        TEST_PLAN_STEPS.to_vec()
    } else {
        let mut full = FULL_STEPS.to_vec();
        full.retain(|s| *s != PublishMappings);
        full
    };

    if options.create_test_plan {
        steps = CREATE_TEST_PLAN_STEPS.to_vec();
    } else {
        steps.retain(|s| *s != CreateTestPlan);
    }

    if options.skip_coverage {
        steps.retain(|s| *s != DiscoverProjectCoverage);
    }

    steps
}
