use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::MutorConfig;
use crate::driver::TestManifest;
use crate::options::RunOptions;
use crate::schemata::{MutationMapping, MutationPoint, MutationSnapshot};

/// Verdict of one build/test cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestVerdict {
    /// All tests passed: the mutant survived.
    Passed,
    /// At least one test failed: the mutant was killed.
    Failed,
    /// The mutated build/test run could not complete. Inconclusive for
    /// scoring, but counted by the build-error circuit breaker.
    BuildError,
}

/// Result of testing one mutant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationOutcome {
    pub verdict: TestVerdict,
    pub point: MutationPoint,
    pub snapshot: MutationSnapshot,
    pub original_project_directory: PathBuf,
    pub mutated_project_directory: PathBuf,
}

/// Final aggregate handed to reporting. Append-only while the controller
/// iterates, finalized exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationTestOutcome {
    pub mutations: Vec<MutationOutcome>,
    pub coverage: f64,
    pub test_duration_ms: u64,
}

impl MutationTestOutcome {
    pub fn killed(&self) -> usize {
        self.count(TestVerdict::Failed)
    }

    pub fn survived(&self) -> usize {
        self.count(TestVerdict::Passed)
    }

    pub fn build_errors(&self) -> usize {
        self.count(TestVerdict::BuildError)
    }

    /// Mutation score over conclusive verdicts only.
    pub fn score(&self) -> f64 {
        let conclusive = self.killed() + self.survived();
        if conclusive == 0 {
            1.0
        } else {
            self.killed() as f64 / conclusive as f64
        }
    }

    fn count(&self, verdict: TestVerdict) -> usize {
        self.mutations.iter().filter(|m| m.verdict == verdict).count()
    }
}

/// Additive updates produced by pipeline steps. Merging is last-writer-wins
/// per field; nothing is ever removed from the state.
#[derive(Debug, Clone)]
pub enum StateChange {
    ConfigurationLoaded(MutorConfig),
    MutatedProjectDirectoryCreated(PathBuf),
    SourceFilesDiscovered(Vec<PathBuf>),
    MutationMappingsDiscovered(Vec<MutationMapping>),
    ProjectCoverage(f64),
    TestManifestGenerated(TestManifest),
    OutcomeGenerated(MutationTestOutcome),
}

/// The single mutable aggregate threaded through the pipeline. Owned by the
/// orchestrator; steps read it by reference and return changes.
#[derive(Debug, Clone)]
pub struct RunState {
    pub run_options: RunOptions,
    pub config: Option<MutorConfig>,
    pub project_directory: PathBuf,
    pub mutated_project_directory: PathBuf,
    pub source_files: Vec<PathBuf>,
    pub mutation_mapping: Vec<MutationMapping>,
    pub project_coverage: f64,
    pub test_manifest: TestManifest,
    pub outcome: Option<MutationTestOutcome>,
}

impl RunState {
    pub fn new(run_options: RunOptions, project_directory: PathBuf) -> Self {
        Self {
            run_options,
            config: None,
            project_directory,
            mutated_project_directory: PathBuf::new(),
            source_files: vec![],
            mutation_mapping: vec![],
            project_coverage: 0.0,
            test_manifest: TestManifest::default(),
            outcome: None,
        }
    }

    pub fn apply(&mut self, changes: Vec<StateChange>) {
        for change in changes {
            match change {
                StateChange::ConfigurationLoaded(config) => self.config = Some(config),
                StateChange::MutatedProjectDirectoryCreated(path) => {
                    self.mutated_project_directory = path
                }
                StateChange::SourceFilesDiscovered(files) => self.source_files = files,
                StateChange::MutationMappingsDiscovered(mappings) => {
                    self.mutation_mapping = mappings
                }
                StateChange::ProjectCoverage(percent) => self.project_coverage = percent,
                StateChange::TestManifestGenerated(manifest) => self.test_manifest = manifest,
                StateChange::OutcomeGenerated(outcome) => self.outcome = Some(outcome),
            }
        }
    }
}
