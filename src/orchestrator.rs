use std::path::PathBuf;

use crate::config::MutorConfig;
use crate::controller;
use crate::driver::{
    BuildTestDriver, CommandTransformer, CoverageProvider, ShellCoverage, ShellDriver,
    SourceTransformer,
};
use crate::error::MutorError;
use crate::observer::ProgressObserver;
use crate::options::RunOptions;
use crate::pipeline::{self, Step};
use crate::plan::{self, TestPlan};
use crate::schemata::MutationMapping;
use crate::state::{RunState, StateChange};
use crate::workspace;

/// Entry point for one run. Owns the run state, executes the composed step
/// list strictly in order, and merges each step's changes before the next
/// step starts. The first failing step aborts the rest; recovery across
/// runs goes through the persisted test plan, not through partial replay.
pub struct Orchestrator<'a> {
    observer: &'a dyn ProgressObserver,
    transformer: Option<Box<dyn SourceTransformer>>,
    driver: Option<Box<dyn BuildTestDriver>>,
    coverage: Option<Box<dyn CoverageProvider>>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(observer: &'a dyn ProgressObserver) -> Self {
        Self {
            observer,
            transformer: None,
            driver: None,
            coverage: None,
        }
    }

    /// Override the source transformer (tests, embedding callers). Without
    /// an override the configured transformer command is used.
    pub fn with_transformer(mut self, transformer: Box<dyn SourceTransformer>) -> Self {
        self.transformer = Some(transformer);
        self
    }

    pub fn with_driver(mut self, driver: Box<dyn BuildTestDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn with_coverage(mut self, coverage: Box<dyn CoverageProvider>) -> Self {
        self.coverage = Some(coverage);
        self
    }

    pub fn run(
        &mut self,
        options: RunOptions,
        project_directory: PathBuf,
    ) -> Result<RunState, MutorError> {
        let steps = pipeline::compose(&options);
        let mut state = RunState::new(options, project_directory);
        for step in steps {
            let changes = self.execute(step, &state)?;
            state.apply(changes);
        }
        Ok(state)
    }

    fn execute(&mut self, step: Step, state: &RunState) -> Result<Vec<StateChange>, MutorError> {
        match step {
            Step::LoadConfiguration => {
                let mut config = MutorConfig::load(
                    &state.project_directory,
                    state.run_options.configuration_path.as_deref(),
                )?;
                if let Some(test_command) = &state.run_options.test_command_override {
                    config.test_command = test_command.clone();
                }
                Ok(vec![StateChange::ConfigurationLoaded(config)])
            }
            Step::CreateMutatedProjectDirectory => {
                Ok(vec![StateChange::MutatedProjectDirectoryCreated(
                    workspace::mutated_project_path(&state.project_directory),
                )])
            }
            Step::PreviousRunCleanUp => {
                workspace::remove_previous_run(&state.mutated_project_directory)?;
                Ok(vec![])
            }
            Step::CopyProjectToWorkspace => {
                self.observer.project_copy_started();
                workspace::copy_project(
                    &state.project_directory,
                    &state.mutated_project_directory,
                )?;
                self.observer.project_copy_finished(&state.mutated_project_directory);
                Ok(vec![])
            }
            Step::DiscoverProjectCoverage => self.discover_coverage(state),
            Step::DiscoverSourceFiles => {
                let files = workspace::discover_source_files(
                    &state.mutated_project_directory,
                    &state.run_options,
                    config(state)?,
                )?;
                Ok(vec![StateChange::SourceFilesDiscovered(files)])
            }
            Step::DiscoverMutationPoints => self.discover_mutation_points(state),
            Step::ApplySchemata => self.apply_schemata(state),
            Step::CreateTestPlan => {
                let path = plan::plan_path(
                    &state.project_directory,
                    state.run_options.test_plan_path.as_deref(),
                );
                plan::save_plan(&TestPlan::from_state(state), &path)?;
                self.observer.test_plan_created(&path);
                Ok(vec![])
            }
            Step::LoadTestPlan => {
                let path = plan::plan_path(
                    &state.project_directory,
                    state.run_options.test_plan_path.as_deref(),
                );
                let plan = plan::load_plan(&path)?;
                self.observer.test_plan_loaded(&path);
                Ok(vec![
                    StateChange::MutatedProjectDirectoryCreated(PathBuf::from(
                        plan.mutated_project_path,
                    )),
                    StateChange::ProjectCoverage(plan.project_coverage),
                    StateChange::MutationMappingsDiscovered(plan.mappings),
                ])
            }
            Step::BuildForTesting => {
                let manifest = self
                    .driver(state)?
                    .build_for_testing(&state.mutated_project_directory)?;
                Ok(vec![StateChange::TestManifestGenerated(manifest)])
            }
            Step::DiscoverTestManifest => {
                let manifest = self
                    .driver(state)?
                    .discover_test_manifest(&state.mutated_project_directory)?;
                Ok(vec![StateChange::TestManifestGenerated(manifest)])
            }
            Step::PublishMappings => {
                self.observer.mappings_discovered(&state.mutation_mapping);
                Ok(vec![])
            }
            Step::PerformMutationTesting => {
                let observer = self.observer;
                let driver = self.driver(state)?;
                let outcome = controller::perform_mutation_testing(state, driver, observer)?;
                Ok(vec![StateChange::OutcomeGenerated(outcome)])
            }
        }
    }

    fn discover_coverage(&mut self, state: &RunState) -> Result<Vec<StateChange>, MutorError> {
        if self.coverage.is_none() {
            if let Some(command) = &config(state)?.coverage_command {
                self.coverage = Some(Box::new(ShellCoverage::new(command.clone())));
            }
        }
        let Some(provider) = self.coverage.as_deref() else {
            return Ok(vec![]);
        };
        // Coverage is advisory; failure to measure it never aborts the run
        match provider.coverage(&state.project_directory) {
            Ok(percent) => {
                self.observer.coverage_discovered(percent);
                Ok(vec![StateChange::ProjectCoverage(percent)])
            }
            Err(reason) => {
                self.observer.coverage_unavailable(&reason);
                Ok(vec![])
            }
        }
    }

    fn discover_mutation_points(
        &mut self,
        state: &RunState,
    ) -> Result<Vec<StateChange>, MutorError> {
        let transformer = self.transformer(state)?;
        let mut mappings = vec![];
        for file in &state.source_files {
            let source =
                std::fs::read_to_string(file).map_err(|e| MutorError::WorkspaceFailed {
                    reason: format!("could not read {}: {}", file.display(), e),
                })?;
            // Paths in mappings are workspace-relative so a plan stays valid
            // when the working copy moves between machines
            let rel = file
                .strip_prefix(&state.mutated_project_directory)
                .unwrap_or(file);
            let rel_str = rel.display().to_string();
            let schemata = transformer.discover_schemata(
                &rel_str,
                &source,
                &state.run_options.operators,
            )?;
            if schemata.is_empty() {
                continue;
            }
            let file_name = rel
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| rel_str.clone());
            mappings.push(MutationMapping {
                file_path: rel_str,
                file_name,
                schemata,
            });
        }

        if MutationMapping::total_schemata(&mappings) == 0 {
            return Err(MutorError::NoMutationPointsDiscovered);
        }
        Ok(vec![StateChange::MutationMappingsDiscovered(mappings)])
    }

    /// One rewrite pass per file: all schemata for a file are embedded at
    /// once and the rewritten file replaces the original in the workspace.
    fn apply_schemata(&mut self, state: &RunState) -> Result<Vec<StateChange>, MutorError> {
        let transformer = self.transformer(state)?;
        for mapping in &state.mutation_mapping {
            let path = state.mutated_project_directory.join(&mapping.file_path);
            let source =
                std::fs::read_to_string(&path).map_err(|e| MutorError::WorkspaceFailed {
                    reason: format!("could not read {}: {}", path.display(), e),
                })?;
            let rewritten =
                transformer.embed_schemata(&mapping.file_path, &source, &mapping.schemata)?;
            std::fs::write(&path, rewritten).map_err(|e| MutorError::WorkspaceFailed {
                reason: format!("could not write {}: {}", path.display(), e),
            })?;
        }
        Ok(vec![])
    }

    fn transformer(&mut self, state: &RunState) -> Result<&dyn SourceTransformer, MutorError> {
        if self.transformer.is_none() {
            let command = config(state)?.transformer_command.clone().ok_or_else(|| {
                MutorError::TransformFailed {
                    path: state.project_directory.clone(),
                    reason: "no transformer configured (set transformer_command)".into(),
                }
            })?;
            self.transformer = Some(Box::new(CommandTransformer::new(command)));
        }
        Ok(self.transformer.as_deref().unwrap())
    }

    fn driver(&mut self, state: &RunState) -> Result<&dyn BuildTestDriver, MutorError> {
        if self.driver.is_none() {
            let config = config(state)?.clone();
            let filter = state.run_options.unit_test_files.clone();
            self.driver = Some(Box::new(ShellDriver::new(config, filter)));
        }
        Ok(self.driver.as_deref().unwrap())
    }
}

fn config(state: &RunState) -> Result<&MutorConfig, MutorError> {
    state.config.as_ref().ok_or_else(|| MutorError::ConfigUnreadable {
        path: state.project_directory.clone(),
        reason: "configuration step did not run".into(),
    })
}
