use std::time::Instant;

use crate::driver::BuildTestDriver;
use crate::error::MutorError;
use crate::observer::ProgressObserver;
use crate::options::LimitType;
use crate::schemata::{Activation, MutationMapping, MutationSchema};
use crate::state::{MutationOutcome, MutationTestOutcome, RunState, TestVerdict};

/// Consecutive `BuildError` verdicts tolerated before the run is aborted
/// as systemically broken.
pub const BUILD_ERRORS_THRESHOLD: usize = 5;

/// Run the baseline, then iterate mutation points under the sampling
/// policy, one fully-completed cycle at a time. The shared working copy and
/// its single build artifact are reused across cycles, so iteration is
/// strictly sequential.
pub fn perform_mutation_testing(
    state: &RunState,
    driver: &dyn BuildTestDriver,
    observer: &dyn ProgressObserver,
) -> Result<MutationTestOutcome, MutorError> {
    observer.mutation_testing_started(MutationMapping::total_schemata(&state.mutation_mapping));
    let started = Instant::now();

    let baseline_start = Instant::now();
    let (verdict, log) = driver.run_tests(
        &state.mutated_project_directory,
        &state.test_manifest,
        &Activation::None,
        "baseline_run",
    );
    if verdict != TestVerdict::Passed {
        return Err(MutorError::BaselineFailed { log });
    }
    observer.baseline_passed(
        baseline_start.elapsed().as_millis() as u64,
        MutationMapping::total_schemata(&state.mutation_mapping),
    );

    let mutations = test_mutations(state, driver, observer)?;

    Ok(MutationTestOutcome {
        mutations,
        coverage: state.project_coverage,
        test_duration_ms: started.elapsed().as_millis() as u64,
    })
}

/// Absolute sampling cap, or `None` for an exhaustive run. A percentage
/// limit is computed over the global schemata total across all files,
/// before any shuffling.
fn sampling_cap(state: &RunState) -> Option<usize> {
    let limit = state.run_options.mutation_limit?;
    Some(match state.run_options.limit_type {
        LimitType::Count => limit,
        LimitType::Percent => {
            MutationMapping::total_schemata(&state.mutation_mapping) * limit / 100
        }
    })
}

fn test_mutations(
    state: &RunState,
    driver: &dyn BuildTestDriver,
    observer: &dyn ProgressObserver,
) -> Result<Vec<MutationOutcome>, MutorError> {
    let cap = sampling_cap(state);
    let randomize = state.run_options.randomize;

    let mut mappings = state.mutation_mapping.clone();
    if randomize {
        fastrand::shuffle(&mut mappings);
    }

    let mut outcomes: Vec<MutationOutcome> = vec![];
    outcomes.reserve(MutationMapping::total_schemata(&mappings));
    let mut consecutive_build_errors = 0;

    for mapping in &mappings {
        let mut schemata = mapping.schemata.clone();
        if randomize {
            fastrand::shuffle(&mut schemata);
        }

        for schema in &schemata {
            // Normal stopping point for sampled runs
            if Some(outcomes.len()) == cap {
                return Ok(outcomes);
            }

            // A single bad activation must not sink the run
            if let Err(reason) =
                driver.activate(&state.mutated_project_directory, schema)
            {
                observer.activation_failed(schema, &reason);
            }

            let (verdict, log) = driver.run_tests(
                &state.mutated_project_directory,
                &state.test_manifest,
                &Activation::Schema(schema.activation_id.clone()),
                &log_file_name(&mapping.file_name, schema),
            );

            let outcome = MutationOutcome {
                verdict,
                point: schema.mutation_point(),
                snapshot: schema.snapshot.clone(),
                original_project_directory: state.project_directory.clone(),
                mutated_project_directory: state.mutated_project_directory.clone(),
            };
            outcomes.push(outcome);
            observer.mutation_tested(outcomes.last().unwrap(), &log);

            consecutive_build_errors = if verdict == TestVerdict::BuildError {
                consecutive_build_errors + 1
            } else {
                0
            };
            if consecutive_build_errors >= BUILD_ERRORS_THRESHOLD {
                return Err(MutorError::TooManyBuildErrors {
                    threshold: BUILD_ERRORS_THRESHOLD,
                });
            }
        }
    }

    Ok(outcomes)
}

fn log_file_name(file_name: &str, schema: &MutationSchema) -> String {
    format!("{}_{}_{}", file_name, schema.operator_id, schema.position).replace(':', "_")
}
