use std::path::PathBuf;

use mutor::config::MutorConfig;
use mutor::driver::{TestManifest, TestTarget};
use mutor::options::RunOptions;
use mutor::schemata::{MutationMapping, MutationPoint, MutationSnapshot, SourcePosition};
use mutor::state::{
    MutationOutcome, MutationTestOutcome, RunState, StateChange, TestVerdict,
};

fn config() -> MutorConfig {
    serde_json::from_str(
        r#"{ "test_command": { "executable": "cargo", "arguments": ["test"] } }"#,
    )
    .unwrap()
}

#[test]
fn changes_merge_into_their_fields() {
    let mut state = RunState::new(RunOptions::default(), PathBuf::from("/proj"));

    state.apply(vec![
        StateChange::ConfigurationLoaded(config()),
        StateChange::MutatedProjectDirectoryCreated(PathBuf::from("/proj_mutated")),
        StateChange::SourceFilesDiscovered(vec![PathBuf::from("/proj_mutated/src/lib.rs")]),
        StateChange::ProjectCoverage(72.0),
    ]);

    assert!(state.config.is_some());
    assert_eq!(state.mutated_project_directory, PathBuf::from("/proj_mutated"));
    assert_eq!(state.source_files.len(), 1);
    assert_eq!(state.project_coverage, 72.0);
}

#[test]
fn later_changes_win_per_field() {
    let mut state = RunState::new(RunOptions::default(), PathBuf::from("/proj"));

    state.apply(vec![StateChange::ProjectCoverage(10.0)]);
    state.apply(vec![
        StateChange::ProjectCoverage(90.0),
        StateChange::MutatedProjectDirectoryCreated(PathBuf::from("/elsewhere")),
    ]);

    assert_eq!(state.project_coverage, 90.0);
    assert_eq!(state.mutated_project_directory, PathBuf::from("/elsewhere"));
}

#[test]
fn unrelated_fields_survive_later_changes() {
    let mut state = RunState::new(RunOptions::default(), PathBuf::from("/proj"));

    state.apply(vec![StateChange::SourceFilesDiscovered(vec![PathBuf::from("a.rs")])]);
    state.apply(vec![StateChange::TestManifestGenerated(TestManifest {
        targets: vec![TestTarget { name: "unit".into() }],
    })]);

    assert_eq!(state.source_files, vec![PathBuf::from("a.rs")]);
    assert_eq!(state.test_manifest.targets.len(), 1);
}

#[test]
fn mapping_change_replaces_previous_mappings() {
    let mapping = |file: &str| MutationMapping {
        file_path: file.into(),
        file_name: file.into(),
        schemata: vec![],
    };
    let mut state = RunState::new(RunOptions::default(), PathBuf::from("/proj"));

    state.apply(vec![StateChange::MutationMappingsDiscovered(vec![mapping("a.rs")])]);
    state.apply(vec![StateChange::MutationMappingsDiscovered(vec![
        mapping("b.rs"),
        mapping("c.rs"),
    ])]);

    assert_eq!(state.mutation_mapping.len(), 2);
    assert_eq!(state.mutation_mapping[0].file_path, "b.rs");
}

#[test]
fn outcome_serializes_to_camel_case_json() {
    let outcome = MutationTestOutcome {
        mutations: vec![MutationOutcome {
            verdict: TestVerdict::Failed,
            point: MutationPoint {
                operator_id: "logical_operator".into(),
                file_path: "src/lib.rs".into(),
                position: SourcePosition { line: 7, column: 2 },
            },
            snapshot: MutationSnapshot { before: "&&".into(), after: "||".into() },
            original_project_directory: PathBuf::from("/proj"),
            mutated_project_directory: PathBuf::from("/proj_mutated"),
        }],
        coverage: 88.0,
        test_duration_ms: 4200,
    };

    let json = serde_json::to_string(&outcome).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["coverage"], 88.0);
    assert_eq!(value["testDurationMs"], 4200);
    assert_eq!(value["mutations"][0]["verdict"], "failed");
    assert_eq!(value["mutations"][0]["point"]["operatorId"], "logical_operator");

    let back: MutationTestOutcome = serde_json::from_str(&json).unwrap();
    assert_eq!(back, outcome);
}

#[test]
fn outcome_counts_and_score() {
    let mutation = |verdict| MutationOutcome {
        verdict,
        point: MutationPoint {
            operator_id: "logical_operator".into(),
            file_path: "src/lib.rs".into(),
            position: SourcePosition { line: 1, column: 1 },
        },
        snapshot: MutationSnapshot { before: "&&".into(), after: "||".into() },
        original_project_directory: PathBuf::from("/proj"),
        mutated_project_directory: PathBuf::from("/proj_mutated"),
    };
    let outcome = MutationTestOutcome {
        mutations: vec![
            mutation(TestVerdict::Failed),
            mutation(TestVerdict::Failed),
            mutation(TestVerdict::Failed),
            mutation(TestVerdict::Passed),
            mutation(TestVerdict::BuildError),
        ],
        coverage: 0.0,
        test_duration_ms: 0,
    };

    assert_eq!(outcome.killed(), 3);
    assert_eq!(outcome.survived(), 1);
    assert_eq!(outcome.build_errors(), 1);
    assert_eq!(outcome.score(), 0.75);
}

#[test]
fn empty_outcome_scores_full_marks() {
    let outcome = MutationTestOutcome { mutations: vec![], coverage: 0.0, test_duration_ms: 0 };
    assert_eq!(outcome.score(), 1.0);
}
