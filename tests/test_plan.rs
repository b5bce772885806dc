use std::path::PathBuf;

use tempfile::TempDir;

use mutor::error::MutorError;
use mutor::options::RunOptions;
use mutor::plan::{DEFAULT_PLAN_FILE, TestPlan, load_plan, plan_path, save_plan};
use mutor::schemata::{MutationMapping, MutationSchema, MutationSnapshot, SourcePosition};
use mutor::state::RunState;

fn sample_mappings() -> Vec<MutationMapping> {
    vec![
        MutationMapping {
            file_path: "src/logic.rs".into(),
            file_name: "logic.rs".into(),
            schemata: vec![
                MutationSchema {
                    operator_id: "logical_operator".into(),
                    file_path: "src/logic.rs".into(),
                    position: SourcePosition { line: 4, column: 12 },
                    activation_id: "logical_operator_logic.rs_4_12".into(),
                    snapshot: MutationSnapshot { before: "&&".into(), after: "||".into() },
                },
                MutationSchema {
                    operator_id: "relational_operator".into(),
                    file_path: "src/logic.rs".into(),
                    position: SourcePosition { line: 9, column: 3 },
                    activation_id: "relational_operator_logic.rs_9_3".into(),
                    snapshot: MutationSnapshot { before: ">".into(), after: ">=".into() },
                },
            ],
        },
        MutationMapping {
            file_path: "src/math.rs".into(),
            file_name: "math.rs".into(),
            schemata: vec![MutationSchema {
                operator_id: "arithmetic_operator".into(),
                file_path: "src/math.rs".into(),
                position: SourcePosition { line: 2, column: 8 },
                activation_id: "arithmetic_operator_math.rs_2_8".into(),
                snapshot: MutationSnapshot { before: "+".into(), after: "-".into() },
            }],
        },
    ]
}

#[test]
fn round_trip_preserves_everything_in_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plan.json");

    let plan = TestPlan {
        mutated_project_path: "/work/proj_mutated".into(),
        project_coverage: 81.5,
        mappings: sample_mappings(),
    };

    save_plan(&plan, &path).unwrap();
    let loaded = load_plan(&path).unwrap();

    assert_eq!(loaded, plan);
    assert_eq!(loaded.mappings[0].schemata[0].operator_id, "logical_operator");
    assert_eq!(loaded.mappings[0].schemata[1].operator_id, "relational_operator");
}

#[test]
fn plan_artifact_is_inspectable_camel_case_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plan.json");

    let plan = TestPlan {
        mutated_project_path: "/work/proj_mutated".into(),
        project_coverage: 50.0,
        mappings: sample_mappings(),
    };
    save_plan(&plan, &path).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["mutatedProjectPath"], "/work/proj_mutated");
    assert_eq!(value["projectCoverage"], 50.0);
    assert_eq!(value["mappings"][0]["filePath"], "src/logic.rs");
    assert_eq!(value["mappings"][0]["fileName"], "logic.rs");
    assert_eq!(
        value["mappings"][0]["schemata"][0]["activationId"],
        "logical_operator_logic.rs_4_12"
    );
    assert_eq!(value["mappings"][0]["schemata"][0]["snapshot"]["before"], "&&");
}

#[test]
fn missing_plan_is_plan_unreadable() {
    let dir = TempDir::new().unwrap();
    let err = load_plan(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, MutorError::PlanUnreadable { .. }));
}

#[test]
fn malformed_plan_is_plan_unreadable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plan.json");
    std::fs::write(&path, "{ \"mutatedProjectPath\": 42 }").unwrap();
    let err = load_plan(&path).unwrap_err();
    assert!(matches!(err, MutorError::PlanUnreadable { .. }));
}

#[test]
fn from_state_snapshots_discovery_results() {
    let mut state = RunState::new(RunOptions::default(), PathBuf::from("/work/proj"));
    state.mutated_project_directory = PathBuf::from("/work/proj_mutated");
    state.project_coverage = 66.0;
    state.mutation_mapping = sample_mappings();

    let plan = TestPlan::from_state(&state);
    assert_eq!(plan.mutated_project_path, "/work/proj_mutated");
    assert_eq!(plan.project_coverage, 66.0);
    assert_eq!(plan.mappings, sample_mappings());
}

#[test]
fn plan_path_defaults_next_to_the_project() {
    let default = plan_path(&PathBuf::from("/work/proj"), None);
    assert_eq!(default, PathBuf::from("/work/proj").join(DEFAULT_PLAN_FILE));

    let explicit = plan_path(&PathBuf::from("/work/proj"), Some(&PathBuf::from("/tmp/p.json")));
    assert_eq!(explicit, PathBuf::from("/tmp/p.json"));
}
